//! Gradient-based parameter updates.
//!
//! Optimizers only touch the public [`Parameter`] interface: they read
//! `grad()`, replace values between backward passes and reset gradients.

use log::debug;

use crate::autodiff::Parameter;
use crate::error::TensorError;
use crate::operations::apply_binary;
use crate::tensor::DenseTensor;

/// Exponential learning-rate decay: multiply by `rate` every `step`
/// iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Decay {
    rate: f64,
    step: usize,
}

/// Parameters, learning rate and iteration counter shared by optimizers.
#[derive(Debug, Clone)]
pub struct OptimizerState {
    parameters: Vec<Parameter>,
    learning_rate: f64,
    n_iter: usize,
    decay: Option<Decay>,
}

impl OptimizerState {
    /// Track `parameters` with the given learning rate.
    pub fn new(parameters: Vec<Parameter>, learning_rate: f64) -> Self {
        Self {
            parameters,
            learning_rate,
            n_iter: 0,
            decay: None,
        }
    }

    /// Learning rate after counting one more iteration.
    fn next_learning_rate(&self) -> f64 {
        match self.decay {
            Some(Decay { rate, step }) if (self.n_iter + 1) % step == 0 => {
                self.learning_rate * rate
            }
            _ => self.learning_rate,
        }
    }
}

/// An optimizer over a fixed set of parameters.
pub trait Optimizer {
    /// Shared bookkeeping.
    fn state(&self) -> &OptimizerState;

    /// Shared bookkeeping, mutably.
    fn state_mut(&mut self) -> &mut OptimizerState;

    /// Apply one update using the accumulated gradients.
    fn update(&mut self) -> Result<(), TensorError>;

    /// Parameters being optimized.
    fn parameters(&self) -> &[Parameter] {
        &self.state().parameters
    }

    /// Current learning rate.
    fn learning_rate(&self) -> f64 {
        self.state().learning_rate
    }

    /// Number of iterations performed.
    fn n_iter(&self) -> usize {
        self.state().n_iter
    }

    /// Reset the gradient of every parameter.
    fn cleargrad(&self) {
        for p in self.parameters() {
            p.cleargrad();
        }
    }

    /// Multiply the learning rate by `rate` every `step` iterations.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidParameter` if `step` is zero.
    fn set_decay(&mut self, rate: f64, step: usize) -> Result<(), TensorError> {
        if step == 0 {
            return Err(TensorError::invalid_parameter(
                "decay_step",
                "must be at least 1",
            ));
        }
        self.state_mut().decay = Some(Decay { rate, step });
        Ok(())
    }

    /// Count one iteration and apply any pending decay.
    fn increment_iteration(&mut self) {
        let state = self.state_mut();
        let next = state.next_learning_rate();
        state.n_iter += 1;
        if next != state.learning_rate {
            state.learning_rate = next;
            debug!(
                "learning rate decayed to {} at iteration {}",
                state.learning_rate, state.n_iter
            );
        }
    }

    /// Replace every parameter that has a gradient with
    /// `step(learning_rate, value, grad)`, then count the iteration.
    ///
    /// The learning rate passed to `step` already includes any decay due at
    /// this iteration. All new values are computed before the first one is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns the first error from `step`, or `TensorError::IncompatibleShapes`
    /// if `step` changes a shape. Parameters and the iteration counter are
    /// left unchanged on error.
    fn apply_step<F>(&mut self, step: F) -> Result<(), TensorError>
    where
        Self: Sized,
        F: Fn(f64, &DenseTensor<f64>, &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError>,
    {
        let lr = self.state().next_learning_rate();
        let mut pending = Vec::with_capacity(self.parameters().len());
        for p in self.parameters() {
            let Some(grad) = p.grad() else { continue };
            let value = p.value();
            let next = step(lr, &value, &grad)?;
            if next.shape() != value.shape() {
                return Err(TensorError::IncompatibleShapes {
                    operation: "optimizer step",
                    lhs: value.shape().to_vec(),
                    rhs: next.shape().to_vec(),
                });
            }
            pending.push((p.clone(), next));
        }
        for (p, next) in pending {
            p.set_value(next)?;
        }
        self.increment_iteration();
        Ok(())
    }
}

/// Plain gradient descent: `value -= learning_rate * grad`.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::autodiff::{Parameter, ops};
/// use bayestensors::optimizer::{GradientDescent, Optimizer};
///
/// let x = Parameter::new(DenseTensor::scalar(3.0));
/// let mut opt = GradientDescent::new(vec![x.clone()], 0.1);
///
/// // loss = x², gradient 2x = 6
/// ops::square(&x).unwrap().backward().unwrap();
/// opt.update().unwrap();
/// assert!((x.value().item().unwrap() - 2.4).abs() < 1e-12);
/// assert_eq!(opt.n_iter(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GradientDescent {
    state: OptimizerState,
}

impl GradientDescent {
    /// Create a gradient-descent optimizer.
    pub fn new(parameters: Vec<Parameter>, learning_rate: f64) -> Self {
        Self {
            state: OptimizerState::new(parameters, learning_rate),
        }
    }
}

impl Optimizer for GradientDescent {
    fn state(&self) -> &OptimizerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut OptimizerState {
        &mut self.state
    }

    fn update(&mut self) -> Result<(), TensorError> {
        self.apply_step(|lr, value, grad| apply_binary(value, grad, |v, g| v - lr * g))
    }
}
