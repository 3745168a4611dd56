//! Trainable leaf tensors.

use std::cell::RefCell;
use std::rc::Rc;

use super::graph::{NodeId, with_graph};
use super::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::operations::apply_binary;
use crate::tensor::DenseTensor;

/// Shared state behind a [`Parameter`].
#[derive(Debug)]
pub(crate) struct LeafState {
    value: Rc<DenseTensor<f64>>,
    grad: Option<DenseTensor<f64>>,
    node: Option<NodeId>,
}

impl LeafState {
    pub(crate) fn new(value: DenseTensor<f64>) -> Self {
        Self {
            value: Rc::new(value),
            grad: None,
            node: None,
        }
    }

    /// Add `grad` into the accumulated gradient.
    pub(crate) fn accumulate_grad(&mut self, grad: DenseTensor<f64>) -> Result<(), TensorError> {
        if grad.shape() != self.value.shape() {
            return Err(TensorError::IncompatibleShapes {
                operation: "gradient accumulation",
                lhs: self.value.shape().to_vec(),
                rhs: grad.shape().to_vec(),
            });
        }
        self.grad = Some(match self.grad.take() {
            Some(existing) => apply_binary(&existing, &grad, |a, b| a + b)?,
            None => grad,
        });
        Ok(())
    }
}

/// A leaf tensor whose gradient is accumulated by backward passes.
///
/// Cloning a `Parameter` yields another handle to the same leaf. Its value
/// is only replaced between backward passes, typically by an optimizer.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::autodiff::{Parameter, ops};
///
/// let x = Parameter::new(DenseTensor::scalar(2.0));
/// let y = ops::multiply(&x, 5.0).unwrap();
/// y.backward().unwrap();
/// assert_eq!(x.grad().unwrap().item().unwrap(), 5.0);
///
/// x.cleargrad();
/// assert!(x.grad().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Parameter(Rc<RefCell<LeafState>>);

impl Parameter {
    /// Create a new parameter with no gradient.
    pub fn new(value: DenseTensor<f64>) -> Self {
        Self(Rc::new(RefCell::new(LeafState::new(value))))
    }

    /// Current value.
    pub fn value(&self) -> Rc<DenseTensor<f64>> {
        Rc::clone(&self.0.borrow().value)
    }

    /// Shape of the value.
    pub fn shape(&self) -> Vec<usize> {
        self.0.borrow().value.shape().to_vec()
    }

    /// Replace the value.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::IncompatibleShapes` if the shape changes.
    pub fn set_value(&self, value: DenseTensor<f64>) -> Result<(), TensorError> {
        let mut state = self.0.borrow_mut();
        if value.shape() != state.value.shape() {
            return Err(TensorError::IncompatibleShapes {
                operation: "set_value",
                lhs: state.value.shape().to_vec(),
                rhs: value.shape().to_vec(),
            });
        }
        state.value = Rc::new(value);
        Ok(())
    }

    /// Update the value with `f(value, grad)`.
    ///
    /// Does nothing when no gradient has been accumulated.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` fails or changes the shape.
    pub fn update<F>(&self, f: F) -> Result<(), TensorError>
    where
        F: FnOnce(&DenseTensor<f64>, &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError>,
    {
        let next = {
            let state = self.0.borrow();
            match &state.grad {
                Some(grad) => f(&state.value, grad)?,
                None => return Ok(()),
            }
        };
        self.set_value(next)
    }

    /// Accumulated gradient, if any backward pass reached this parameter.
    pub fn grad(&self) -> Option<DenseTensor<f64>> {
        self.0.borrow().grad.clone()
    }

    /// Reset the accumulated gradient.
    pub fn cleargrad(&self) {
        self.0.borrow_mut().grad = None;
    }

    /// Use this parameter in a tracked expression.
    pub fn tracked(&self) -> TrackedTensor {
        TrackedTensor::from_parameter(self.clone(), self.value())
    }

    /// Whether both handles refer to the same leaf.
    pub fn ptr_eq(&self, other: &Parameter) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Leaf node of this parameter in the current graph, registering it on
    /// first use in each generation.
    pub(crate) fn node_id(&self) -> NodeId {
        let generation = with_graph(|g| g.generation());
        if let Some(id) = self.0.borrow().node {
            if id.generation() == generation {
                return id;
            }
        }
        let id = with_graph(|g| g.push_leaf(Rc::clone(&self.0)));
        self.0.borrow_mut().node = Some(id);
        id
    }
}

impl From<DenseTensor<f64>> for Parameter {
    fn from(value: DenseTensor<f64>) -> Self {
        Self::new(value)
    }
}
