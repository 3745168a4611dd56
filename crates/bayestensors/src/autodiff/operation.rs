//! Recorded operations and their backward rules.

use std::rc::Rc;

use super::graph::NodeId;
use crate::error::TensorError;
use crate::linalg::{inv, matmul, solve, solve_triangular};
use crate::operations::{apply, apply_binary, broadcast_to, outer, scale, sum_to_shape, transpose};
use crate::tensor::DenseTensor;

/// An operation recorded in the computation graph.
///
/// Inputs are `None` when the corresponding operand is a constant; those
/// operands receive no gradient. Elementwise binary variants always see
/// operands of equal shape because broadcasting is recorded separately as
/// [`Operation::BroadcastTo`].
#[derive(Debug)]
pub enum Operation {
    Add {
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
    },
    Subtract {
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
    },
    Multiply {
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
        lhs_value: Rc<DenseTensor<f64>>,
        rhs_value: Rc<DenseTensor<f64>>,
    },
    Divide {
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
        lhs_value: Rc<DenseTensor<f64>>,
        rhs_value: Rc<DenseTensor<f64>>,
    },
    Negative {
        input: Option<NodeId>,
    },
    Abs {
        input: Option<NodeId>,
        x: Rc<DenseTensor<f64>>,
    },
    Square {
        input: Option<NodeId>,
        x: Rc<DenseTensor<f64>>,
    },
    Sqrt {
        input: Option<NodeId>,
        output: DenseTensor<f64>,
    },
    Exp {
        input: Option<NodeId>,
        output: DenseTensor<f64>,
    },
    Log {
        input: Option<NodeId>,
        x: Rc<DenseTensor<f64>>,
    },
    Reshape {
        input: Option<NodeId>,
        input_shape: Vec<usize>,
    },
    BroadcastTo {
        input: Option<NodeId>,
        input_shape: Vec<usize>,
    },
    Transpose {
        input: Option<NodeId>,
    },
    Sum {
        input: Option<NodeId>,
        input_shape: Vec<usize>,
    },
    SumAxis {
        input: Option<NodeId>,
        input_shape: Vec<usize>,
        kept_shape: Vec<usize>,
    },
    Matmul {
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
        lhs_value: Rc<DenseTensor<f64>>,
        rhs_value: Rc<DenseTensor<f64>>,
    },
    Det {
        input: Option<NodeId>,
        x: Rc<DenseTensor<f64>>,
        det: f64,
    },
    Logdet {
        input: Option<NodeId>,
        x: Rc<DenseTensor<f64>>,
    },
    Cholesky {
        input: Option<NodeId>,
        l: DenseTensor<f64>,
    },
    Solve {
        a: Option<NodeId>,
        b: Option<NodeId>,
        a_value: Rc<DenseTensor<f64>>,
        x: DenseTensor<f64>,
    },
    Inv {
        input: Option<NodeId>,
        output: DenseTensor<f64>,
    },
    Trace {
        input: Option<NodeId>,
        n: usize,
    },
    /// `mu + L @ eps` with a stored standard-normal draw `eps`.
    ReparameterizedSample {
        mu: Option<NodeId>,
        scale_tril: Option<NodeId>,
        eps: DenseTensor<f64>,
    },
    /// A draw from a Gaussian mixture; not differentiable.
    MixtureSample {
        inputs: Vec<NodeId>,
    },
}

fn push(
    out: &mut Vec<(NodeId, DenseTensor<f64>)>,
    id: Option<NodeId>,
    grad: impl FnOnce() -> Result<DenseTensor<f64>, TensorError>,
) -> Result<(), TensorError> {
    if let Some(id) = id {
        out.push((id, grad()?));
    }
    Ok(())
}

fn mul(a: &DenseTensor<f64>, b: &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError> {
    apply_binary(a, b, |x, y| x * y)
}

/// Keep the lower triangle and halve the diagonal.
fn phi(a: &DenseTensor<f64>) -> DenseTensor<f64> {
    let n = a.shape()[0];
    DenseTensor::from_fn(&[n, n], |ix| {
        let v = a.data()[ix[0] + ix[1] * n];
        match ix[0].cmp(&ix[1]) {
            std::cmp::Ordering::Greater => v,
            std::cmp::Ordering::Equal => 0.5 * v,
            std::cmp::Ordering::Less => 0.0,
        }
    })
}

/// Gradient of `A` given the Cholesky factor `L` and the gradient of `L`.
fn cholesky_backward(
    l: &DenseTensor<f64>,
    grad_l: &DenseTensor<f64>,
) -> Result<DenseTensor<f64>, TensorError> {
    let n = l.shape()[0];
    let lower_grad = DenseTensor::from_fn(&[n, n], |ix| {
        if ix[0] >= ix[1] { grad_l.data()[ix[0] + ix[1] * n] } else { 0.0 }
    });
    let p = phi(&matmul(&transpose(l), &lower_grad)?);
    // S = L⁻ᵀ P L⁻¹
    let left = solve_triangular(l, &p, true, true)?;
    let s = transpose(&solve_triangular(l, &transpose(&left), true, true)?);
    let sym = apply_binary(&s, &transpose(&s), |a, b| a + b)?;
    Ok(scale(&sym, 0.5))
}

impl Operation {
    /// Short operator name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "add",
            Operation::Subtract { .. } => "subtract",
            Operation::Multiply { .. } => "multiply",
            Operation::Divide { .. } => "divide",
            Operation::Negative { .. } => "negative",
            Operation::Abs { .. } => "abs",
            Operation::Square { .. } => "square",
            Operation::Sqrt { .. } => "sqrt",
            Operation::Exp { .. } => "exp",
            Operation::Log { .. } => "log",
            Operation::Reshape { .. } => "reshape",
            Operation::BroadcastTo { .. } => "broadcast_to",
            Operation::Transpose { .. } => "transpose",
            Operation::Sum { .. } => "sum",
            Operation::SumAxis { .. } => "sum_axis",
            Operation::Matmul { .. } => "matmul",
            Operation::Det { .. } => "det",
            Operation::Logdet { .. } => "logdet",
            Operation::Cholesky { .. } => "cholesky",
            Operation::Solve { .. } => "solve",
            Operation::Inv { .. } => "inv",
            Operation::Trace { .. } => "trace",
            Operation::ReparameterizedSample { .. } => "reparameterized_sample",
            Operation::MixtureSample { .. } => "mixture_sample",
        }
    }

    /// Graph inputs that receive gradients.
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            Operation::Add { lhs, rhs }
            | Operation::Subtract { lhs, rhs }
            | Operation::Multiply { lhs, rhs, .. }
            | Operation::Divide { lhs, rhs, .. }
            | Operation::Matmul { lhs, rhs, .. } => lhs.iter().chain(rhs).copied().collect(),
            Operation::Solve { a, b, .. } => a.iter().chain(b).copied().collect(),
            Operation::ReparameterizedSample { mu, scale_tril, .. } => {
                mu.iter().chain(scale_tril).copied().collect()
            }
            Operation::MixtureSample { inputs } => inputs.clone(),
            Operation::Negative { input }
            | Operation::Abs { input, .. }
            | Operation::Square { input, .. }
            | Operation::Sqrt { input, .. }
            | Operation::Exp { input, .. }
            | Operation::Log { input, .. }
            | Operation::Reshape { input, .. }
            | Operation::BroadcastTo { input, .. }
            | Operation::Transpose { input }
            | Operation::Sum { input, .. }
            | Operation::SumAxis { input, .. }
            | Operation::Det { input, .. }
            | Operation::Logdet { input, .. }
            | Operation::Cholesky { input, .. }
            | Operation::Inv { input, .. }
            | Operation::Trace { input, .. } => input.iter().copied().collect(),
        }
    }

    /// Compute VJP: given the gradient of the output, return the gradient
    /// of each differentiable input.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::Unsupported` for operations without a gradient,
    /// and numeric errors from the linear-algebra rules.
    pub fn backward(
        &self,
        delta: &DenseTensor<f64>,
    ) -> Result<Vec<(NodeId, DenseTensor<f64>)>, TensorError> {
        let mut out = Vec::with_capacity(2);
        match self {
            Operation::Add { lhs, rhs } => {
                push(&mut out, *lhs, || Ok(delta.clone()))?;
                push(&mut out, *rhs, || Ok(delta.clone()))?;
            }
            Operation::Subtract { lhs, rhs } => {
                push(&mut out, *lhs, || Ok(delta.clone()))?;
                push(&mut out, *rhs, || Ok(scale(delta, -1.0)))?;
            }
            Operation::Multiply {
                lhs,
                rhs,
                lhs_value,
                rhs_value,
            } => {
                push(&mut out, *lhs, || mul(delta, rhs_value))?;
                push(&mut out, *rhs, || mul(delta, lhs_value))?;
            }
            Operation::Divide {
                lhs,
                rhs,
                lhs_value,
                rhs_value,
            } => {
                push(&mut out, *lhs, || apply_binary(delta, rhs_value, |d, y| d / y))?;
                push(&mut out, *rhs, || {
                    let ratio = apply_binary(lhs_value, rhs_value, |x, y| -x / (y * y))?;
                    mul(delta, &ratio)
                })?;
            }
            Operation::Negative { input } => {
                push(&mut out, *input, || Ok(scale(delta, -1.0)))?;
            }
            Operation::Abs { input, x } => {
                push(&mut out, *input, || {
                    apply_binary(delta, x, |d, v| {
                        if v > 0.0 {
                            d
                        } else if v < 0.0 {
                            -d
                        } else {
                            0.0
                        }
                    })
                })?;
            }
            Operation::Square { input, x } => {
                push(&mut out, *input, || apply_binary(delta, x, |d, v| 2.0 * v * d))?;
            }
            Operation::Sqrt { input, output } => {
                push(&mut out, *input, || apply_binary(delta, output, |d, y| 0.5 * d / y))?;
            }
            Operation::Exp { input, output } => {
                push(&mut out, *input, || mul(delta, output))?;
            }
            Operation::Log { input, x } => {
                push(&mut out, *input, || apply_binary(delta, x, |d, v| d / v))?;
            }
            Operation::Reshape { input, input_shape } => {
                push(&mut out, *input, || delta.reshape(input_shape))?;
            }
            Operation::BroadcastTo { input, input_shape } => {
                push(&mut out, *input, || sum_to_shape(delta, input_shape))?;
            }
            Operation::Transpose { input } => {
                push(&mut out, *input, || Ok(transpose(delta)))?;
            }
            Operation::Sum { input, input_shape } => {
                push(&mut out, *input, || broadcast_to(delta, input_shape))?;
            }
            Operation::SumAxis {
                input,
                input_shape,
                kept_shape,
            } => {
                push(&mut out, *input, || {
                    broadcast_to(&delta.reshape(kept_shape)?, input_shape)
                })?;
            }
            Operation::Matmul {
                lhs,
                rhs,
                lhs_value,
                rhs_value,
            } => {
                push(&mut out, *lhs, || matmul(delta, &transpose(rhs_value)))?;
                push(&mut out, *rhs, || matmul(&transpose(lhs_value), delta))?;
            }
            Operation::Det { input, x, det } => {
                push(&mut out, *input, || {
                    Ok(scale(&transpose(&inv(x)?), delta.item()? * det))
                })?;
            }
            Operation::Logdet { input, x } => {
                push(&mut out, *input, || {
                    Ok(scale(&transpose(&inv(x)?), delta.item()?))
                })?;
            }
            Operation::Cholesky { input, l } => {
                push(&mut out, *input, || cholesky_backward(l, delta))?;
            }
            Operation::Solve { a, b, a_value, x } => {
                // X = A⁻¹B: dB = A⁻ᵀ δ, dA = -dB Xᵀ
                let grad_b = solve(&transpose(a_value), delta)?;
                if a.is_some() {
                    let grad_a = if x.ndim() == 1 {
                        outer(&grad_b, x)
                    } else {
                        matmul(&grad_b, &transpose(x))?
                    };
                    push(&mut out, *a, || Ok(scale(&grad_a, -1.0)))?;
                }
                push(&mut out, *b, || Ok(grad_b))?;
            }
            Operation::Inv { input, output } => {
                push(&mut out, *input, || {
                    let yt = transpose(output);
                    Ok(scale(&matmul(&matmul(&yt, delta)?, &yt)?, -1.0))
                })?;
            }
            Operation::Trace { input, n } => {
                push(&mut out, *input, || {
                    Ok(scale(&DenseTensor::identity(*n), delta.item()?))
                })?;
            }
            Operation::ReparameterizedSample { mu, scale_tril, eps } => {
                push(&mut out, *mu, || Ok(delta.clone()))?;
                push(&mut out, *scale_tril, || Ok(outer(delta, eps)))?;
            }
            Operation::MixtureSample { .. } => {
                return Err(TensorError::unsupported(
                    "backward through a Gaussian mixture sample",
                ));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn id(i: usize) -> Option<NodeId> {
        Some(NodeId::new_for_test(i))
    }

    #[test]
    fn test_subtract_backward_signs() {
        let op = Operation::Subtract { lhs: id(0), rhs: id(1) };
        let grads = op.backward(&DenseTensor::ones(&[2])).unwrap();
        assert_eq!(grads[0].1.data(), &[1.0, 1.0]);
        assert_eq!(grads[1].1.data(), &[-1.0, -1.0]);
    }

    #[test]
    fn test_constant_inputs_get_no_gradient() {
        let op = Operation::Add { lhs: None, rhs: id(3) };
        assert_eq!(op.inputs(), vec![NodeId::new_for_test(3)]);
        let grads = op.backward(&DenseTensor::ones(&[1])).unwrap();
        assert_eq!(grads.len(), 1);
        assert_eq!(grads[0].0.index(), 3);
    }

    #[test]
    fn test_mixture_sample_unsupported() {
        let op = Operation::MixtureSample {
            inputs: vec![NodeId::new_for_test(0)],
        };
        let err = op.backward(&DenseTensor::ones(&[1])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unsupported);
    }

    #[test]
    fn test_phi() {
        let a = DenseTensor::from_vec(vec![2.0, 3.0, 5.0, 7.0], &[2, 2]).unwrap();
        let p = phi(&a);
        assert_eq!(p.data(), &[1.0, 3.0, 0.0, 3.5]);
    }

    #[test]
    fn test_cholesky_backward_1x1() {
        // L = sqrt(a), dL/da = 1 / (2 sqrt(a))
        let l = DenseTensor::from_vec(vec![2.0], &[1, 1]).unwrap();
        let g = cholesky_backward(&l, &DenseTensor::ones(&[1, 1])).unwrap();
        assert_relative_eq!(g.data()[0], 0.25);
    }
}
