//! Broadcast expansion and its adjoint reduction.

use crate::backend::{ArrayBackend, GenericBackend};
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::can_broadcast_to;
use crate::tensor::DenseTensor;

/// Expand a tensor to `shape` following the broadcasting rules.
///
/// # Errors
///
/// Returns `TensorError::IncompatibleShapes` if the tensor does not
/// broadcast to `shape`.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::operations::broadcast_to;
///
/// let t = DenseTensor::from_vec(vec![1.0, 2.0], &[2, 1]).unwrap();
/// let b = broadcast_to(&t, &[2, 3]).unwrap();
/// assert_eq!(b.get(&[1, 2]), Some(&2.0));
/// ```
pub fn broadcast_to<ElT: Scalar>(
    tensor: &DenseTensor<ElT>,
    shape: &[usize],
) -> Result<DenseTensor<ElT>, TensorError> {
    if tensor.shape() == shape {
        return Ok(tensor.clone());
    }
    if !can_broadcast_to(tensor.shape(), shape) {
        return Err(TensorError::IncompatibleShapes {
            operation: "broadcast_to",
            lhs: tensor.shape().to_vec(),
            rhs: shape.to_vec(),
        });
    }
    let mut result = DenseTensor::zeros(shape);
    GenericBackend::broadcast_into(&mut result, tensor);
    Ok(result)
}

/// Reduce a gradient back to the shape it was broadcast from.
///
/// Sums over leading axes that broadcasting introduced and over axes that
/// were stretched from size 1. This is the single reduction every
/// broadcasting operator relies on in its backward rule.
///
/// # Errors
///
/// Returns `TensorError::IncompatibleShapes` if `shape` does not broadcast
/// to the shape of `grad`.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::operations::sum_to_shape;
///
/// let g: DenseTensor<f64> = DenseTensor::ones(&[5, 4]);
/// let reduced = sum_to_shape(&g, &[4]).unwrap();
/// assert_eq!(reduced.data(), &[5.0, 5.0, 5.0, 5.0]);
/// ```
pub fn sum_to_shape<ElT: Scalar>(
    grad: &DenseTensor<ElT>,
    shape: &[usize],
) -> Result<DenseTensor<ElT>, TensorError> {
    if grad.shape() == shape {
        return Ok(grad.clone());
    }
    if !can_broadcast_to(shape, grad.shape()) {
        return Err(TensorError::IncompatibleShapes {
            operation: "sum_to_shape",
            lhs: grad.shape().to_vec(),
            rhs: shape.to_vec(),
        });
    }
    let mut result = DenseTensor::zeros(shape);
    GenericBackend::sum_into(&mut result, grad);
    Ok(result)
}
