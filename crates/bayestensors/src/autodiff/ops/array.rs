//! Shape manipulation and reductions.

use super::arithmetic::multiply;
use crate::autodiff::operation::Operation;
use crate::autodiff::tensor::{IntoTracked, TrackedTensor};
use crate::error::TensorError;
use crate::operations as raw;
use crate::strides::shape_len;

/// Reshape, keeping storage order.
///
/// # Errors
///
/// Returns `TensorError::ShapeMismatch` if the element count changes.
pub fn reshape(x: impl IntoTracked, shape: &[usize]) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = x.value().reshape(shape)?;
    let op = Operation::Reshape {
        input: x.graph_input()?,
        input_shape: x.shape().to_vec(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Broadcast to `shape`. Returns the input unchanged if it already has that
/// shape.
///
/// The gradient sums over every broadcast axis.
pub fn broadcast_to(x: impl IntoTracked, shape: &[usize]) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    if x.shape() == shape {
        return Ok(x);
    }
    let value = raw::broadcast_to(x.value(), shape)?;
    let op = Operation::BroadcastTo {
        input: x.graph_input()?,
        input_shape: x.shape().to_vec(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Reverse the order of the axes (matrix transpose for rank 2).
pub fn transpose(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = raw::transpose(x.value());
    let op = Operation::Transpose {
        input: x.graph_input()?,
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Sum of all elements as a rank-0 tensor.
pub fn sum(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = raw::sum(x.value());
    let op = Operation::Sum {
        input: x.graph_input()?,
        input_shape: x.shape().to_vec(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Sum along `axis`; negative axes count from the end.
pub fn sum_axis(x: impl IntoTracked, axis: isize, keepdims: bool) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let (_, kept_shape) = x.value().reduced_shape(axis, true)?;
    let value = raw::sum_axis(x.value(), axis, keepdims)?;
    let op = Operation::SumAxis {
        input: x.graph_input()?,
        input_shape: x.shape().to_vec(),
        kept_shape,
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Mean of all elements as a rank-0 tensor.
pub fn mean(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let n = shape_len(x.shape()) as f64;
    multiply(sum(x)?, 1.0 / n)
}
