//! Elementwise arithmetic.

use super::array::broadcast_to;
use crate::autodiff::operation::Operation;
use crate::autodiff::tensor::{IntoTracked, TrackedTensor};
use crate::error::TensorError;
use crate::operations::apply_binary;
use crate::strides::broadcast_shape;

/// Broadcast both operands to their common shape.
///
/// Both operands are checked before any node is recorded, so a failure
/// leaves the graph untouched.
fn broadcast_pair(
    lhs: impl IntoTracked,
    rhs: impl IntoTracked,
) -> Result<(TrackedTensor, TrackedTensor), TensorError> {
    let (lhs, rhs) = (lhs.into_tracked(), rhs.into_tracked());
    let shape = broadcast_shape(lhs.shape(), rhs.shape())?;
    lhs.check_live()?;
    rhs.check_live()?;
    Ok((broadcast_to(lhs, &shape)?, broadcast_to(rhs, &shape)?))
}

/// Elementwise `lhs + rhs` with broadcasting.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::autodiff::{Parameter, ops};
///
/// let x = Parameter::new(DenseTensor::scalar(2.0));
/// let y = ops::add(&x, 5.0).unwrap();
/// assert_eq!(y.item().unwrap(), 7.0);
/// y.backward().unwrap();
/// assert_eq!(x.grad().unwrap().item().unwrap(), 1.0);
/// ```
pub fn add(lhs: impl IntoTracked, rhs: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let (lhs, rhs) = broadcast_pair(lhs, rhs)?;
    let value = apply_binary(lhs.value(), rhs.value(), |a, b| a + b)?;
    let op = Operation::Add {
        lhs: lhs.graph_input()?,
        rhs: rhs.graph_input()?,
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Elementwise `lhs - rhs` with broadcasting.
pub fn subtract(lhs: impl IntoTracked, rhs: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let (lhs, rhs) = broadcast_pair(lhs, rhs)?;
    let value = apply_binary(lhs.value(), rhs.value(), |a, b| a - b)?;
    let op = Operation::Subtract {
        lhs: lhs.graph_input()?,
        rhs: rhs.graph_input()?,
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Elementwise `lhs * rhs` with broadcasting.
pub fn multiply(lhs: impl IntoTracked, rhs: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let (lhs, rhs) = broadcast_pair(lhs, rhs)?;
    let value = apply_binary(lhs.value(), rhs.value(), |a, b| a * b)?;
    let op = Operation::Multiply {
        lhs: lhs.graph_input()?,
        rhs: rhs.graph_input()?,
        lhs_value: lhs.value_rc(),
        rhs_value: rhs.value_rc(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Elementwise `lhs / rhs` with broadcasting.
pub fn divide(lhs: impl IntoTracked, rhs: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let (lhs, rhs) = broadcast_pair(lhs, rhs)?;
    let value = apply_binary(lhs.value(), rhs.value(), |a, b| a / b)?;
    let op = Operation::Divide {
        lhs: lhs.graph_input()?,
        rhs: rhs.graph_input()?,
        lhs_value: lhs.value_rc(),
        rhs_value: rhs.value_rc(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Elementwise negation.
pub fn negative(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = crate::operations::scale(x.value(), -1.0);
    let op = Operation::Negative {
        input: x.graph_input()?,
    };
    Ok(TrackedTensor::from_operation(value, op))
}
