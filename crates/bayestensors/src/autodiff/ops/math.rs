//! Elementwise transcendental and power functions.

use crate::autodiff::operation::Operation;
use crate::autodiff::tensor::{IntoTracked, TrackedTensor};
use crate::error::TensorError;
use crate::operations::apply;

/// Elementwise absolute value. The gradient at zero is zero.
pub fn abs(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = apply(x.value(), f64::abs);
    let op = Operation::Abs {
        input: x.graph_input()?,
        x: x.value_rc(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Elementwise square.
pub fn square(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = apply(x.value(), |v| v * v);
    let op = Operation::Square {
        input: x.graph_input()?,
        x: x.value_rc(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Elementwise square root.
pub fn sqrt(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = apply(x.value(), f64::sqrt);
    let op = Operation::Sqrt {
        input: x.graph_input()?,
        output: value.clone(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Elementwise exponential.
pub fn exp(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = apply(x.value(), f64::exp);
    let op = Operation::Exp {
        input: x.graph_input()?,
        output: value.clone(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Elementwise natural logarithm.
pub fn log(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = apply(x.value(), f64::ln);
    let op = Operation::Log {
        input: x.graph_input()?,
        x: x.value_rc(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}
