//! Differentiable linear algebra on rank-2 tensors.

use crate::autodiff::operation::Operation;
use crate::autodiff::tensor::{IntoTracked, TrackedTensor};
use crate::error::TensorError;
use crate::linalg as raw;
use crate::tensor::DenseTensor;

/// Matrix product of two rank-2 tensors.
///
/// The gradients are `δ Yᵀ` for the left operand and `Xᵀ δ` for the right.
pub fn matmul(lhs: impl IntoTracked, rhs: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let (lhs, rhs) = (lhs.into_tracked(), rhs.into_tracked());
    let value = raw::matmul(lhs.value(), rhs.value())?;
    let op = Operation::Matmul {
        lhs: lhs.graph_input()?,
        rhs: rhs.graph_input()?,
        lhs_value: lhs.value_rc(),
        rhs_value: rhs.value_rc(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Determinant of a square matrix.
pub fn det(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let det = raw::det(x.value())?;
    let op = Operation::Det {
        input: x.graph_input()?,
        x: x.value_rc(),
        det,
    };
    Ok(TrackedTensor::from_operation(DenseTensor::scalar(det), op))
}

/// Natural log of a positive determinant.
///
/// # Errors
///
/// Returns `TensorError::NonPositiveDeterminant` (a domain error) when the
/// determinant is not positive.
pub fn logdet(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = raw::logdet(x.value())?;
    let op = Operation::Logdet {
        input: x.graph_input()?,
        x: x.value_rc(),
    };
    Ok(TrackedTensor::from_operation(DenseTensor::scalar(value), op))
}

/// Lower Cholesky factor of a symmetric positive-definite matrix.
pub fn cholesky(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let l = raw::cholesky(x.value())?;
    let op = Operation::Cholesky {
        input: x.graph_input()?,
        l: l.clone(),
    };
    Ok(TrackedTensor::from_operation(l, op))
}

/// Solution `X` of `A X = B` without forming `A⁻¹`.
///
/// `b` may be a vector or a matrix.
pub fn solve(a: impl IntoTracked, b: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let (a, b) = (a.into_tracked(), b.into_tracked());
    let x = raw::solve(a.value(), b.value())?;
    let op = Operation::Solve {
        a: a.graph_input()?,
        b: b.graph_input()?,
        a_value: a.value_rc(),
        x: x.clone(),
    };
    Ok(TrackedTensor::from_operation(x, op))
}

/// Matrix inverse.
pub fn inv(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = raw::inv(x.value())?;
    let op = Operation::Inv {
        input: x.graph_input()?,
        output: value.clone(),
    };
    Ok(TrackedTensor::from_operation(value, op))
}

/// Sum of the diagonal as a rank-0 tensor.
pub fn trace(x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
    let x = x.into_tracked();
    let value = raw::trace(x.value())?;
    let op = Operation::Trace {
        input: x.graph_input()?,
        n: x.shape()[0],
    };
    Ok(TrackedTensor::from_operation(value, op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::Parameter;
    use crate::autodiff::graph::clear_graph;
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_trace_gradient_is_identity() {
        clear_graph();
        let x = Parameter::new(DenseTensor::from_fn(&[3, 3], |ix| (ix[0] + ix[1]) as f64));
        let t = trace(&x).unwrap();
        assert_eq!(t.item().unwrap(), 6.0);
        t.backward().unwrap();
        assert_eq!(x.grad().unwrap(), DenseTensor::identity(3));
    }

    #[test]
    fn test_logdet_domain_error() {
        clear_graph();
        let x = Parameter::new(DenseTensor::from_vec(vec![-1.0, 0.0, 0.0, 2.0], &[2, 2]).unwrap());
        let err = logdet(&x).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_det_diagonal_gradient() {
        clear_graph();
        let x = Parameter::new(DenseTensor::from_vec(vec![2.0, 0.0, 0.0, 3.0], &[2, 2]).unwrap());
        let d = det(&x).unwrap();
        assert_relative_eq!(d.item().unwrap(), 6.0);
        d.backward().unwrap();
        let g = x.grad().unwrap();
        // cofactor matrix of diag(2, 3)
        assert_relative_eq!(*g.get(&[0, 0]).unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(*g.get(&[1, 1]).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(*g.get(&[0, 1]).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matmul_shape_errors() {
        clear_graph();
        let x = Parameter::new(DenseTensor::ones(&[2, 3]));
        assert_eq!(
            matmul(&x, DenseTensor::ones(&[2, 3])).unwrap_err().kind(),
            ErrorKind::Shape
        );
        assert_eq!(
            matmul(&x, DenseTensor::ones(&[3])).unwrap_err().kind(),
            ErrorKind::Shape
        );
    }

    #[test]
    fn test_solve_vector_rhs() {
        clear_graph();
        let a = Parameter::new(DenseTensor::from_vec(vec![2.0, 0.0, 0.0, 4.0], &[2, 2]).unwrap());
        let b = Parameter::new(DenseTensor::from_vec(vec![2.0, 4.0], &[2]).unwrap());
        let x = solve(&a, &b).unwrap();
        assert_eq!(x.shape(), &[2]);
        x.backward().unwrap();
        // dB = A⁻ᵀ 1 = [0.5, 0.25]; dA = -dB xᵀ with x = [1, 1]
        let gb = b.grad().unwrap();
        assert_relative_eq!(gb.data()[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(gb.data()[1], 0.25, epsilon = 1e-12);
        let ga = a.grad().unwrap();
        assert_relative_eq!(*ga.get(&[1, 0]).unwrap(), -0.25, epsilon = 1e-12);
    }
}
