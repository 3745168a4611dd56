//! Error types for bayestensors.

use thiserror::Error;

/// Coarse classification of a [`TensorError`].
///
/// Shape errors come from incompatible operand shapes, domain errors from
/// violated algebraic preconditions, and unsupported errors from operations
/// without an analytic gradient or closed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operand shapes are incompatible.
    Shape,
    /// An algebraic precondition was violated.
    Domain,
    /// The operation has no defined implementation for these operands.
    Unsupported,
    /// The graph or a tensor was used in an invalid state.
    InvalidOperation,
}

/// Errors that can occur in tensor operations.
#[derive(Debug, Error)]
pub enum TensorError {
    /// Shape mismatch between data length and expected size.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Two shapes cannot be combined (broadcast or matrix conformance).
    #[error("incompatible shapes {lhs:?} and {rhs:?} for {operation}")]
    IncompatibleShapes {
        operation: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    /// Index out of bounds.
    #[error("index out of bounds: index {index} is out of range for dimension {dim_size}")]
    IndexOutOfBounds { index: usize, dim_size: usize },

    /// Wrong number of indices provided.
    #[error("wrong number of indices: expected {expected}, got {actual}")]
    WrongNumberOfIndices { expected: usize, actual: usize },

    /// Invalid permutation.
    #[error("invalid permutation {perm:?} for tensor with {ndim} dimensions")]
    InvalidPermutation { perm: Vec<usize>, ndim: usize },

    /// Axis does not exist for the given rank.
    #[error("axis {axis} is out of range for tensor with {ndim} dimensions")]
    AxisOutOfRange { axis: isize, ndim: usize },

    /// Operation requires specific tensor rank.
    #[error("expected tensor of rank {expected}, got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// Matrix must be square.
    #[error("matrix must be square: got {rows}x{cols}")]
    NotSquareMatrix { rows: usize, cols: usize },

    /// Cholesky factorization failed.
    #[error("matrix is not positive-definite")]
    NotPositiveDefinite,

    /// Signed log-determinant has a non-positive sign.
    #[error("log-determinant requires a positive determinant, got sign {sign}")]
    NonPositiveDeterminant { sign: f64 },

    /// Triangular or LU solve hit an exactly zero pivot.
    #[error("matrix is singular")]
    SingularMatrix,

    /// Distribution parameter violates its constraint.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Operation has no analytic gradient or closed form.
    #[error("unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Invalid use of the graph or of a tensor.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl TensorError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TensorError::ShapeMismatch { .. }
            | TensorError::IncompatibleShapes { .. }
            | TensorError::IndexOutOfBounds { .. }
            | TensorError::WrongNumberOfIndices { .. }
            | TensorError::InvalidPermutation { .. }
            | TensorError::AxisOutOfRange { .. }
            | TensorError::RankMismatch { .. }
            | TensorError::NotSquareMatrix { .. } => ErrorKind::Shape,
            TensorError::NotPositiveDefinite
            | TensorError::NonPositiveDeterminant { .. }
            | TensorError::SingularMatrix
            | TensorError::InvalidParameter { .. } => ErrorKind::Domain,
            TensorError::Unsupported { .. } => ErrorKind::Unsupported,
            TensorError::InvalidOperation(_) => ErrorKind::InvalidOperation,
        }
    }

    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        TensorError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(operation: impl Into<String>) -> Self {
        TensorError::Unsupported {
            operation: operation.into(),
        }
    }
}
