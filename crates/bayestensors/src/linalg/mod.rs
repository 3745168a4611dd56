//! Dense linear algebra on rank-2 tensors.
//!
//! Matrix products, factorizations and solves go through faer via the
//! zero-copy [`AsFaerMat`](crate::backend::AsFaerMat) views.

mod cholesky;
mod det;
mod matmul;
mod solve;

pub use cholesky::cholesky;
pub use det::{det, logdet, slogdet};
pub use matmul::{matmul, trace};
pub use solve::{inv, solve, solve_triangular};

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Return `(rows, cols)` of a rank-2 tensor.
pub(crate) fn matrix_dims<ElT: Scalar>(t: &DenseTensor<ElT>) -> Result<(usize, usize), TensorError> {
    if t.ndim() != 2 {
        return Err(TensorError::RankMismatch {
            expected: 2,
            actual: t.ndim(),
        });
    }
    Ok((t.shape()[0], t.shape()[1]))
}

/// Return `n` for an `n x n` tensor.
pub(crate) fn square_dim<ElT: Scalar>(t: &DenseTensor<ElT>) -> Result<usize, TensorError> {
    let (rows, cols) = matrix_dims(t)?;
    if rows != cols {
        return Err(TensorError::NotSquareMatrix { rows, cols });
    }
    Ok(rows)
}
