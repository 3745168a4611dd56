//! Cholesky factorization.

use faer::Side;

use super::square_dim;
use crate::backend::{AsFaerMat, tensor_from_faer_mat};
use crate::error::TensorError;
use crate::tensor::DenseTensor;

/// Lower Cholesky factor `L` with `A = L Lᵀ`.
///
/// Only the lower triangle of `a` is read. The strictly upper part of the
/// result is zero.
///
/// # Errors
///
/// Returns `TensorError::NotPositiveDefinite` if the factorization fails, and a
/// shape error if `a` is not square.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::linalg::cholesky;
///
/// let a = DenseTensor::from_vec(vec![4.0, 2.0, 2.0, 3.0], &[2, 2]).unwrap();
/// let l = cholesky(&a).unwrap();
/// assert!((l.get(&[0, 0]).unwrap() - 2.0).abs() < 1e-12);
/// assert_eq!(l.get(&[0, 1]), Some(&0.0));
/// ```
pub fn cholesky(a: &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError> {
    let n = square_dim(a)?;
    let llt = a
        .as_faer_mat(n, n)
        .llt(Side::Lower)
        .map_err(|_| TensorError::NotPositiveDefinite)?;
    let l = tensor_from_faer_mat(llt.L());
    Ok(DenseTensor::from_fn(&[n, n], |ix| {
        if ix[0] >= ix[1] { l.data()[ix[0] + ix[1] * n] } else { 0.0 }
    }))
}
