//! Matrix product and trace.

use faer::linalg::matmul::matmul as faer_matmul;
use faer::{Accum, Par};

use super::{matrix_dims, square_dim};
use crate::backend::AsFaerMat;
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Matrix product `C = A @ B` of two rank-2 tensors.
///
/// # Errors
///
/// Returns `TensorError::RankMismatch` if either operand is not rank 2 and
/// `TensorError::IncompatibleShapes` if the inner dimensions differ.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::linalg::matmul;
///
/// let a = DenseTensor::from_vec(vec![1.0, 3.0, 2.0, 4.0], &[2, 2]).unwrap();
/// let i = DenseTensor::identity(2);
/// assert_eq!(matmul(&a, &i).unwrap(), a);
/// ```
pub fn matmul<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    let (m, k) = matrix_dims(a)?;
    let (k2, n) = matrix_dims(b)?;
    if k != k2 {
        return Err(TensorError::IncompatibleShapes {
            operation: "matmul",
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }

    let mut c = DenseTensor::<ElT>::zeros(&[m, n]);
    let a_mat = a.as_faer_mat(m, k);
    let b_mat = b.as_faer_mat(k, n);
    let mut c_mat = c.as_faer_mat_mut(m, n);

    // C = A * B
    faer_matmul(
        c_mat.as_mut(),
        Accum::Replace,
        a_mat,
        b_mat,
        ElT::one(),
        Par::Seq,
    );

    Ok(c)
}

/// Sum of the diagonal of a square matrix, as a rank-0 tensor.
///
/// # Errors
///
/// Returns an error if `a` is not a square rank-2 tensor.
pub fn trace<ElT: Scalar>(a: &DenseTensor<ElT>) -> Result<DenseTensor<ElT>, TensorError> {
    let n = square_dim(a)?;
    let total = (0..n).fold(ElT::zero(), |acc, i| acc + a.data()[i + i * n]);
    Ok(DenseTensor::scalar(total))
}
