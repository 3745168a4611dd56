//! Permutation operations for tensors.
//!
//! ```text
//! permutedims(tensor, perm)
//!     → validate permutation
//!     → allocate output with permuted shape
//!     → permutedims_into(output, tensor, perm)
//! ```

use crate::backend::{ArrayBackend, GenericBackend};
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Permute the dimensions of a DenseTensor, returning a new DenseTensor.
///
/// `perm[i]` gives the source dimension for the i-th dimension of the result.
///
/// # Errors
///
/// Returns error if `perm` is not a valid permutation of `0..ndim`.
///
/// # Examples
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::operations::permutedims;
///
/// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// let t2 = permutedims(&t, &[1, 0]).unwrap();
/// assert_eq!(t2.shape(), &[3, 2]);
/// assert_eq!(t.get(&[1, 0]), t2.get(&[0, 1]));
/// ```
pub fn permutedims<T: Scalar>(
    tensor: &DenseTensor<T>,
    perm: &[usize],
) -> Result<DenseTensor<T>, TensorError> {
    validate_permutation(perm, tensor.ndim())?;
    let new_shape: Vec<usize> = perm.iter().map(|&p| tensor.shape()[p]).collect();
    let mut result = DenseTensor::zeros(&new_shape);
    permutedims_into(&mut result, tensor, perm);
    Ok(result)
}

/// Permute DenseTensor dimensions into an existing output tensor.
///
/// # Panics
///
/// Panics if dest is smaller than src.
pub fn permutedims_into<T: Scalar>(dest: &mut DenseTensor<T>, src: &DenseTensor<T>, perm: &[usize]) {
    GenericBackend::permute_into(dest, src, perm);
}

/// Reverse the order of all dimensions (matrix transpose for rank 2).
pub fn transpose<T: Scalar>(tensor: &DenseTensor<T>) -> DenseTensor<T> {
    let perm: Vec<usize> = (0..tensor.ndim()).rev().collect();
    permutedims(tensor, &perm).expect("transpose: reversed axes form a permutation")
}

/// Validate that perm is a valid permutation of 0..ndim.
fn validate_permutation(perm: &[usize], ndim: usize) -> Result<(), TensorError> {
    if perm.len() != ndim {
        return Err(TensorError::InvalidPermutation {
            perm: perm.to_vec(),
            ndim,
        });
    }
    let mut seen = vec![false; ndim];
    for &p in perm {
        if p >= ndim || seen[p] {
            return Err(TensorError::InvalidPermutation {
                perm: perm.to_vec(),
                ndim,
            });
        }
        seen[p] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutedims_3d() {
        let src = DenseTensor::from_fn(&[2, 3, 4], |ix| (ix[0] * 100 + ix[1] * 10 + ix[2]) as f64);
        let dest = permutedims(&src, &[2, 0, 1]).unwrap();
        assert_eq!(dest.shape(), &[4, 2, 3]);
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    assert_eq!(src.get(&[i, j, k]), dest.get(&[k, i, j]));
                }
            }
        }
    }

    #[test]
    fn test_invalid_permutation() {
        let t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3]);
        assert!(permutedims(&t, &[0, 0]).is_err());
        assert!(permutedims(&t, &[0]).is_err());
        assert!(permutedims(&t, &[0, 2]).is_err());
    }

    #[test]
    fn test_transpose_matrix() {
        let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let tt = transpose(&t);
        assert_eq!(tt.shape(), &[3, 2]);
        assert_eq!(tt.get(&[2, 1]), t.get(&[1, 2]));
    }
}
