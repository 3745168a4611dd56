//! Determinants from faer's partial-pivot LU factorization.

use super::square_dim;
use crate::backend::AsFaerMat;
use crate::error::TensorError;
use crate::tensor::DenseTensor;

/// Sign of a permutation given as its forward index array.
fn permutation_sign(forward: &[usize]) -> f64 {
    let mut visited = vec![false; forward.len()];
    let mut sign = 1.0;
    for start in 0..forward.len() {
        let mut cycle_len = 0;
        let mut i = start;
        while !visited[i] {
            visited[i] = true;
            i = forward[i];
            cycle_len += 1;
        }
        // A cycle of length k is k - 1 transpositions.
        if cycle_len > 0 && cycle_len % 2 == 0 {
            sign = -sign;
        }
    }
    sign
}

/// Sign and natural log of the absolute determinant.
///
/// A singular matrix yields `(0.0, -inf)`.
///
/// # Errors
///
/// Returns an error if `a` is not a square rank-2 tensor.
pub fn slogdet(a: &DenseTensor<f64>) -> Result<(f64, f64), TensorError> {
    let n = square_dim(a)?;
    let lu = a.as_faer_mat(n, n).partial_piv_lu();
    let u = lu.U();
    let mut sign = permutation_sign(lu.P().arrays().0);
    let mut logabs = 0.0;
    for i in 0..n {
        let d = u[(i, i)];
        if d == 0.0 {
            return Ok((0.0, f64::NEG_INFINITY));
        }
        if d < 0.0 {
            sign = -sign;
        }
        logabs += d.abs().ln();
    }
    Ok((sign, logabs))
}

/// Determinant of a square matrix.
///
/// # Errors
///
/// Returns an error if `a` is not a square rank-2 tensor.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::linalg::det;
///
/// let a = DenseTensor::from_vec(vec![1.0, 3.0, 2.0, 4.0], &[2, 2]).unwrap();
/// assert!((det(&a).unwrap() + 2.0).abs() < 1e-12);
/// ```
pub fn det(a: &DenseTensor<f64>) -> Result<f64, TensorError> {
    let n = square_dim(a)?;
    Ok(a.as_faer_mat(n, n).determinant())
}

/// Natural log of a positive determinant.
///
/// # Errors
///
/// Returns `TensorError::NonPositiveDeterminant` when the determinant is zero
/// or negative.
pub fn logdet(a: &DenseTensor<f64>) -> Result<f64, TensorError> {
    let (sign, logabs) = slogdet(a)?;
    if sign <= 0.0 {
        return Err(TensorError::NonPositiveDeterminant { sign });
    }
    Ok(logabs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_det_3x3() {
        // [[2, 0, 1], [1, 3, 2], [1, 1, 1]] has det = 2*(3-2) - 0 + 1*(1-3) = 0
        let a = DenseTensor::from_vec(
            vec![2.0, 1.0, 1.0, 0.0, 3.0, 1.0, 1.0, 2.0, 1.0],
            &[3, 3],
        )
        .unwrap();
        assert_relative_eq!(det(&a).unwrap(), 0.0, epsilon = 1e-12);

        let b = DenseTensor::from_vec(
            vec![2.0, 1.0, 1.0, 0.0, 3.0, 1.0, 1.0, 2.0, 4.0],
            &[3, 3],
        )
        .unwrap();
        // 2*(12-2) - 0 + 1*(1-3) = 18
        assert_relative_eq!(det(&b).unwrap(), 18.0, epsilon = 1e-12);
    }

    #[test]
    fn test_det_requires_pivoting() {
        let a = DenseTensor::from_vec(vec![0.0, 1.0, 1.0, 0.0], &[2, 2]).unwrap();
        assert_relative_eq!(det(&a).unwrap(), -1.0);
    }

    #[test]
    fn test_slogdet_negative() {
        let a = DenseTensor::from_vec(vec![-2.0, 0.0, 0.0, 3.0], &[2, 2]).unwrap();
        let (sign, logabs) = slogdet(&a).unwrap();
        assert_eq!(sign, -1.0);
        assert_relative_eq!(logabs, 6.0_f64.ln(), epsilon = 1e-12);
        assert!(matches!(
            logdet(&a),
            Err(TensorError::NonPositiveDeterminant { .. })
        ));
    }

    #[test]
    fn test_permutation_sign() {
        assert_eq!(permutation_sign(&[0, 1, 2]), 1.0);
        assert_eq!(permutation_sign(&[1, 0, 2]), -1.0);
        assert_eq!(permutation_sign(&[1, 2, 0]), 1.0);
        assert_eq!(permutation_sign(&[3, 2, 1, 0]), 1.0);
    }

    #[test]
    fn test_slogdet_matches_det_with_pivoting() {
        // Pivoting swaps rows; the sign must follow.
        let a = DenseTensor::from_vec(
            vec![0.5, 3.0, -1.0, 2.0, 1.0, 4.0, -2.0, 0.5, 1.0],
            &[3, 3],
        )
        .unwrap();
        let d = det(&a).unwrap();
        let (sign, logabs) = slogdet(&a).unwrap();
        assert_relative_eq!(sign * logabs.exp(), d, max_relative = 1e-12);
    }

    #[test]
    fn test_slogdet_singular() {
        let a: DenseTensor<f64> = DenseTensor::zeros(&[2, 2]);
        let (sign, logabs) = slogdet(&a).unwrap();
        assert_eq!(sign, 0.0);
        assert_eq!(logabs, f64::NEG_INFINITY);
        assert!(logdet(&a).is_err());
    }
}
