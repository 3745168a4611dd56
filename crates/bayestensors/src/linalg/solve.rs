//! Linear solves and matrix inverse.

use faer::Par;
use faer::linalg::solvers::Solve;
use faer::linalg::triangular_solve::{solve_lower_triangular_in_place, solve_upper_triangular_in_place};

use super::{matrix_dims, square_dim};
use crate::backend::{AsFaerMat, tensor_from_faer_mat};
use crate::error::TensorError;
use crate::tensor::DenseTensor;

/// Rows and columns of a right-hand side for an `n x n` system.
///
/// A rank-1 `b` is treated as a single column.
fn rhs_dims(n: usize, a: &DenseTensor<f64>, b: &DenseTensor<f64>) -> Result<(usize, usize), TensorError> {
    let (rows, cols) = match b.ndim() {
        1 => (b.shape()[0], 1),
        _ => matrix_dims(b)?,
    };
    if rows != n {
        return Err(TensorError::IncompatibleShapes {
            operation: "solve",
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }
    Ok((rows, cols))
}

/// Solve `A X = B` for `X`.
///
/// `b` may be a vector of length `n` or an `n x k` matrix; the result has the
/// shape of `b`.
///
/// # Errors
///
/// Returns a shape error if `a` is not square or `b` does not conform, and
/// `TensorError::SingularMatrix` if the solution is not finite.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::linalg::solve;
///
/// let a = DenseTensor::from_vec(vec![2.0, 0.0, 0.0, 4.0], &[2, 2]).unwrap();
/// let b = DenseTensor::from_vec(vec![2.0, 2.0], &[2]).unwrap();
/// let x = solve(&a, &b).unwrap();
/// assert_eq!(x.data(), &[1.0, 0.5]);
/// ```
pub fn solve(a: &DenseTensor<f64>, b: &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError> {
    let n = square_dim(a)?;
    let (rows, cols) = rhs_dims(n, a, b)?;

    let lu = a.as_faer_mat(n, n).partial_piv_lu();
    let mut x_mat = b.as_faer_mat(rows, cols).to_owned();
    lu.solve_in_place(&mut x_mat);

    let x = tensor_from_faer_mat(x_mat.as_ref());
    if x.data().iter().any(|v| !v.is_finite()) {
        return Err(TensorError::SingularMatrix);
    }
    x.reshape(b.shape())
}

/// Inverse of a square matrix.
///
/// # Errors
///
/// Same conditions as [`solve`].
pub fn inv(a: &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError> {
    let n = square_dim(a)?;
    solve(a, &DenseTensor::identity(n))
}

/// Solve a triangular system with faer's triangular solvers.
///
/// With `lower` the matrix is lower triangular, otherwise upper. With
/// `transpose` the system `Aᵀ X = B` is solved instead. Entries outside the
/// selected triangle are ignored.
///
/// # Errors
///
/// Returns a shape error for non-conforming operands and
/// `TensorError::SingularMatrix` for a zero diagonal entry.
pub fn solve_triangular(
    a: &DenseTensor<f64>,
    b: &DenseTensor<f64>,
    lower: bool,
    transpose: bool,
) -> Result<DenseTensor<f64>, TensorError> {
    let n = square_dim(a)?;
    let (_, cols) = rhs_dims(n, a, b)?;
    if (0..n).any(|i| a.data()[i + i * n] == 0.0) {
        return Err(TensorError::SingularMatrix);
    }

    let a_mat = a.as_faer_mat(n, n);
    let op_a = if transpose { a_mat.transpose() } else { a_mat };
    let mut x_mat = b.as_faer_mat(n, cols).to_owned();
    // op(A) is lower triangular exactly when one of `lower`/`transpose` holds.
    if lower != transpose {
        solve_lower_triangular_in_place(op_a, x_mat.as_mut(), Par::Seq);
    } else {
        solve_upper_triangular_in_place(op_a, x_mat.as_mut(), Par::Seq);
    }
    tensor_from_faer_mat(x_mat.as_ref()).reshape(b.shape())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::matmul;
    use approx::assert_relative_eq;

    fn spd3() -> DenseTensor<f64> {
        DenseTensor::from_vec(
            vec![4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 2.0],
            &[3, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_solve_matrix_rhs() {
        let a = spd3();
        let b = DenseTensor::from_fn(&[3, 2], |ix| (ix[0] + 2 * ix[1]) as f64 + 1.0);
        let x = solve(&a, &b).unwrap();
        let ax = matmul(&a, &x).unwrap();
        for (l, r) in ax.data().iter().zip(b.data()) {
            assert_relative_eq!(l, r, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_solve_shape_error() {
        let a = spd3();
        let b: DenseTensor<f64> = DenseTensor::ones(&[2]);
        assert!(matches!(
            solve(&a, &b),
            Err(TensorError::IncompatibleShapes { operation: "solve", .. })
        ));
    }

    #[test]
    fn test_inv() {
        let a = spd3();
        let a_inv = inv(&a).unwrap();
        let eye = matmul(&a, &a_inv).unwrap();
        let expected: DenseTensor<f64> = DenseTensor::identity(3);
        for (l, r) in eye.data().iter().zip(expected.data()) {
            assert_relative_eq!(l, r, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_solve_triangular_all_modes() {
        // L = [[2, 0], [1, 4]]
        let l = DenseTensor::from_vec(vec![2.0, 1.0, 0.0, 4.0], &[2, 2]).unwrap();
        let b = DenseTensor::from_vec(vec![2.0, 9.0], &[2]).unwrap();

        // L x = b  ->  x = [1, 2]
        let x = solve_triangular(&l, &b, true, false).unwrap();
        assert_relative_eq!(x.data()[0], 1.0);
        assert_relative_eq!(x.data()[1], 2.0);

        // Lᵀ x = b, Lᵀ = [[2, 1], [0, 4]]  ->  x = [(2 - 9/4)/2, 9/4]
        let x = solve_triangular(&l, &b, true, true).unwrap();
        assert_relative_eq!(x.data()[1], 2.25);
        assert_relative_eq!(x.data()[0], -0.125);

        // Upper U = Lᵀ gives the same system
        let u = crate::operations::transpose(&l);
        let y = solve_triangular(&u, &b, false, false).unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn test_solve_triangular_ignores_other_triangle() {
        // Only the lower triangle is read; the 7.0 above the diagonal is ignored.
        let l = DenseTensor::from_vec(vec![2.0, 1.0, 7.0, 4.0], &[2, 2]).unwrap();
        let b = DenseTensor::from_vec(vec![2.0, 9.0, 4.0, 6.0], &[2, 2]).unwrap();
        let x = solve_triangular(&l, &b, true, false).unwrap();
        assert_eq!(x.shape(), &[2, 2]);
        assert_relative_eq!(*x.get(&[0, 0]).unwrap(), 1.0);
        assert_relative_eq!(*x.get(&[1, 0]).unwrap(), 2.0);
        assert_relative_eq!(*x.get(&[0, 1]).unwrap(), 2.0);
        assert_relative_eq!(*x.get(&[1, 1]).unwrap(), 1.0);
    }

    #[test]
    fn test_solve_triangular_singular() {
        let l = DenseTensor::from_vec(vec![0.0, 1.0, 0.0, 4.0], &[2, 2]).unwrap();
        let b: DenseTensor<f64> = DenseTensor::ones(&[2]);
        assert!(matches!(
            solve_triangular(&l, &b, true, false),
            Err(TensorError::SingularMatrix)
        ));
    }
}
