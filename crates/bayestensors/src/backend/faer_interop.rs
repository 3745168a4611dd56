//! Zero-copy conversion between tensors and faer matrices.
//!
//! Both bayestensors and faer use column-major storage order, so a 2-D
//! tensor can be viewed as a faer matrix directly.

use faer::{MatMut, MatRef};

use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Extension trait for viewing a tensor as a faer matrix.
pub trait AsFaerMat<T: Scalar> {
    /// View tensor data as an immutable faer matrix (zero-copy).
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols != tensor.len()`.
    ///
    /// # Example
    ///
    /// ```
    /// use bayestensors::DenseTensor;
    /// use bayestensors::backend::AsFaerMat;
    ///
    /// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let mat = t.as_faer_mat(2, 3);
    /// assert_eq!(mat.nrows(), 2);
    /// assert_eq!(mat[(1, 0)], 2.0);
    /// ```
    fn as_faer_mat(&self, rows: usize, cols: usize) -> MatRef<'_, T>;

    /// View tensor data as a mutable faer matrix (zero-copy).
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols != tensor.len()`.
    fn as_faer_mat_mut(&mut self, rows: usize, cols: usize) -> MatMut<'_, T>;
}

impl<T: Scalar> AsFaerMat<T> for DenseTensor<T> {
    fn as_faer_mat(&self, rows: usize, cols: usize) -> MatRef<'_, T> {
        assert_eq!(
            rows * cols,
            self.len(),
            "Matrix dimensions ({} x {} = {}) must match tensor size ({})",
            rows,
            cols,
            rows * cols,
            self.len()
        );
        MatRef::from_column_major_slice(self.data(), rows, cols)
    }

    fn as_faer_mat_mut(&mut self, rows: usize, cols: usize) -> MatMut<'_, T> {
        assert_eq!(
            rows * cols,
            self.len(),
            "Matrix dimensions ({} x {} = {}) must match tensor size ({})",
            rows,
            cols,
            rows * cols,
            self.len()
        );
        MatMut::from_column_major_slice_mut(self.data_mut(), rows, cols)
    }
}

/// Create a `[rows, cols]` tensor from a faer matrix (copies data).
pub fn tensor_from_faer_mat<T: Scalar>(mat: MatRef<'_, T>) -> DenseTensor<T> {
    let rows = mat.nrows();
    let cols = mat.ncols();
    DenseTensor::from_fn(&[rows, cols], |ix| mat[(ix[0], ix[1])])
}
