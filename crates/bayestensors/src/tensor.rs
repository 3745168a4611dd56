//! Dense n-dimensional array used as the value of every graph node.
//!
//! Storage is a contiguous `Vec` in column-major order, matching faer, so a
//! 2-D tensor can be viewed as a faer matrix without copying.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::{
    cartesian_to_linear, compute_strides, linear_to_cartesian, normalize_axis, shape_len,
};

/// A dense n-dimensional tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTensor<ElT: Scalar> {
    data: Vec<ElT>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl<ElT: Scalar> DenseTensor<ElT> {
    /// Create a new tensor with the given shape, zero-initialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use bayestensors::DenseTensor;
    ///
    /// let t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, ElT::zero())
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, ElT::one())
    }

    /// Create a tensor filled with `value`.
    pub fn full(shape: &[usize], value: ElT) -> Self {
        Self {
            data: vec![value; shape_len(shape)],
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// Create a rank-0 tensor holding a single value.
    pub fn scalar(value: ElT) -> Self {
        Self::full(&[], value)
    }

    /// Create an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut t = Self::zeros(&[n, n]);
        for i in 0..n {
            t.data[i + i * n] = ElT::one();
        }
        t
    }

    /// Create tensor from data and shape.
    ///
    /// Data is expected to be in column-major order.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if data length doesn't match shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use bayestensors::DenseTensor;
    ///
    /// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[1, 0]), Some(&2.0)); // column-major
    /// assert_eq!(t.get(&[0, 1]), Some(&3.0));
    /// ```
    pub fn from_vec(data: Vec<ElT>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = shape_len(shape);
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        })
    }

    /// Create a tensor by evaluating `f` at every cartesian index.
    ///
    /// # Examples
    ///
    /// ```
    /// use bayestensors::DenseTensor;
    ///
    /// let t = DenseTensor::from_fn(&[2, 3], |ix| (ix[0] * 10 + ix[1]) as f64);
    /// assert_eq!(t.get(&[1, 2]), Some(&12.0));
    /// ```
    pub fn from_fn<F>(shape: &[usize], mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> ElT,
    {
        let data = (0..shape_len(shape))
            .map(|linear| f(&linear_to_cartesian(linear, shape)))
            .collect();
        Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if tensor has zero elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Get underlying data as slice.
    #[inline]
    pub fn data(&self) -> &[ElT] {
        &self.data
    }

    /// Get underlying data as mutable slice.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [ElT] {
        &mut self.data
    }

    /// Consume the tensor, returning its storage.
    pub fn into_vec(self) -> Vec<ElT> {
        self.data
    }

    /// Get element by linear index.
    #[inline]
    pub fn get_linear(&self, i: usize) -> Option<&ElT> {
        self.data.get(i)
    }

    /// Get element by cartesian indices.
    ///
    /// Returns `None` if indices are out of bounds or wrong number of indices.
    pub fn get(&self, indices: &[usize]) -> Option<&ElT> {
        self.linear_index(indices).and_then(|i| self.data.get(i))
    }

    /// Get mutable element by cartesian indices.
    pub fn get_mut(&mut self, indices: &[usize]) -> Option<&mut ElT> {
        self.linear_index(indices).and_then(|i| self.data.get_mut(i))
    }

    /// Set element by cartesian indices.
    ///
    /// # Errors
    ///
    /// Returns error if indices are out of bounds or wrong number of indices.
    pub fn set(&mut self, indices: &[usize], value: ElT) -> Result<(), TensorError> {
        if indices.len() != self.ndim() {
            return Err(TensorError::WrongNumberOfIndices {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        for (&idx, &dim) in indices.iter().zip(self.shape.iter()) {
            if idx >= dim {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    dim_size: dim,
                });
            }
        }
        let linear = cartesian_to_linear(indices, &self.strides);
        self.data[linear] = value;
        Ok(())
    }

    /// Return the single element of a one-element tensor.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if the tensor holds more than one element.
    pub fn item(&self) -> Result<ElT, TensorError> {
        match self.data.as_slice() {
            [value] => Ok(*value),
            _ => Err(TensorError::ShapeMismatch {
                expected: 1,
                actual: self.len(),
            }),
        }
    }

    /// Reshape the tensor, keeping the storage order.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if the element count changes.
    ///
    /// # Example
    ///
    /// ```
    /// use bayestensors::DenseTensor;
    ///
    /// let t = DenseTensor::<f64>::ones(&[2, 6]);
    /// let r = t.reshape(&[3, 4]).unwrap();
    /// assert_eq!(r.shape(), &[3, 4]);
    /// assert_eq!(r.data(), t.data());
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_vec(self.data.clone(), new_shape)
    }

    /// Permute the dimensions of the tensor.
    ///
    /// `perm[i]` gives the source dimension for the i-th dimension of the result.
    pub fn permutedims(&self, perm: &[usize]) -> Result<Self, TensorError> {
        crate::operations::permutedims(self, perm)
    }

    /// Shape with `axis` removed, or set to 1 when `keepdims` is true.
    pub(crate) fn reduced_shape(
        &self,
        axis: isize,
        keepdims: bool,
    ) -> Result<(usize, Vec<usize>), TensorError> {
        let axis = normalize_axis(axis, self.ndim())?;
        let mut shape = self.shape.clone();
        if keepdims {
            shape[axis] = 1;
        } else {
            shape.remove(axis);
        }
        Ok((axis, shape))
    }

    fn linear_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.ndim() {
            return None;
        }
        if indices.iter().zip(self.shape.iter()).any(|(&i, &d)| i >= d) {
            return None;
        }
        Some(cartesian_to_linear(indices, &self.strides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3]);
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.len(), 6);
        assert!(t.data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_scalar_tensor() {
        let t = DenseTensor::scalar(7.0);
        assert_eq!(t.shape(), &[] as &[usize]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.item().unwrap(), 7.0);
        assert_eq!(t.get(&[]), Some(&7.0));
    }

    #[test]
    fn test_from_vec_shape_mismatch() {
        let result = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[2, 2]);
        assert!(matches!(
            result,
            Err(TensorError::ShapeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_column_major_layout() {
        let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        assert_eq!(t.get(&[0, 0]), Some(&1.0));
        assert_eq!(t.get(&[1, 0]), Some(&2.0));
        assert_eq!(t.get(&[0, 2]), Some(&5.0));
        assert_eq!(t.get(&[1, 2]), Some(&6.0));
        assert_eq!(t.get(&[2, 0]), None);
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut t: DenseTensor<f64> = DenseTensor::zeros(&[2, 2]);
        assert!(t.set(&[0, 1], 3.0).is_ok());
        assert_eq!(t.get(&[0, 1]), Some(&3.0));
        assert!(t.set(&[2, 0], 1.0).is_err());
        assert!(t.set(&[0], 1.0).is_err());
    }

    #[test]
    fn test_identity() {
        let eye: DenseTensor<f64> = DenseTensor::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(*eye.get(&[i, j]).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_reshape_mismatch() {
        let t: DenseTensor<f64> = DenseTensor::ones(&[2, 6]);
        assert!(t.reshape(&[5, 2]).is_err());
    }

    #[test]
    fn test_item_requires_single_element() {
        let t: DenseTensor<f64> = DenseTensor::ones(&[2]);
        assert!(t.item().is_err());
        let one = DenseTensor::from_vec(vec![4.0], &[1, 1]).unwrap();
        assert_eq!(one.item().unwrap(), 4.0);
    }
}
