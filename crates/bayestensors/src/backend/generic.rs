//! Generic (naive loop-based) backend implementation.

use crate::backend::ArrayBackend;
use crate::scalar::Scalar;
use crate::strides::{broadcast_strides, cartesian_to_linear, linear_to_cartesian};
use crate::tensor::DenseTensor;

/// Generic backend using naive loop-based implementations.
///
/// It is always available and is what every operator dispatches to.
pub struct GenericBackend;

impl ArrayBackend for GenericBackend {
    fn permute_into<ElT: Scalar>(
        dest: &mut DenseTensor<ElT>,
        src: &DenseTensor<ElT>,
        perm: &[usize],
    ) {
        let old_shape = src.shape();
        // Copy strides to avoid borrow conflict with data_mut()
        let new_strides: Vec<usize> = dest.strides().to_vec();

        for linear_old in 0..src.len() {
            let old_indices = linear_to_cartesian(linear_old, old_shape);
            let new_indices: Vec<usize> = perm.iter().map(|&p| old_indices[p]).collect();
            let linear_new = cartesian_to_linear(&new_indices, &new_strides);
            dest.data_mut()[linear_new] = src.data()[linear_old];
        }
    }

    fn broadcast_into<ElT: Scalar>(dest: &mut DenseTensor<ElT>, src: &DenseTensor<ElT>) {
        let out_shape = dest.shape().to_vec();
        let src_strides = broadcast_strides(src.shape(), &out_shape);
        for linear in 0..dest.len() {
            let idx = linear_to_cartesian(linear, &out_shape);
            let offset = cartesian_to_linear(&idx, &src_strides);
            dest.data_mut()[linear] = src.data()[offset];
        }
    }

    fn sum_into<ElT: Scalar>(dest: &mut DenseTensor<ElT>, src: &DenseTensor<ElT>) {
        let dest_strides = broadcast_strides(dest.shape(), src.shape());
        for (linear, &value) in src.data().iter().enumerate() {
            let idx = linear_to_cartesian(linear, src.shape());
            let offset = cartesian_to_linear(&idx, &dest_strides);
            let slot = &mut dest.data_mut()[offset];
            *slot = *slot + value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_permute_transpose() {
        let src: DenseTensor<f64> =
            DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let mut dest: DenseTensor<f64> = DenseTensor::zeros(&[3, 2]);

        GenericBackend::permute_into(&mut dest, &src, &[1, 0]);

        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(src.get(&[i, j]), dest.get(&[j, i]));
            }
        }
    }

    #[test]
    fn test_generic_broadcast_row() {
        let src = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let mut dest: DenseTensor<f64> = DenseTensor::zeros(&[2, 3]);

        GenericBackend::broadcast_into(&mut dest, &src);

        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(*dest.get(&[i, j]).unwrap(), (j + 1) as f64);
            }
        }
    }

    #[test]
    fn test_generic_sum_into_column() {
        // [2, 3] summed into [2, 1]: row sums
        let src = DenseTensor::from_fn(&[2, 3], |ix| (ix[0] * 3 + ix[1]) as f64);
        let mut dest: DenseTensor<f64> = DenseTensor::zeros(&[2, 1]);

        GenericBackend::sum_into(&mut dest, &src);

        assert_eq!(*dest.get(&[0, 0]).unwrap(), 0.0 + 1.0 + 2.0);
        assert_eq!(*dest.get(&[1, 0]).unwrap(), 3.0 + 4.0 + 5.0);
    }

    #[test]
    fn test_generic_sum_into_scalar() {
        let src: DenseTensor<f64> = DenseTensor::ones(&[5, 2, 3]);
        let mut dest = DenseTensor::scalar(0.0);

        GenericBackend::sum_into(&mut dest, &src);

        assert_eq!(dest.item().unwrap(), 30.0);
    }
}
