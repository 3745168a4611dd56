//! Sum reductions.

use crate::backend::{ArrayBackend, GenericBackend};
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Sum of all elements as a rank-0 tensor.
pub fn sum<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    let total = tensor
        .data()
        .iter()
        .fold(ElT::zero(), |acc, &x| acc + x);
    DenseTensor::scalar(total)
}

/// Sum along one axis.
///
/// Negative axes count from the end. With `keepdims` the reduced axis stays
/// with size 1, otherwise it is removed.
///
/// # Errors
///
/// Returns `TensorError::AxisOutOfRange` for an invalid axis.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::operations::sum_axis;
///
/// let t: DenseTensor<f64> = DenseTensor::ones(&[5, 4]);
/// let s = sum_axis(&t, 0, false).unwrap();
/// assert_eq!(s.shape(), &[4]);
/// assert_eq!(s.data(), &[5.0, 5.0, 5.0, 5.0]);
/// ```
pub fn sum_axis<ElT: Scalar>(
    tensor: &DenseTensor<ElT>,
    axis: isize,
    keepdims: bool,
) -> Result<DenseTensor<ElT>, TensorError> {
    let (_, kept_shape) = tensor.reduced_shape(axis, true)?;
    let mut result = DenseTensor::zeros(&kept_shape);
    GenericBackend::sum_into(&mut result, tensor);
    if keepdims {
        Ok(result)
    } else {
        let (_, squeezed) = tensor.reduced_shape(axis, false)?;
        result.reshape(&squeezed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_all() {
        let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let s = sum(&t);
        assert_eq!(s.shape(), &[] as &[usize]);
        assert_eq!(s.item().unwrap(), 10.0);
    }

    #[test]
    fn test_sum_axis_last_keepdims() {
        let t = DenseTensor::from_fn(&[2, 3], |ix| (ix[0] * 3 + ix[1]) as f64);
        let s = sum_axis(&t, -1, true).unwrap();
        assert_eq!(s.shape(), &[2, 1]);
        assert_eq!(s.data(), &[3.0, 12.0]);
    }

    #[test]
    fn test_sum_axis_middle() {
        let t: DenseTensor<f64> = DenseTensor::ones(&[2, 3, 4]);
        let s = sum_axis(&t, 1, false).unwrap();
        assert_eq!(s.shape(), &[2, 4]);
        assert!(s.data().iter().all(|&x| x == 3.0));
    }

    #[test]
    fn test_sum_axis_out_of_range() {
        let t: DenseTensor<f64> = DenseTensor::ones(&[2, 3]);
        assert!(sum_axis(&t, 2, false).is_err());
    }
}
