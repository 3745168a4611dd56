//! Element-wise tensor operations.

use crate::error::TensorError;
use crate::operations::broadcast::broadcast_to;
use crate::scalar::Scalar;
use crate::strides::broadcast_shape;
use crate::tensor::DenseTensor;

/// Multiply all elements by a scalar, returning a new tensor.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::operations::scale;
///
/// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// assert_eq!(scale(&t, 2.0).data(), &[2.0, 4.0, 6.0]);
/// ```
pub fn scale<ElT: Scalar>(tensor: &DenseTensor<ElT>, alpha: ElT) -> DenseTensor<ElT> {
    apply(tensor, |x| x * alpha)
}

/// Apply a function to each element, returning a new tensor.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::operations::apply;
///
/// let t = DenseTensor::from_vec(vec![1.0, 4.0, 9.0], &[3]).unwrap();
/// let ts = apply(&t, |x: f64| x.sqrt());
/// assert_eq!(ts.data(), &[1.0, 2.0, 3.0]);
/// ```
pub fn apply<ElT: Scalar, F>(tensor: &DenseTensor<ElT>, f: F) -> DenseTensor<ElT>
where
    F: Fn(ElT) -> ElT,
{
    let data: Vec<ElT> = tensor.data().iter().map(|&x| f(x)).collect();
    DenseTensor::from_vec(data, tensor.shape()).expect("apply: shape unchanged")
}

/// Combine two tensors element-wise, broadcasting them to a common shape.
///
/// # Errors
///
/// Returns `TensorError::IncompatibleShapes` if the shapes do not broadcast.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::operations::apply_binary;
///
/// let a: DenseTensor<f64> = DenseTensor::ones(&[2, 3]);
/// let b = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let c = apply_binary(&a, &b, |x, y| x + y).unwrap();
/// assert_eq!(c.shape(), &[2, 3]);
/// assert_eq!(c.get(&[1, 2]), Some(&4.0));
/// ```
pub fn apply_binary<ElT: Scalar, F>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
    f: F,
) -> Result<DenseTensor<ElT>, TensorError>
where
    F: Fn(ElT, ElT) -> ElT,
{
    if a.shape() == b.shape() {
        return Ok(zip_same_shape(a, b, f));
    }
    let shape = broadcast_shape(a.shape(), b.shape()).map_err(|_| {
        TensorError::IncompatibleShapes {
            operation: "elementwise",
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        }
    })?;
    let a = broadcast_to(a, &shape)?;
    let b = broadcast_to(b, &shape)?;
    Ok(zip_same_shape(&a, &b, f))
}

fn zip_same_shape<ElT: Scalar, F>(a: &DenseTensor<ElT>, b: &DenseTensor<ElT>, f: F) -> DenseTensor<ElT>
where
    F: Fn(ElT, ElT) -> ElT,
{
    let data: Vec<ElT> = a
        .data()
        .iter()
        .zip(b.data().iter())
        .map(|(&x, &y)| f(x, y))
        .collect();
    DenseTensor::from_vec(data, a.shape()).expect("apply_binary: shape unchanged")
}

/// Outer product of two vectors as an `[m, n]` matrix.
pub(crate) fn outer<ElT: Scalar>(u: &DenseTensor<ElT>, v: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    DenseTensor::from_fn(&[u.len(), v.len()], |ix| u.data()[ix[0]] * v.data()[ix[1]])
}
