//! Stride and shape utilities.
//!
//! Uses column-major (Fortran) order to match faer. Broadcasting follows the
//! NumPy convention: shapes are aligned on their trailing dimensions, missing
//! leading dimensions count as 1, and a dimension of size 1 stretches to
//! match the other operand.

use crate::error::TensorError;

/// Compute column-major strides from shape.
///
/// For shape [d0, d1, d2, ...], returns strides [1, d0, d0*d1, ...].
///
/// # Examples
///
/// ```
/// use bayestensors::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![1, 3, 12]);
/// assert_eq!(compute_strides(&[]), Vec::<usize>::new());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(shape.len());
    let mut stride = 1;
    for &dim in shape {
        strides.push(stride);
        stride *= dim;
    }
    strides
}

/// Convert cartesian indices to a linear index.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Convert a linear index to cartesian indices (column-major).
pub fn linear_to_cartesian(mut linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut indices = Vec::with_capacity(shape.len());
    for &dim in shape {
        indices.push(linear % dim);
        linear /= dim;
    }
    indices
}

/// Number of elements of a shape (a rank-0 shape holds one element).
#[inline]
pub fn shape_len(shape: &[usize]) -> usize {
    shape.iter().product::<usize>()
}

/// Compute the broadcast shape of two shapes.
///
/// # Errors
///
/// Returns `TensorError::IncompatibleShapes` when a pair of aligned
/// dimensions differs and neither is 1.
///
/// # Examples
///
/// ```
/// use bayestensors::strides::broadcast_shape;
///
/// assert_eq!(broadcast_shape(&[5, 4], &[4]).unwrap(), vec![5, 4]);
/// assert_eq!(broadcast_shape(&[1, 3], &[2, 1]).unwrap(), vec![2, 3]);
/// assert!(broadcast_shape(&[2, 3], &[4]).is_err());
/// ```
pub fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>, TensorError> {
    let ndim = lhs.len().max(rhs.len());
    let mut shape = vec![0; ndim];
    for (i, out) in shape.iter_mut().enumerate() {
        let l = padded_dim(lhs, ndim, i);
        let r = padded_dim(rhs, ndim, i);
        *out = if l == r || r == 1 {
            l
        } else if l == 1 {
            r
        } else {
            return Err(TensorError::IncompatibleShapes {
                operation: "broadcast",
                lhs: lhs.to_vec(),
                rhs: rhs.to_vec(),
            });
        };
    }
    Ok(shape)
}

/// Check that `src` can be broadcast to exactly `target`.
pub fn can_broadcast_to(src: &[usize], target: &[usize]) -> bool {
    src.len() <= target.len()
        && (0..target.len()).all(|i| {
            let d = padded_dim(src, target.len(), i);
            d == target[i] || d == 1
        })
}

/// Strides of `src` viewed with the layout of `target`.
///
/// Leading dimensions missing from `src` and dimensions of size 1 that are
/// stretched get stride 0, so walking `target` with these strides reads the
/// broadcast element of `src`.
pub fn broadcast_strides(src: &[usize], target: &[usize]) -> Vec<usize> {
    let src_strides = compute_strides(src);
    let offset = target.len() - src.len();
    (0..target.len())
        .map(|i| {
            if i < offset || src[i - offset] == 1 {
                0
            } else {
                src_strides[i - offset]
            }
        })
        .collect()
}

/// Resolve a possibly negative axis against a rank.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize, TensorError> {
    let resolved = if axis < 0 { axis + ndim as isize } else { axis };
    if resolved < 0 || resolved as usize >= ndim {
        return Err(TensorError::AxisOutOfRange { axis, ndim });
    }
    Ok(resolved as usize)
}

#[inline]
fn padded_dim(shape: &[usize], ndim: usize, i: usize) -> usize {
    let offset = ndim - shape.len();
    if i < offset { 1 } else { shape[i - offset] }
}
