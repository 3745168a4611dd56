//! Backend abstraction for array kernels.
//!
//! # Backends
//!
//! - `GenericBackend`: Naive loop-based implementation (always available)
//!
//! # faer Integration
//!
//! The `faer_interop` module provides zero-copy conversion between tensors and
//! faer's matrix types for the linear-algebra kernels.

mod faer_interop;
mod generic;

pub use faer_interop::{AsFaerMat, tensor_from_faer_mat};
pub use generic::GenericBackend;

use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Kernels that move or combine elements according to shapes.
///
/// Every broadcasting operator and every broadcast-reducing backward rule
/// goes through these three kernels.
pub trait ArrayBackend {
    /// Write `src` permuted by `perm` into `dest`.
    ///
    /// `dest` must already have the permuted shape.
    fn permute_into<ElT: Scalar>(dest: &mut DenseTensor<ElT>, src: &DenseTensor<ElT>, perm: &[usize]);

    /// Expand `src` into `dest`, whose shape `src` broadcasts to.
    fn broadcast_into<ElT: Scalar>(dest: &mut DenseTensor<ElT>, src: &DenseTensor<ElT>);

    /// Sum `src` into `dest`, whose shape broadcasts to the shape of `src`.
    ///
    /// This is the adjoint of [`ArrayBackend::broadcast_into`]: every element
    /// of `src` is added to the element of `dest` it was broadcast from.
    fn sum_into<ElT: Scalar>(dest: &mut DenseTensor<ElT>, src: &DenseTensor<ElT>);
}
