//! Untracked array operations.
//!
//! These are the forward kernels the autodiff operators are built from.
//! They work on plain [`DenseTensor`](crate::DenseTensor) values and never
//! touch the computation graph.
//!
//! ```text
//! elementwise   apply, apply_binary (broadcasting), scale
//! broadcast     broadcast_to, sum_to_shape
//! reduce        sum, sum_axis
//! permutedims   permutedims, transpose
//! ```

mod broadcast;
mod elementwise;
mod permutedims;
mod reduce;

pub use broadcast::{broadcast_to, sum_to_shape};
pub use elementwise::{apply, apply_binary, scale};
pub(crate) use elementwise::outer;
pub use permutedims::{permutedims, permutedims_into, transpose};
pub use reduce::{sum, sum_axis};
