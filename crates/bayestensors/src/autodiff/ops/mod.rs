//! Tracked operators.
//!
//! Every operator accepts anything implementing
//! [`IntoTracked`](crate::autodiff::IntoTracked), computes its value eagerly
//! and records one graph node when at least one operand requires gradient.
//! Elementwise binary operators broadcast their operands by recording
//! [`broadcast_to`] nodes, so the gradient reduction lives in one place.

mod arithmetic;
mod array;
mod linalg;
mod math;

pub use arithmetic::{add, divide, multiply, negative, subtract};
pub use array::{broadcast_to, mean, reshape, sum, sum_axis, transpose};
pub use linalg::{cholesky, det, inv, logdet, matmul, solve, trace};
pub use math::{abs, exp, log, sqrt, square};
