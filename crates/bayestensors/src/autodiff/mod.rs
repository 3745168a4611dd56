//! Reverse-mode automatic differentiation.
//!
//! Expressions are built eagerly from [`Parameter`]s and constants through
//! the operators in [`ops`]. Each operator call computes its value and
//! records one node in a thread-local computation graph. Calling
//! [`TrackedTensor::backward`] walks that graph from the output and adds the
//! gradient into every parameter the output depends on.
//!
//! # Architecture
//!
//! ```text
//! Parameter ──(lazy leaf)──►  ComputationGraph (thread_local, arena)
//!     │                              │
//!     ▼                              ▼
//! TrackedTensor ──────────►   Node::Leaf | Node::Operation(Operation)
//!     │                                            │
//!     ▼                                            ▼
//! DenseTensor<f64>                    Operation::backward (closed enum)
//! ```
//!
//! # Example
//!
//! ```
//! use bayestensors::DenseTensor;
//! use bayestensors::autodiff::{Parameter, clear_graph, ops};
//!
//! clear_graph();
//!
//! let x = Parameter::new(DenseTensor::ones(&[2, 3]));
//! let y = Parameter::new(DenseTensor::ones(&[4, 3]));
//!
//! // loss = sum(x @ yᵀ)
//! let xy = ops::matmul(&x, ops::transpose(&y).unwrap()).unwrap();
//! let loss = ops::sum(&xy).unwrap();
//! loss.backward().unwrap();
//!
//! assert_eq!(x.grad().unwrap().shape(), &[2, 3]);
//! assert!(x.grad().unwrap().data().iter().all(|&g| g == 4.0));
//! ```
//!
//! # Design Notes
//!
//! - Thread-local computation graph (no `Arc`, uses `Rc`)
//! - Node ids carry the graph generation; [`clear_graph`] invalidates them
//! - Gradient accumulation for multiple paths to same node

mod backward;
mod gradients;
mod graph;
mod operation;
pub mod ops;
mod parameter;
mod tensor;

pub use gradients::Gradients;
pub use graph::{ComputationGraph, NodeId, clear_graph, with_graph};
pub use operation::Operation;
pub use parameter::Parameter;
pub use tensor::{IntoTracked, TrackedTensor};
