//! bayestensors - reverse-mode automatic differentiation on dense tensors
//!
//! This crate provides column-major n-dimensional arrays, a tape-based
//! autodiff engine over them, and differentiable probability distributions
//! built on top of the engine.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Probabilistic layer (distributions, optimizer)
//!     → Gaussian, MultivariateGaussian, GaussianMixture, GradientDescent
//!
//! Level 2: Differentiable operators (autodiff module)
//!     → TrackedTensor, Parameter, ops::*, backward
//!
//! Level 3: Untracked kernels (operations, linalg modules)
//!     → broadcasting, reductions, permutedims, faer-backed linear algebra
//!
//! Level 4: Storage (tensor, strides, backend)
//!     → DenseTensor, GenericBackend, faer views
//! ```
//!
//! # Example
//!
//! ```
//! use bayestensors::DenseTensor;
//! use bayestensors::autodiff::{Parameter, ops};
//!
//! // Column-major 2x2 matrix
//! let a = Parameter::new(DenseTensor::from_vec(vec![2.0, 1.0, 1.0, 3.0], &[2, 2]).unwrap());
//!
//! // d/dA logdet(A) = A⁻ᵀ
//! ops::logdet(&a).unwrap().backward().unwrap();
//! let grad = a.grad().unwrap();
//! assert!((grad.get(&[0, 0]).unwrap() - 0.6).abs() < 1e-12);
//! assert!((grad.get(&[1, 0]).unwrap() + 0.2).abs() < 1e-12);
//! ```

pub mod autodiff;
pub mod backend;
pub mod distributions;
pub mod error;
pub mod linalg;
pub mod operations;
pub mod optimizer;
pub mod random;
pub mod scalar;
pub mod strides;
pub mod tensor;

pub use autodiff::{Parameter, TrackedTensor};
pub use error::{ErrorKind, TensorError};
pub use scalar::Scalar;
pub use tensor::DenseTensor;
