//! Elementwise univariate Gaussian.

use std::f64::consts::PI;

use rand::Rng;

use super::{Conditioning, RandomVariable, check_positive};
use crate::autodiff::ops::{add, divide, exp, log, multiply, square, subtract, sum};
use crate::autodiff::{IntoTracked, TrackedTensor};
use crate::error::TensorError;
use crate::strides::broadcast_shape;
use crate::tensor::DenseTensor;

/// Independent Gaussians `N(x | mu, std²)`, one per element of the
/// broadcast shape of `mu` and `std`.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::distributions::Gaussian;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let g = Gaussian::new(DenseTensor::zeros(&[3]), 1.0).unwrap();
/// let mut rng = StdRng::seed_from_u64(0);
/// let x = g.forward(&mut rng).unwrap();
/// assert_eq!(x.shape(), &[3]);
///
/// assert!(Gaussian::new(0.0, -1.0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Gaussian {
    mu: TrackedTensor,
    std: TrackedTensor,
    conditioning: Conditioning,
}

impl Gaussian {
    /// Create a Gaussian.
    ///
    /// # Errors
    ///
    /// Returns a shape error if `mu` and `std` do not broadcast, and
    /// `TensorError::InvalidParameter` if any `std` is not positive.
    pub fn new(mu: impl IntoTracked, std: impl IntoTracked) -> Result<Self, TensorError> {
        let (mu, std) = (mu.into_tracked(), std.into_tracked());
        Self::validate(&mu, &std)?;
        Ok(Self {
            mu,
            std,
            conditioning: Conditioning::default(),
        })
    }

    fn validate(mu: &TrackedTensor, std: &TrackedTensor) -> Result<(), TensorError> {
        broadcast_shape(mu.shape(), std.shape())?;
        check_positive("std", std.value())
    }

    /// Attach an observed realization.
    pub fn with_data(mut self, data: impl IntoTracked) -> Self {
        self.conditioning.data = Some(data.into_tracked());
        self
    }

    /// Attach a prior distribution.
    pub fn with_prior(mut self, prior: impl Into<RandomVariable>) -> Self {
        self.conditioning.prior = Some(Box::new(prior.into()));
        self
    }

    /// Mean.
    pub fn mu(&self) -> &TrackedTensor {
        &self.mu
    }

    /// Standard deviation.
    pub fn std(&self) -> &TrackedTensor {
        &self.std
    }

    /// Replace the mean; on error the distribution is unchanged.
    pub fn set_mu(&mut self, mu: impl IntoTracked) -> Result<(), TensorError> {
        let mu = mu.into_tracked();
        Self::validate(&mu, &self.std)?;
        self.mu = mu;
        Ok(())
    }

    /// Replace the standard deviation; on error the distribution is unchanged.
    pub fn set_std(&mut self, std: impl IntoTracked) -> Result<(), TensorError> {
        let std = std.into_tracked();
        Self::validate(&self.mu, &std)?;
        self.std = std;
        Ok(())
    }

    /// Variance `std²`.
    pub fn var(&self) -> Result<TrackedTensor, TensorError> {
        square(&self.std)
    }

    pub(crate) fn conditioning(&self) -> &Conditioning {
        &self.conditioning
    }

    /// Draw `mu + std · eps` with `eps ~ N(0, 1)`.
    ///
    /// The sample is differentiable with respect to both parameters.
    pub fn forward<R: Rng>(&self, rng: &mut R) -> Result<TrackedTensor, TensorError> {
        let shape = broadcast_shape(self.mu.shape(), self.std.shape())?;
        let eps = DenseTensor::<f64>::randn_with_rng(&shape, rng);
        add(&self.mu, multiply(&self.std, eps)?)
    }

    /// Elementwise log density.
    pub fn log_pdf(&self, x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
        let z = divide(subtract(x, &self.mu)?, &self.std)?;
        let quad = multiply(-0.5, square(z)?)?;
        subtract(subtract(quad, log(&self.std)?)?, 0.5 * (2.0 * PI).ln())
    }

    /// Elementwise density.
    pub fn pdf(&self, x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
        exp(self.log_pdf(x)?)
    }

    /// `KL(self ‖ p)` summed over all elements.
    pub fn kl_qp(&self, p: &Gaussian) -> Result<TrackedTensor, TensorError> {
        let log_ratio = subtract(log(&p.std)?, log(&self.std)?)?;
        let mean_gap = square(subtract(&self.mu, &p.mu)?)?;
        let spread = divide(add(self.var()?, mean_gap)?, multiply(2.0, p.var()?)?)?;
        sum(subtract(add(log_ratio, spread)?, 0.5)?)
    }
}
