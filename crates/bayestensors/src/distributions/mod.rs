//! Parametric random variables built on the differentiable tensor ops.
//!
//! Parameters are [`TrackedTensor`]s, so densities, samples and KL
//! divergences are graph nodes: passing [`Parameter`](crate::autodiff::Parameter)s
//! as parameters makes them trainable by gradient descent.
//!
//! ```text
//! Gaussian              mu, std            elementwise, reparameterized
//! GaussianMixture       coef, mu, std      components along `axis`
//! MultivariateGaussian  mu (D,), cov (D,D) reparameterized via Cholesky
//! ```
//!
//! Every parameter is validated on construction and on each setter call; a
//! failed setter leaves the distribution unchanged.

mod gaussian;
mod gaussian_mixture;
mod multivariate_gaussian;

pub use gaussian::Gaussian;
pub use gaussian_mixture::GaussianMixture;
pub use multivariate_gaussian::MultivariateGaussian;

use rand::Rng;

use crate::autodiff::{IntoTracked, TrackedTensor};
use crate::error::TensorError;
use crate::tensor::DenseTensor;

/// Absolute tolerance on the sum of mixing coefficients.
pub const NORMALIZATION_ATOL: f64 = 1e-8;

/// Relative tolerance on the sum of mixing coefficients.
pub const NORMALIZATION_RTOL: f64 = 1e-5;

/// Observed data and prior attached to a distribution.
#[derive(Debug, Clone, Default)]
pub(crate) struct Conditioning {
    pub(crate) data: Option<TrackedTensor>,
    pub(crate) prior: Option<Box<RandomVariable>>,
}

/// Require every element of `value` to be strictly positive.
pub(crate) fn check_positive(name: &'static str, value: &DenseTensor<f64>) -> Result<(), TensorError> {
    match value.data().iter().find(|&&v| v.is_nan() || v <= 0.0) {
        Some(v) => Err(TensorError::invalid_parameter(
            name,
            format!("must be positive, got {v}"),
        )),
        None => Ok(()),
    }
}

/// Any of the supported distribution families.
#[derive(Debug, Clone)]
pub enum RandomVariable {
    Gaussian(Gaussian),
    GaussianMixture(GaussianMixture),
    MultivariateGaussian(MultivariateGaussian),
}

impl RandomVariable {
    /// Family name.
    pub fn name(&self) -> &'static str {
        match self {
            RandomVariable::Gaussian(_) => "Gaussian",
            RandomVariable::GaussianMixture(_) => "GaussianMixture",
            RandomVariable::MultivariateGaussian(_) => "MultivariateGaussian",
        }
    }

    /// Draw a sample.
    pub fn forward<R: Rng>(&self, rng: &mut R) -> Result<TrackedTensor, TensorError> {
        match self {
            RandomVariable::Gaussian(d) => d.forward(rng),
            RandomVariable::GaussianMixture(d) => d.forward(rng),
            RandomVariable::MultivariateGaussian(d) => d.forward(rng),
        }
    }

    /// Density at `x`.
    pub fn pdf(&self, x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
        match self {
            RandomVariable::Gaussian(d) => d.pdf(x),
            RandomVariable::GaussianMixture(d) => d.pdf(x),
            RandomVariable::MultivariateGaussian(d) => d.pdf(x),
        }
    }

    /// Log density at `x`.
    pub fn log_pdf(&self, x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
        match self {
            RandomVariable::Gaussian(d) => d.log_pdf(x),
            RandomVariable::GaussianMixture(d) => d.log_pdf(x),
            RandomVariable::MultivariateGaussian(d) => d.log_pdf(x),
        }
    }

    /// `KL(self ‖ p)`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::Unsupported` unless both sides are Gaussian or
    /// both are multivariate Gaussian.
    pub fn kl_qp(&self, p: &RandomVariable) -> Result<TrackedTensor, TensorError> {
        match (self, p) {
            (RandomVariable::Gaussian(q), RandomVariable::Gaussian(p)) => q.kl_qp(p),
            (RandomVariable::MultivariateGaussian(q), RandomVariable::MultivariateGaussian(p)) => {
                q.kl_qp(p)
            }
            _ => Err(TensorError::unsupported(format!(
                "KL divergence from {} to {}",
                self.name(),
                p.name()
            ))),
        }
    }

    /// Named parameter tensors.
    pub fn parameters(&self) -> Vec<(&'static str, &TrackedTensor)> {
        match self {
            RandomVariable::Gaussian(d) => vec![("mu", d.mu()), ("std", d.std())],
            RandomVariable::GaussianMixture(d) => {
                vec![("coef", d.coef()), ("mu", d.mu()), ("std", d.std())]
            }
            RandomVariable::MultivariateGaussian(d) => vec![("mu", d.mu()), ("cov", d.cov())],
        }
    }

    fn conditioning(&self) -> &Conditioning {
        match self {
            RandomVariable::Gaussian(d) => d.conditioning(),
            RandomVariable::GaussianMixture(d) => d.conditioning(),
            RandomVariable::MultivariateGaussian(d) => d.conditioning(),
        }
    }

    /// Observed realization, if attached.
    pub fn data(&self) -> Option<&TrackedTensor> {
        self.conditioning().data.as_ref()
    }

    /// Prior distribution, if attached.
    pub fn prior(&self) -> Option<&RandomVariable> {
        self.conditioning().prior.as_deref()
    }

    /// Log density of the attached data.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidOperation` when no data is attached.
    pub fn observed_log_pdf(&self) -> Result<TrackedTensor, TensorError> {
        let data = self.data().ok_or_else(|| {
            TensorError::InvalidOperation(format!("{} has no observed data", self.name()))
        })?;
        self.log_pdf(data)
    }

    /// `KL(self ‖ prior)`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidOperation` when no prior is attached, and
    /// the errors of [`RandomVariable::kl_qp`].
    pub fn kl_divergence(&self) -> Result<TrackedTensor, TensorError> {
        let prior = self.prior().ok_or_else(|| {
            TensorError::InvalidOperation(format!("{} has no prior", self.name()))
        })?;
        self.kl_qp(prior)
    }
}

impl From<Gaussian> for RandomVariable {
    fn from(d: Gaussian) -> Self {
        RandomVariable::Gaussian(d)
    }
}

impl From<GaussianMixture> for RandomVariable {
    fn from(d: GaussianMixture) -> Self {
        RandomVariable::GaussianMixture(d)
    }
}

impl From<MultivariateGaussian> for RandomVariable {
    fn from(d: MultivariateGaussian) -> Self {
        RandomVariable::MultivariateGaussian(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_check_positive_rejects_nan_and_zero() {
        assert!(check_positive("std", &DenseTensor::ones(&[2])).is_ok());
        assert!(check_positive("std", &DenseTensor::zeros(&[2])).is_err());
        assert!(check_positive("std", &DenseTensor::full(&[1], f64::NAN)).is_err());
    }

    #[test]
    fn test_cross_family_kl_unsupported() {
        let g: RandomVariable = Gaussian::new(0.0, 1.0).unwrap().into();
        let mvg: RandomVariable =
            MultivariateGaussian::new(DenseTensor::zeros(&[2]), DenseTensor::identity(2))
                .unwrap()
                .into();
        assert_eq!(g.kl_qp(&mvg).unwrap_err().kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_observed_log_pdf_and_prior() {
        let prior = Gaussian::new(0.0, 1.0).unwrap();
        let g: RandomVariable = Gaussian::new(0.0, 1.0)
            .unwrap()
            .with_data(0.0)
            .with_prior(prior)
            .into();
        assert!(g.observed_log_pdf().is_ok());
        assert_eq!(g.kl_divergence().unwrap().item().unwrap(), 0.0);
        assert_eq!(g.parameters().len(), 2);

        let bare: RandomVariable = Gaussian::new(0.0, 1.0).unwrap().into();
        assert_eq!(
            bare.observed_log_pdf().unwrap_err().kind(),
            ErrorKind::InvalidOperation
        );
        assert!(bare.kl_divergence().is_err());
    }
}
