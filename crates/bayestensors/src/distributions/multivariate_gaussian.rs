//! Multivariate Gaussian with full covariance.

use std::f64::consts::PI;

use rand::Rng;

use super::{Conditioning, RandomVariable};
use crate::autodiff::ops::{
    add, cholesky, exp, logdet, multiply, reshape, solve, subtract, sum, sum_axis, trace,
    transpose,
};
use crate::autodiff::{IntoTracked, Operation, TrackedTensor};
use crate::error::TensorError;
use crate::linalg;
use crate::operations::apply_binary;
use crate::tensor::DenseTensor;

/// `N(x | mu, cov)` over vectors of dimension `D`.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::distributions::MultivariateGaussian;
///
/// let mvg = MultivariateGaussian::new(DenseTensor::zeros(&[2]), DenseTensor::identity(2)).unwrap();
/// assert_eq!(mvg.dim(), 2);
///
/// let not_pd = DenseTensor::from_vec(vec![1.0, 2.0, 2.0, 1.0], &[2, 2]).unwrap();
/// assert!(MultivariateGaussian::new(DenseTensor::zeros(&[2]), not_pd).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MultivariateGaussian {
    mu: TrackedTensor,
    cov: TrackedTensor,
    conditioning: Conditioning,
}

impl MultivariateGaussian {
    /// Create a multivariate Gaussian.
    ///
    /// # Errors
    ///
    /// Returns a shape error unless `mu` is `(D,)` and `cov` is `(D, D)`, and
    /// `TensorError::NotPositiveDefinite` if `cov` has no Cholesky factor.
    pub fn new(mu: impl IntoTracked, cov: impl IntoTracked) -> Result<Self, TensorError> {
        let (mu, cov) = (mu.into_tracked(), cov.into_tracked());
        Self::validate(&mu, &cov)?;
        Ok(Self {
            mu,
            cov,
            conditioning: Conditioning::default(),
        })
    }

    fn validate(mu: &TrackedTensor, cov: &TrackedTensor) -> Result<(), TensorError> {
        if mu.ndim() != 1 {
            return Err(TensorError::RankMismatch {
                expected: 1,
                actual: mu.ndim(),
            });
        }
        if cov.ndim() != 2 {
            return Err(TensorError::RankMismatch {
                expected: 2,
                actual: cov.ndim(),
            });
        }
        let d = mu.shape()[0];
        if cov.shape()[0] != d || cov.shape()[1] != d {
            return Err(TensorError::IncompatibleShapes {
                operation: "multivariate gaussian",
                lhs: mu.shape().to_vec(),
                rhs: cov.shape().to_vec(),
            });
        }
        linalg::cholesky(cov.value())?;
        Ok(())
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

    /// Mean vector.
    pub fn mu(&self) -> &TrackedTensor {
        &self.mu
    }

    /// Covariance matrix.
    pub fn cov(&self) -> &TrackedTensor {
        &self.cov
    }

    /// Dimensionality `D`.
    pub fn dim(&self) -> usize {
        self.mu.shape()[0]
    }

    /// Replace the mean; on error the distribution is unchanged.
    pub fn set_mu(&mut self, mu: impl IntoTracked) -> Result<(), TensorError> {
        let mu = mu.into_tracked();
        Self::validate(&mu, &self.cov)?;
        self.mu = mu;
        Ok(())
    }

    /// Replace the covariance; on error the distribution is unchanged.
    pub fn set_cov(&mut self, cov: impl IntoTracked) -> Result<(), TensorError> {
        let cov = cov.into_tracked();
        Self::validate(&self.mu, &cov)?;
        self.cov = cov;
        Ok(())
    }

    pub(crate) fn conditioning(&self) -> &Conditioning {
        &self.conditioning
    }

    /// Draw `mu + L eps` where `L` is the Cholesky factor of `cov` and
    /// `eps ~ N(0, I)`.
    ///
    /// The gradient reaches `mu` directly and `cov` through the Cholesky
    /// factor.
    pub fn forward<R: Rng>(&self, rng: &mut R) -> Result<TrackedTensor, TensorError> {
        let d = self.dim();
        let l = cholesky(&self.cov)?;
        let eps = DenseTensor::<f64>::randn_with_rng(&[d], rng);
        let shift = linalg::matmul(l.value(), &eps.reshape(&[d, 1])?)?;
        let value = apply_binary(self.mu.value(), &shift.reshape(&[d])?, |m, s| m + s)?;
        let op = Operation::ReparameterizedSample {
            mu: self.mu.graph_input()?,
            scale_tril: l.graph_input()?,
            eps,
        };
        Ok(TrackedTensor::from_operation(value, op))
    }

    /// Bring `x` to `(N, D)`; returns whether it was a single sample.
    fn as_batch(&self, x: TrackedTensor) -> Result<(TrackedTensor, bool), TensorError> {
        let d = self.dim();
        let last = x.shape().last().copied();
        match (x.ndim(), last) {
            (1 | 2, Some(n)) if n == d => {}
            (1 | 2, _) => {
                return Err(TensorError::IncompatibleShapes {
                    operation: "multivariate gaussian density",
                    lhs: self.mu.shape().to_vec(),
                    rhs: x.shape().to_vec(),
                });
            }
            (ndim, _) => {
                return Err(TensorError::RankMismatch {
                    expected: 2,
                    actual: ndim,
                });
            }
        }
        if x.ndim() == 1 {
            Ok((reshape(x, &[1, d])?, true))
        } else {
            Ok((x, false))
        }
    }

    /// Log density of each row of `x`.
    ///
    /// `x` is `(N, D)`, giving shape `(N,)`, or a single `(D,)` sample,
    /// giving a rank-0 result.
    pub fn log_pdf(&self, x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
        let (x, squeeze) = self.as_batch(x.into_tracked())?;
        let dev = transpose(subtract(x, &self.mu)?)?;
        let maha = sum_axis(multiply(solve(&self.cov, &dev)?, &dev)?, 0, false)?;
        let norm = 0.5 * self.dim() as f64 * (2.0 * PI).ln();
        let half_logdet = multiply(0.5, logdet(&self.cov)?)?;
        let logp = subtract(subtract(multiply(-0.5, maha)?, norm)?, half_logdet)?;
        if squeeze { sum(logp) } else { Ok(logp) }
    }

    /// Density of each row of `x`; same shapes as [`Self::log_pdf`].
    pub fn pdf(&self, x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
        exp(self.log_pdf(x)?)
    }

    /// Closed-form `KL(self ‖ p)`.
    ///
    /// `0.5 · (log|Σp| − log|Σq| + tr(Σp⁻¹Σq) + dᵀΣq⁻¹d − D)` with
    /// `d = μp − μq`. The quadratic term is weighted by the covariance of
    /// `self`.
    pub fn kl_qp(&self, p: &MultivariateGaussian) -> Result<TrackedTensor, TensorError> {
        if p.dim() != self.dim() {
            return Err(TensorError::IncompatibleShapes {
                operation: "kl divergence",
                lhs: self.mu.shape().to_vec(),
                rhs: p.mu.shape().to_vec(),
            });
        }
        let d = subtract(&p.mu, &self.mu)?;
        let quad = sum(multiply(solve(&self.cov, &d)?, &d)?)?;
        let logdet_gap = subtract(logdet(&p.cov)?, logdet(&self.cov)?)?;
        let tr = trace(solve(&p.cov, &self.cov)?)?;
        let total = subtract(add(add(logdet_gap, tr)?, quad)?, self.dim() as f64)?;
        multiply(0.5, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::{Parameter, clear_graph};
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn cov2() -> DenseTensor<f64> {
        DenseTensor::from_vec(vec![2.0, 0.5, 0.5, 1.0], &[2, 2]).unwrap()
    }

    #[test]
    fn test_constructor_errors() {
        let err = MultivariateGaussian::new(DenseTensor::zeros(&[2, 1]), cov2()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        let err = MultivariateGaussian::new(DenseTensor::zeros(&[3]), cov2()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        let not_pd = DenseTensor::from_vec(vec![1.0, 0.0, 0.0, -1.0], &[2, 2]).unwrap();
        let err = MultivariateGaussian::new(DenseTensor::zeros(&[2]), not_pd).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_set_cov_failure_keeps_state() {
        let mut mvg = MultivariateGaussian::new(DenseTensor::zeros(&[2]), cov2()).unwrap();
        assert!(mvg.set_cov(DenseTensor::<f64>::zeros(&[2, 2])).is_err());
        assert_eq!(mvg.cov().value(), &cov2());
    }

    #[test]
    fn test_log_pdf_identity_cov() {
        let mvg =
            MultivariateGaussian::new(DenseTensor::zeros(&[2]), DenseTensor::identity(2)).unwrap();
        let x = DenseTensor::from_vec(vec![1.0, 0.0], &[2]).unwrap();
        let lp = mvg.log_pdf(&x).unwrap();
        assert_eq!(lp.shape(), &[] as &[usize]);
        assert_relative_eq!(lp.item().unwrap(), -0.5 - (2.0 * PI).ln(), epsilon = 1e-12);

        let batch = DenseTensor::from_vec(vec![1.0, 0.0, 0.0, 0.0], &[2, 2]).unwrap();
        let lp = mvg.log_pdf(batch).unwrap();
        assert_eq!(lp.shape(), &[2]);
        assert_relative_eq!(lp.value().data()[1], -(2.0 * PI).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_density_shape_errors() {
        let mvg = MultivariateGaussian::new(DenseTensor::zeros(&[2]), cov2()).unwrap();
        assert!(mvg.log_pdf(DenseTensor::zeros(&[3])).is_err());
        assert!(mvg.log_pdf(DenseTensor::zeros(&[1, 1, 2])).is_err());
    }

    #[test]
    fn test_kl_identical_is_zero() {
        let q = MultivariateGaussian::new(
            DenseTensor::from_vec(vec![0.5, -0.2], &[2]).unwrap(),
            cov2(),
        )
        .unwrap();
        assert_relative_eq!(q.kl_qp(&q).unwrap().item().unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_kl_closed_form() {
        // q = N(0, 4I), p = N([1, 2], I):
        // 0.5 · (0 − 2 ln 4 + 8 + (1 + 4) / 4 − 2)
        let q = MultivariateGaussian::new(
            DenseTensor::zeros(&[2]),
            DenseTensor::from_vec(vec![4.0, 0.0, 0.0, 4.0], &[2, 2]).unwrap(),
        )
        .unwrap();
        let p = MultivariateGaussian::new(
            DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap(),
            DenseTensor::identity(2),
        )
        .unwrap();
        let expected = 0.5 * (-2.0 * 4.0_f64.ln() + 8.0 + 1.25 - 2.0);
        assert_relative_eq!(q.kl_qp(&p).unwrap().item().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_gradients() {
        clear_graph();
        let mu = Parameter::new(DenseTensor::zeros(&[2]));
        let cov = Parameter::new(cov2());
        let mvg = MultivariateGaussian::new(&mu, &cov).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let x = mvg.forward(&mut rng).unwrap();
        assert_eq!(x.shape(), &[2]);
        x.backward().unwrap();
        assert_eq!(mu.grad().unwrap().data(), &[1.0, 1.0]);
        let g = cov.grad().unwrap();
        assert_eq!(g.shape(), &[2, 2]);
        assert_relative_eq!(*g.get(&[0, 1]).unwrap(), *g.get(&[1, 0]).unwrap(), epsilon = 1e-12);
    }
}
