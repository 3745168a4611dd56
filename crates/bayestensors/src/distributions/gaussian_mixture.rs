//! Mixture of univariate Gaussians along one axis.

use std::f64::consts::PI;

use rand::Rng;

use super::{
    Conditioning, NORMALIZATION_ATOL, NORMALIZATION_RTOL, RandomVariable, check_positive,
};
use crate::autodiff::ops::{divide, exp, log, multiply, square, subtract, sum_axis};
use crate::autodiff::{IntoTracked, Operation, TrackedTensor};
use crate::error::TensorError;
use crate::operations;
use crate::random::{RandomNormal, sample_categorical};
use crate::strides::{cartesian_to_linear, linear_to_cartesian, normalize_axis, shape_len};
use crate::tensor::DenseTensor;

/// `p(x) = Σ_k coef_k · N(x | mu_k, std_k²)`, with components laid out
/// along `axis` of the equally shaped `coef`, `mu` and `std`.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::distributions::GaussianMixture;
///
/// let coef = DenseTensor::from_vec(vec![0.25, 0.75], &[2]).unwrap();
/// let mu = DenseTensor::from_vec(vec![-1.0, 1.0], &[2]).unwrap();
/// let std = DenseTensor::ones(&[2]);
/// let gm = GaussianMixture::new(coef, mu, std).unwrap();
/// assert_eq!(gm.n_component(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    coef: TrackedTensor,
    mu: TrackedTensor,
    std: TrackedTensor,
    axis: isize,
    conditioning: Conditioning,
}

impl GaussianMixture {
    /// Create a mixture whose components lie along the last axis.
    ///
    /// # Errors
    ///
    /// Returns a shape error if the three parameters differ in shape or are
    /// rank 0, and `TensorError::InvalidParameter` if a coefficient is
    /// negative, the coefficients do not sum to one along the axis, or a
    /// `std` is not positive.
    pub fn new(
        coef: impl IntoTracked,
        mu: impl IntoTracked,
        std: impl IntoTracked,
    ) -> Result<Self, TensorError> {
        let (coef, mu, std) = (coef.into_tracked(), mu.into_tracked(), std.into_tracked());
        Self::validate(&coef, &mu, &std, -1)?;
        Ok(Self {
            coef,
            mu,
            std,
            axis: -1,
            conditioning: Conditioning::default(),
        })
    }

    /// Use `axis` as the component axis.
    ///
    /// # Errors
    ///
    /// Same conditions as [`GaussianMixture::new`], checked for the new axis.
    pub fn with_axis(mut self, axis: isize) -> Result<Self, TensorError> {
        Self::validate(&self.coef, &self.mu, &self.std, axis)?;
        self.axis = axis;
        Ok(self)
    }

    fn validate(
        coef: &TrackedTensor,
        mu: &TrackedTensor,
        std: &TrackedTensor,
        axis: isize,
    ) -> Result<(), TensorError> {
        for other in [mu, std] {
            if other.shape() != coef.shape() {
                return Err(TensorError::IncompatibleShapes {
                    operation: "gaussian mixture",
                    lhs: coef.shape().to_vec(),
                    rhs: other.shape().to_vec(),
                });
            }
        }
        if coef.ndim() == 0 {
            return Err(TensorError::RankMismatch {
                expected: 1,
                actual: 0,
            });
        }
        normalize_axis(axis, coef.ndim())?;
        if coef.value().data().iter().any(|&c| c < 0.0) {
            return Err(TensorError::invalid_parameter(
                "coef",
                "mixing coefficients must be non-negative",
            ));
        }
        let totals = operations::sum_axis(coef.value(), axis, false)?;
        let tol = NORMALIZATION_ATOL + NORMALIZATION_RTOL;
        if let Some(s) = totals.data().iter().find(|&&s| (s - 1.0).abs() > tol) {
            return Err(TensorError::invalid_parameter(
                "coef",
                format!("mixing coefficients must sum to 1 along axis {axis}, got {s}"),
            ));
        }
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

    /// Mixing coefficients.
    pub fn coef(&self) -> &TrackedTensor {
        &self.coef
    }

    /// Component means.
    pub fn mu(&self) -> &TrackedTensor {
        &self.mu
    }

    /// Component standard deviations.
    pub fn std(&self) -> &TrackedTensor {
        &self.std
    }

    /// Component axis as given.
    pub fn axis(&self) -> isize {
        self.axis
    }

    /// Number of mixture components.
    pub fn n_component(&self) -> usize {
        let axis = normalize_axis(self.axis, self.coef.ndim())
            .expect("n_component: axis validated on construction");
        self.coef.shape()[axis]
    }

    /// Replace the coefficients; on error the mixture is unchanged.
    pub fn set_coef(&mut self, coef: impl IntoTracked) -> Result<(), TensorError> {
        let coef = coef.into_tracked();
        Self::validate(&coef, &self.mu, &self.std, self.axis)?;
        self.coef = coef;
        Ok(())
    }

    /// Replace the means; on error the mixture is unchanged.
    pub fn set_mu(&mut self, mu: impl IntoTracked) -> Result<(), TensorError> {
        let mu = mu.into_tracked();
        Self::validate(&self.coef, &mu, &self.std, self.axis)?;
        self.mu = mu;
        Ok(())
    }

    /// Replace the standard deviations; on error the mixture is unchanged.
    pub fn set_std(&mut self, std: impl IntoTracked) -> Result<(), TensorError> {
        let std = std.into_tracked();
        Self::validate(&self.coef, &self.mu, &std, self.axis)?;
        self.std = std;
        Ok(())
    }

    pub(crate) fn conditioning(&self) -> &Conditioning {
        &self.conditioning
    }

    /// Draw one sample per position: pick a component from `coef`, then
    /// draw from that component's Gaussian.
    ///
    /// The result drops the component axis. It is not differentiable:
    /// a backward pass through it returns `TensorError::Unsupported`.
    pub fn forward<R: Rng>(&self, rng: &mut R) -> Result<TrackedTensor, TensorError> {
        let axis = normalize_axis(self.axis, self.coef.ndim())?;
        let (n_component, out_shape) = self.coef.value().reduced_shape(self.axis, false)?;
        let strides = self.coef.value().strides().to_vec();
        let (coef, mu, std) = (
            self.coef.value().data(),
            self.mu.value().data(),
            self.std.value().data(),
        );

        let mut data = Vec::with_capacity(shape_len(&out_shape));
        for linear in 0..shape_len(&out_shape) {
            let mut ix = linear_to_cartesian(linear, &out_shape);
            ix.insert(axis, 0);
            let offsets: Vec<usize> = (0..n_component)
                .map(|k| {
                    ix[axis] = k;
                    cartesian_to_linear(&ix, &strides)
                })
                .collect();
            let weights: Vec<f64> = offsets.iter().map(|&o| coef[o]).collect();
            let chosen = offsets[sample_categorical("coef", &weights, &mut *rng)?];
            data.push(mu[chosen] + std[chosen] * f64::sample_normal(&mut *rng));
        }
        let sample = DenseTensor::from_vec(data, &out_shape)?;

        let inputs = [&self.coef, &self.mu, &self.std]
            .into_iter()
            .map(|t| t.graph_input())
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        Ok(TrackedTensor::from_operation(
            sample,
            Operation::MixtureSample { inputs },
        ))
    }

    /// Component axis counted from the end, so it stays valid when `x`
    /// broadcasts extra leading axes.
    fn trailing_axis(&self) -> Result<isize, TensorError> {
        let ndim = self.coef.ndim();
        Ok(normalize_axis(self.axis, ndim)? as isize - ndim as isize)
    }

    /// Density, summed over the component axis.
    ///
    /// `x` is broadcast against the parameters.
    pub fn pdf(&self, x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
        let z = divide(subtract(x, &self.mu)?, &self.std)?;
        let kernel = exp(multiply(-0.5, square(z)?)?)?;
        let gauss = divide(divide(kernel, (2.0 * PI).sqrt())?, &self.std)?;
        sum_axis(multiply(&self.coef, gauss)?, self.trailing_axis()?, false)
    }

    /// Log density, `log(pdf(x))`.
    pub fn log_pdf(&self, x: impl IntoTracked) -> Result<TrackedTensor, TensorError> {
        log(self.pdf(x)?)
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

    fn vec1(v: &[f64]) -> DenseTensor<f64> {
        DenseTensor::from_vec(v.to_vec(), &[v.len()]).unwrap()
    }

    #[test]
    fn test_coef_must_sum_to_one() {
        let err = GaussianMixture::new(vec1(&[0.5, 0.4]), vec1(&[0.0, 1.0]), vec1(&[1.0, 1.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);

        // Within tolerance
        assert!(
            GaussianMixture::new(vec1(&[0.5, 0.5 + 1e-6]), vec1(&[0.0, 1.0]), vec1(&[1.0, 1.0]))
                .is_ok()
        );
    }

    #[test]
    fn test_negative_coef_and_std() {
        assert!(
            GaussianMixture::new(vec1(&[1.5, -0.5]), vec1(&[0.0, 1.0]), vec1(&[1.0, 1.0]))
                .is_err()
        );
        assert!(
            GaussianMixture::new(vec1(&[0.5, 0.5]), vec1(&[0.0, 1.0]), vec1(&[1.0, 0.0]))
                .is_err()
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let err = GaussianMixture::new(vec1(&[0.5, 0.5]), vec1(&[0.0, 1.0, 2.0]), vec1(&[1.0, 1.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn test_with_axis_validates() {
        // Columns sum to one (axis 0), rows do not.
        let coef = DenseTensor::from_vec(vec![0.5, 0.5, 0.25, 0.75], &[2, 2]).unwrap();
        let mu = DenseTensor::zeros(&[2, 2]);
        let std = DenseTensor::ones(&[2, 2]);
        assert!(GaussianMixture::new(coef.clone(), mu.clone(), std.clone()).is_err());

        let mut gm_axis0 = GaussianMixture::new(
            DenseTensor::from_vec(vec![0.5, 0.5, 0.5, 0.5], &[2, 2]).unwrap(),
            mu,
            std,
        )
        .unwrap()
        .with_axis(0)
        .unwrap();
        assert!(gm_axis0.set_coef(coef).is_ok());
        assert_eq!(gm_axis0.axis(), 0);
    }

    #[test]
    fn test_pdf_matches_weighted_sum() {
        let gm =
            GaussianMixture::new(vec1(&[0.3, 0.7]), vec1(&[0.0, 2.0]), vec1(&[1.0, 0.5])).unwrap();
        let x = 1.0;
        let n = |m: f64, s: f64| (-0.5 * ((x - m) / s).powi(2)).exp() / ((2.0 * PI).sqrt() * s);
        let expected = 0.3 * n(0.0, 1.0) + 0.7 * n(2.0, 0.5);
        assert_relative_eq!(gm.pdf(x).unwrap().item().unwrap(), expected, epsilon = 1e-12);
        assert_relative_eq!(
            gm.log_pdf(x).unwrap().item().unwrap(),
            expected.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_pdf_batch() {
        let gm =
            GaussianMixture::new(vec1(&[0.5, 0.5]), vec1(&[0.0, 1.0]), vec1(&[1.0, 1.0])).unwrap();
        let x = DenseTensor::from_vec(vec![0.0, 1.0, 2.0], &[3, 1]).unwrap();
        let p = gm.pdf(x).unwrap();
        assert_eq!(p.shape(), &[3]);
        assert_relative_eq!(p.value().data()[0], p.value().data()[1], epsilon = 1e-12);
    }

    #[test]
    fn test_forward_drops_component_axis() {
        let coef = DenseTensor::from_vec(vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0], &[2, 3]).unwrap();
        // Row 0 picks component 0, row 1 picks component 1 (column-major data).
        let mu = DenseTensor::from_fn(&[2, 3], |ix| 10.0 * ix[1] as f64);
        let std = DenseTensor::full(&[2, 3], 1e-9);
        let gm = GaussianMixture::new(coef, mu, std).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let x = gm.forward(&mut rng).unwrap();
        assert_eq!(x.shape(), &[2]);
        assert_relative_eq!(x.value().data()[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(x.value().data()[1], 10.0, epsilon = 1e-6);
        assert!(!x.requires_grad());
    }

    #[test]
    fn test_backward_unsupported() {
        clear_graph();
        let mu = Parameter::new(vec1(&[0.0, 1.0]));
        let gm = GaussianMixture::new(vec1(&[0.5, 0.5]), &mu, vec1(&[1.0, 1.0])).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let x = gm.forward(&mut rng).unwrap();
        assert!(x.requires_grad());
        let err = x.backward().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(mu.grad().is_none());
    }
}
