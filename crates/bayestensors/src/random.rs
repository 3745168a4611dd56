//! Random tensor construction and discrete sampling.
//!
//! Every sampler takes an explicit `&mut impl Rng`, so seeded generators
//! such as `StdRng::seed_from_u64` give reproducible draws.

use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use rand::distr::{Distribution, StandardUniform};
use rand_distr::StandardNormal;

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Trait for types that can be randomly sampled from a uniform distribution.
pub trait RandomUniform: Scalar {
    /// Sample a random value from the uniform distribution [0, 1).
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self;
}

impl RandomUniform for f64 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }
}

impl RandomUniform for f32 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }
}

/// Trait for types that can be randomly sampled from a normal distribution.
pub trait RandomNormal: Scalar {
    /// Sample a random value from the standard normal distribution.
    fn sample_normal<R: Rng>(rng: &mut R) -> Self;
}

impl RandomNormal for f64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl RandomNormal for f32 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl<ElT: RandomUniform> DenseTensor<ElT> {
    /// Create a tensor with uniform random values in [0, 1).
    ///
    /// # Example
    ///
    /// ```
    /// use bayestensors::DenseTensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t1: DenseTensor<f64> = DenseTensor::random_with_rng(&[2, 3], &mut rng);
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t2: DenseTensor<f64> = DenseTensor::random_with_rng(&[2, 3], &mut rng);
    ///
    /// assert_eq!(t1.data(), t2.data());
    /// ```
    pub fn random_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        Self::from_fn(shape, |_| ElT::sample_uniform(&mut *rng))
    }
}

impl<ElT: RandomNormal> DenseTensor<ElT> {
    /// Create a tensor with standard normal random values.
    ///
    /// # Example
    ///
    /// ```
    /// use bayestensors::DenseTensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t: DenseTensor<f64> = DenseTensor::randn_with_rng(&[2, 3], &mut rng);
    /// assert_eq!(t.shape(), &[2, 3]);
    /// ```
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        Self::from_fn(shape, |_| ElT::sample_normal(&mut *rng))
    }
}

/// Draw an index from unnormalized non-negative weights.
///
/// # Errors
///
/// Returns `TensorError::InvalidParameter` naming `name` if the weights are
/// empty, all zero, negative or not finite.
pub(crate) fn sample_categorical<R: Rng>(
    name: &'static str,
    weights: &[f64],
    rng: &mut R,
) -> Result<usize, TensorError> {
    let dist = WeightedIndex::new(weights).map_err(|e| {
        TensorError::invalid_parameter(name, format!("invalid categorical weights {weights:?}: {e}"))
    })?;
    Ok(dist.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let t: DenseTensor<f64> = DenseTensor::random_with_rng(&[2, 3], &mut rng);
        assert_eq!(t.len(), 6);
        for &v in t.data() {
            assert!((0.0..1.0).contains(&v), "value {} not in [0, 1)", v);
        }
    }

    #[test]
    fn test_randn_moments() {
        let mut rng = StdRng::seed_from_u64(54321);
        let t: DenseTensor<f64> = DenseTensor::randn_with_rng(&[2000], &mut rng);
        let mean = t.data().iter().sum::<f64>() / 2000.0;
        assert!(mean.abs() < 0.1, "mean {} too far from 0", mean);
        let var = t.data().iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 2000.0;
        assert!(var > 0.8 && var < 1.2, "variance {} too far from 1", var);
    }

    #[test]
    fn test_randn_scalar_tensor() {
        let mut rng = StdRng::seed_from_u64(1);
        let t: DenseTensor<f64> = DenseTensor::randn_with_rng(&[], &mut rng);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_categorical_skips_zero_weight() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let k = sample_categorical("coef", &[0.5, 0.0, 0.5], &mut rng).unwrap();
            assert_ne!(k, 1);
        }
    }

    #[test]
    fn test_categorical_frequencies() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut counts = [0usize; 2];
        for _ in 0..4000 {
            counts[sample_categorical("coef", &[0.25, 0.75], &mut rng).unwrap()] += 1;
        }
        let frac = counts[1] as f64 / 4000.0;
        assert!((frac - 0.75).abs() < 0.05, "fraction {} too far from 0.75", frac);
    }

    #[test]
    fn test_categorical_rejects_invalid_weights() {
        let mut rng = StdRng::seed_from_u64(5);
        for weights in [&[][..], &[0.0, 0.0][..], &[0.5, -0.5][..], &[f64::NAN, 1.0][..]] {
            let err = sample_categorical("coef", weights, &mut rng).unwrap_err();
            assert!(matches!(err, TensorError::InvalidParameter { name: "coef", .. }));
        }
    }
}
