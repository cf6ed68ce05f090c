//! Pseudo-random number generator wrapper for Monte Carlo simulations.
//!
//! This module provides [`LossRng`], a seeded PRNG wrapper that offers
//! reproducible uniform and normal draws with batch operations.

use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Seeded random number generator for loss simulation.
///
/// Wraps [`StdRng`] and remembers its seed. Use [`LossRng::for_trial`] to
/// obtain an independent stream per Monte Carlo trial.
///
/// # Examples
///
/// ```rust
/// use loss_engine::rng::LossRng;
///
/// let mut rng1 = LossRng::from_seed(42);
/// let mut rng2 = LossRng::from_seed(42);
///
/// assert_eq!(rng1.gen_uniform(), rng2.gen_uniform());
/// assert_eq!(rng1.seed(), 42);
/// ```
#[derive(Debug, Clone)]
pub struct LossRng {
    inner: StdRng,
    seed: u64,
}

impl LossRng {
    /// Creates a generator from a 64-bit seed.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates the generator for one trial of a simulation seeded with `seed`.
    ///
    /// The stream seed is a SplitMix64 mix of the base seed and the trial
    /// index, so neighbouring trials get unrelated streams.
    #[inline]
    pub fn for_trial(seed: u64, trial: u64) -> Self {
        Self::from_seed(split_mix64(seed ^ split_mix64(trial)))
    }

    /// Seed this generator was created with.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in `[0, 1)`.
    #[inline]
    pub fn gen_uniform(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Uniform draw strictly inside `(0, 1)`; safe to take logarithms of.
    #[inline]
    pub fn gen_uniform_open(&mut self) -> f64 {
        Open01.sample(&mut self.inner)
    }

    /// Standard normal draw (Ziggurat via `rand_distr`).
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Fills `buffer` with uniform draws in `[0, 1)`.
    #[inline]
    pub fn fill_uniform(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = self.inner.gen();
        }
    }

    /// Fills `buffer` with standard normal draws.
    #[inline]
    pub fn fill_normal(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = StandardNormal.sample(&mut self.inner);
        }
    }
}

#[inline]
fn split_mix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // Seeding
    // ========================================

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = LossRng::from_seed(7);
        let mut b = LossRng::from_seed(7);
        for _ in 0..100 {
            assert_eq!(a.gen_uniform(), b.gen_uniform());
            assert_eq!(a.gen_normal(), b.gen_normal());
        }
    }

    #[test]
    fn test_trial_streams_are_distinct() {
        let first: Vec<f64> = (0..8)
            .map(|t| LossRng::for_trial(99, t).gen_uniform())
            .collect();
        for i in 0..first.len() {
            for j in (i + 1)..first.len() {
                assert_ne!(first[i], first[j]);
            }
        }
    }

    #[test]
    fn test_trial_stream_depends_on_base_seed() {
        let a = LossRng::for_trial(1, 5).gen_uniform();
        let b = LossRng::for_trial(2, 5).gen_uniform();
        assert_ne!(a, b);
    }

    // ========================================
    // Distributions
    // ========================================

    #[test]
    fn test_uniform_range_and_mean() {
        let mut rng = LossRng::from_seed(2024);
        let mut buffer = vec![0.0; 100_000];
        rng.fill_uniform(&mut buffer);
        assert!(buffer.iter().all(|u| (0.0..1.0).contains(u)));
        let mean = buffer.iter().sum::<f64>() / buffer.len() as f64;
        assert_relative_eq!(mean, 0.5, epsilon = 0.01);
    }

    #[test]
    fn test_open_uniform_excludes_zero() {
        let mut rng = LossRng::from_seed(3);
        for _ in 0..10_000 {
            let u = rng.gen_uniform_open();
            assert!(u > 0.0 && u < 1.0);
        }
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = LossRng::from_seed(11);
        let mut buffer = vec![0.0; 100_000];
        rng.fill_normal(&mut buffer);
        let n = buffer.len() as f64;
        let mean = buffer.iter().sum::<f64>() / n;
        let var = buffer.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / (n - 1.0);
        assert_relative_eq!(mean, 0.0, epsilon = 0.02);
        assert_relative_eq!(var, 1.0, epsilon = 0.02);
    }
}
