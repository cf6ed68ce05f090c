//! Frailty generators for joint default dependence.
//!
//! A frailty is a positive random multiplier `W` shared by every loan in a
//! trial. It enters the PD model either as an additive shock `ln W` on the
//! spline (frailty mode) or through an Archimedean copula whose generator is
//! the Laplace transform of `W` (copula mode).
//!
//! ## Available Generators
//!
//! - [`NoFrailty`]: `W = 1`, independent defaults
//! - [`LogNormalFrailty`]: `W = exp(σZ − σ²/2)`, mean one
//! - [`InverseGaussianFrailty`]: `W ~ IG(μ, λ)` with a closed-form Laplace transform
//!
//! ## Example
//!
//! ```rust
//! use loss_engine::frailty::{FrailtyGenerator, InverseGaussianFrailty};
//! use loss_engine::rng::LossRng;
//!
//! let frailty = InverseGaussianFrailty::new(1.0, 10.0).unwrap();
//! let mut rng = LossRng::from_seed(1);
//! let w = frailty.sample(&mut rng);
//! assert!(w > 0.0);
//! ```

mod copula;
mod inverse_gaussian;

pub use copula::ArchimedeanCopula;
pub use inverse_gaussian::InverseGaussianFrailty;

use loss_core::types::ModelError;

use crate::rng::LossRng;

/// Source of a positive per-trial frailty multiplier.
pub trait FrailtyGenerator: Send + Sync {
    /// Draws one frailty realisation.
    fn sample(&self, rng: &mut LossRng) -> f64;
}

/// Laplace transform `L(u) = E[exp(−W·u)]` of a frailty distribution.
pub trait LaplaceTransform: Send + Sync {
    /// Evaluates the transform at `u ≥ 0`.
    fn laplace(&self, u: f64) -> f64;
}

/// Degenerate frailty `W = 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoFrailty;

impl FrailtyGenerator for NoFrailty {
    #[inline]
    fn sample(&self, _rng: &mut LossRng) -> f64 {
        1.0
    }
}

impl LaplaceTransform for NoFrailty {
    #[inline]
    fn laplace(&self, u: f64) -> f64 {
        (-u).exp()
    }
}

/// Mean-one lognormal frailty `W = exp(σZ − σ²/2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormalFrailty {
    sigma: f64,
}

impl LogNormalFrailty {
    /// Creates a lognormal frailty with log-volatility `sigma ≥ 0`.
    pub fn new(sigma: f64) -> Result<Self, ModelError> {
        if !(sigma >= 0.0) || !sigma.is_finite() {
            return Err(ModelError::invalid_parameter(
                "sigma",
                format!("must be finite and non-negative, got {}", sigma),
            ));
        }
        Ok(Self { sigma })
    }

    /// Log-volatility.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl FrailtyGenerator for LogNormalFrailty {
    #[inline]
    fn sample(&self, rng: &mut LossRng) -> f64 {
        (self.sigma * rng.gen_normal() - 0.5 * self.sigma * self.sigma).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_no_frailty_is_one() {
        let mut rng = LossRng::from_seed(0);
        for _ in 0..10 {
            assert_eq!(NoFrailty.sample(&mut rng), 1.0);
        }
        assert_relative_eq!(NoFrailty.laplace(2.0), (-2.0_f64).exp());
    }

    #[test]
    fn test_lognormal_has_unit_mean() {
        let frailty = LogNormalFrailty::new(0.25).unwrap();
        let mut rng = LossRng::from_seed(5);
        let n = 200_000;
        let mean = (0..n).map(|_| frailty.sample(&mut rng)).sum::<f64>() / n as f64;
        assert_relative_eq!(mean, 1.0, epsilon = 0.01);
    }

    #[test]
    fn test_lognormal_rejects_negative_sigma() {
        assert!(LogNormalFrailty::new(-0.1).is_err());
        assert!(LogNormalFrailty::new(f64::NAN).is_err());
        assert!(LogNormalFrailty::new(0.0).is_ok());
    }
}
