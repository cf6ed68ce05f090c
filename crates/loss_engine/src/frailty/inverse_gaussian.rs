//! Inverse Gaussian frailty.

use loss_core::types::ModelError;

use super::{FrailtyGenerator, LaplaceTransform};
use crate::rng::LossRng;

/// Inverse Gaussian frailty `W ~ IG(μ, λ)`.
///
/// Mean `μ`, variance `μ³/λ`. Sampling uses the Michael–Schucany–Haas
/// transformation: square a standard normal, take the smaller root of the
/// IG characteristic equation, and keep it with probability `μ/(μ + x)`,
/// otherwise return `μ²/x`.
///
/// # Examples
///
/// ```rust
/// use loss_engine::frailty::{InverseGaussianFrailty, LaplaceTransform};
///
/// let frailty = InverseGaussianFrailty::new(1.0, 10.0).unwrap();
/// assert_eq!(frailty.laplace(0.0), 1.0);
/// assert!((frailty.variance() - 0.1).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseGaussianFrailty {
    mu: f64,
    lambda: f64,
}

impl InverseGaussianFrailty {
    /// Creates an IG frailty; both parameters must be positive.
    pub fn new(mu: f64, lambda: f64) -> Result<Self, ModelError> {
        if !(mu > 0.0) || !mu.is_finite() {
            return Err(ModelError::invalid_parameter(
                "mu",
                format!("must be positive, got {}", mu),
            ));
        }
        if !(lambda > 0.0) || !lambda.is_finite() {
            return Err(ModelError::invalid_parameter(
                "lambda",
                format!("must be positive, got {}", lambda),
            ));
        }
        Ok(Self { mu, lambda })
    }

    /// Mean `μ`.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Shape `λ`.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Variance `μ³/λ`.
    pub fn variance(&self) -> f64 {
        self.mu.powi(3) / self.lambda
    }
}

impl FrailtyGenerator for InverseGaussianFrailty {
    fn sample(&self, rng: &mut LossRng) -> f64 {
        let (mu, lambda) = (self.mu, self.lambda);
        let z = rng.gen_normal();
        let y = z * z;
        let x = mu + mu * mu * y / (2.0 * lambda)
            - mu / (2.0 * lambda) * (4.0 * mu * lambda * y + mu * mu * y * y).sqrt();
        if rng.gen_uniform() <= mu / (mu + x) {
            x
        } else {
            mu * mu / x
        }
    }
}

impl LaplaceTransform for InverseGaussianFrailty {
    /// `E[exp(−W u)] = exp((λ/μ)·(1 − sqrt(1 + 2μ²u/λ)))`.
    fn laplace(&self, u: f64) -> f64 {
        let ratio = self.lambda / self.mu;
        (ratio * (1.0 - (1.0 + 2.0 * self.mu * self.mu * u / self.lambda).sqrt())).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_non_positive_parameters() {
        assert!(InverseGaussianFrailty::new(0.0, 1.0).is_err());
        assert!(InverseGaussianFrailty::new(1.0, -2.0).is_err());
        assert!(InverseGaussianFrailty::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_sample_moments() {
        let frailty = InverseGaussianFrailty::new(1.0, 4.0).unwrap();
        let mut rng = LossRng::from_seed(314);
        let n = 200_000;
        let draws: Vec<f64> = (0..n).map(|_| frailty.sample(&mut rng)).collect();
        assert!(draws.iter().all(|w| *w > 0.0));

        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        assert_relative_eq!(mean, 1.0, epsilon = 0.01);
        assert_relative_eq!(var, 0.25, epsilon = 0.02);
    }

    #[test]
    fn test_laplace_matches_sample_average() {
        let frailty = InverseGaussianFrailty::new(1.5, 6.0).unwrap();
        let mut rng = LossRng::from_seed(27);
        let u = 0.8;
        let n = 200_000;
        let empirical = (0..n)
            .map(|_| (-frailty.sample(&mut rng) * u).exp())
            .sum::<f64>()
            / n as f64;
        assert_relative_eq!(empirical, frailty.laplace(u), epsilon = 0.005);
    }

    #[test]
    fn test_laplace_is_decreasing() {
        let frailty = InverseGaussianFrailty::new(1.0, 10.0).unwrap();
        let mut previous = frailty.laplace(0.0);
        assert_eq!(previous, 1.0);
        for k in 1..50 {
            let value = frailty.laplace(k as f64 * 0.1);
            assert!(value < previous);
            previous = value;
        }
    }
}
