//! Monte Carlo simulation configuration.

use super::error::ConfigError;

/// Maximum number of trials allowed.
pub const MAX_TRIALS: usize = 10_000_000;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Monte Carlo simulation configuration.
///
/// Immutable configuration specifying the trial count and seed.
/// Use [`MonteCarloConfigBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use loss_engine::mc::MonteCarloConfig;
///
/// let config = MonteCarloConfig::builder()
///     .trials(10_000)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.trials(), 10_000);
/// assert_eq!(config.seed(), Some(42));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonteCarloConfig {
    trials: usize,
    seed: Option<u64>,
}

impl MonteCarloConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> MonteCarloConfigBuilder {
        MonteCarloConfigBuilder::default()
    }

    /// Returns the number of trials.
    #[inline]
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Returns the optional seed.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `trials` is 0 or greater than 10,000,000.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 || self.trials > MAX_TRIALS {
            return Err(ConfigError::InvalidTrialCount(self.trials));
        }
        Ok(())
    }
}

/// Builder for [`MonteCarloConfig`].
#[derive(Clone, Debug, Default)]
pub struct MonteCarloConfigBuilder {
    trials: Option<usize>,
    seed: Option<u64>,
}

impl MonteCarloConfigBuilder {
    /// Sets the number of trials in [1, 10_000_000].
    #[inline]
    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);
        self
    }

    /// Sets the seed for reproducibility.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `trials` is not set or out of range.
    pub fn build(self) -> Result<MonteCarloConfig, ConfigError> {
        let trials = self.trials.ok_or(ConfigError::InvalidParameter {
            name: "trials",
            value: "must be specified".to_string(),
        })?;

        let config = MonteCarloConfig {
            trials,
            seed: self.seed,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder_valid() {
        let config = MonteCarloConfig::builder().trials(10_000).build().unwrap();
        assert_eq!(config.trials(), 10_000);
        assert_eq!(config.seed(), None);
    }

    #[test]
    fn test_config_builder_with_seed() {
        let config = MonteCarloConfig::builder()
            .trials(1000)
            .seed(7)
            .build()
            .unwrap();
        assert_eq!(config.seed(), Some(7));
    }

    #[test]
    fn test_config_invalid_zero_trials() {
        let result = MonteCarloConfig::builder().trials(0).build();
        assert!(matches!(result, Err(ConfigError::InvalidTrialCount(0))));
    }

    #[test]
    fn test_config_invalid_too_many_trials() {
        let result = MonteCarloConfig::builder().trials(MAX_TRIALS + 1).build();
        assert!(matches!(result, Err(ConfigError::InvalidTrialCount(_))));
    }

    #[test]
    fn test_config_missing_trials() {
        let result = MonteCarloConfig::builder().seed(1).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "trials", .. })
        ));
    }

    #[test]
    fn test_config_single_trial_is_valid() {
        assert!(MonteCarloConfig::builder().trials(1).build().is_ok());
    }
}
