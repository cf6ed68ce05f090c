//! Simulation configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file is a valid
//! configuration.
//!
//! ```toml
//! trials = 50000
//! seed = 7
//! var_quantile = 0.99
//! link = "odds"
//! dependence = "copula"
//!
//! [frailty]
//! kind = "inverse_gaussian"
//! mu = 1.0
//! lambda = 4.0
//! ```

use std::path::Path;

use loss_core::math::solvers::SolverConfig;
use loss_engine::frailty::{FrailtyGenerator, InverseGaussianFrailty, LogNormalFrailty, NoFrailty};
use loss_engine::mc::{MonteCarloConfig, MAX_TRIALS};
use loss_engine::rng::LossRng;
use loss_models::LinkFunction;
use serde::Deserialize;
use thiserror::Error;

use crate::portfolio::{DefaultTimeSolver, SimulationOptions, TOTAL_LENGTH_ON_BOOKS};

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field outside its allowed range.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Combination of settings that cannot run together.
    #[error("Incompatible configuration: {0}")]
    Incompatible(String),

    /// File could not be read.
    #[error("Configuration file error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML could not be parsed.
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How loans are made to default together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependenceMode {
    /// Frailty enters every loan's PD as the additive shock `ln w`.
    #[default]
    Frailty,
    /// Default thresholds come from an Archimedean copula of the frailty.
    Copula,
}

/// Frailty distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrailtyKind {
    /// Independent defaults.
    #[default]
    None,
    /// Inverse Gaussian `IG(mu, lambda)`.
    InverseGaussian {
        /// Mean.
        mu: f64,
        /// Shape.
        lambda: f64,
    },
    /// Mean-one log-normal with log-volatility `sigma`.
    LogNormal {
        /// Log-volatility.
        sigma: f64,
    },
}

/// Frailty generator built from a [`FrailtyKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrailtyModel {
    /// `W = 1`.
    None(NoFrailty),
    /// Inverse Gaussian frailty.
    InverseGaussian(InverseGaussianFrailty),
    /// Log-normal frailty.
    LogNormal(LogNormalFrailty),
}

impl FrailtyGenerator for FrailtyModel {
    fn sample(&self, rng: &mut LossRng) -> f64 {
        match self {
            Self::None(f) => f.sample(rng),
            Self::InverseGaussian(f) => f.sample(rng),
            Self::LogNormal(f) => f.sample(rng),
        }
    }
}

impl FrailtyKind {
    /// Builds the generator, validating its parameters.
    pub fn build(&self) -> Result<FrailtyModel, ConfigError> {
        let invalid = |e: loss_core::types::ModelError| ConfigError::InvalidValue {
            field: "frailty",
            reason: e.to_string(),
        };
        Ok(match *self {
            Self::None => FrailtyModel::None(NoFrailty),
            Self::InverseGaussian { mu, lambda } => {
                FrailtyModel::InverseGaussian(InverseGaussianFrailty::new(mu, lambda).map_err(invalid)?)
            }
            Self::LogNormal { sigma } => {
                FrailtyModel::LogNormal(LogNormalFrailty::new(sigma).map_err(invalid)?)
            }
        })
    }
}

/// Portfolio simulation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Monte Carlo trials.
    pub trials: usize,
    /// Base seed; unset uses the engine default.
    pub seed: Option<u64>,
    /// VaR / ES confidence level.
    pub var_quantile: f64,
    /// Histogram bins for losses and contributions.
    pub histogram_bins: usize,
    /// Normal quantile for the estimate's confidence bounds.
    pub confidence_z: f64,
    /// Contractual life in months.
    pub total_length_on_books: usize,
    /// Link of the PD model.
    pub link: LinkFunction,
    /// Default-time root finder.
    pub solver: DefaultTimeSolver,
    /// Root finder tolerance on the step / bracket half-width.
    pub precision_step: f64,
    /// Root finder tolerance on the residual.
    pub precision_value: f64,
    /// Root finder iteration cap.
    pub max_iterations: usize,
    /// Joint default mechanism.
    pub dependence: DependenceMode,
    /// Frailty distribution.
    pub frailty: FrailtyKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let solver = SolverConfig::default();
        Self {
            trials: 10_000,
            seed: None,
            var_quantile: 0.99,
            histogram_bins: 50,
            confidence_z: 1.96,
            total_length_on_books: TOTAL_LENGTH_ON_BOOKS,
            link: LinkFunction::Odds,
            solver: DefaultTimeSolver::Bisection,
            precision_step: solver.precision_step,
            precision_value: solver.precision_value,
            max_iterations: solver.max_iterations,
            dependence: DependenceMode::Frailty,
            frailty: FrailtyKind::None,
        }
    }
}

impl SimulationConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 || self.trials > MAX_TRIALS {
            return Err(ConfigError::InvalidValue {
                field: "trials",
                reason: format!("must be in [1, {}], got {}", MAX_TRIALS, self.trials),
            });
        }
        if !(0.0..1.0).contains(&self.var_quantile) {
            return Err(ConfigError::InvalidValue {
                field: "var_quantile",
                reason: format!("must lie in [0, 1), got {}", self.var_quantile),
            });
        }
        if self.histogram_bins == 0 {
            return Err(ConfigError::InvalidValue {
                field: "histogram_bins",
                reason: "must be positive".to_string(),
            });
        }
        if !(self.confidence_z >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "confidence_z",
                reason: format!("must be non-negative, got {}", self.confidence_z),
            });
        }
        if self.total_length_on_books == 0 {
            return Err(ConfigError::InvalidValue {
                field: "total_length_on_books",
                reason: "must be positive".to_string(),
            });
        }
        for (field, value) in [
            ("precision_step", self.precision_step),
            ("precision_value", self.precision_value),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be positive, got {}", value),
                });
            }
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_iterations",
                reason: "must be positive".to_string(),
            });
        }
        self.frailty.build()?;
        if self.dependence == DependenceMode::Copula
            && matches!(self.frailty, FrailtyKind::LogNormal { .. })
        {
            return Err(ConfigError::Incompatible(
                "copula dependence needs a frailty with a closed-form Laplace transform \
                 (none or inverse_gaussian)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Monte Carlo engine configuration.
    pub fn monte_carlo(&self) -> Result<MonteCarloConfig, ConfigError> {
        let mut builder = MonteCarloConfig::builder().trials(self.trials);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        builder.build().map_err(|e| ConfigError::InvalidValue {
            field: "trials",
            reason: e.to_string(),
        })
    }

    /// Root finder tolerances.
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            precision_step: self.precision_step,
            precision_value: self.precision_value,
            max_iterations: self.max_iterations,
        }
    }

    /// Options for [`Portfolio::simulate`](crate::Portfolio::simulate).
    pub fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            var_quantile: self.var_quantile,
            histogram_bins: self.histogram_bins,
            confidence_z: self.confidence_z,
            solver: self.solver,
            solver_config: self.solver_config(),
        }
    }
}
