//! Owned simulation state.
//!
//! [`SimulationContext`] bundles the PD model, loss model, seasonality
//! table and portfolio with the configuration, and caches the last Monte
//! Carlo run until [`reset_all`](SimulationContext::reset_all).

use loss_core::types::ModelError;
use loss_engine::frailty::{ArchimedeanCopula, NoFrailty};
use loss_engine::mc::MonteCarloEngine;
use loss_models::{
    EgdModel, MonthlySeasonality, NoSeasonality, SeasonalAdjustment, SplineSurvivalModel,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, DependenceMode, FrailtyModel, SimulationConfig};
use crate::portfolio::{LossCurves, Portfolio, PortfolioSimulation};

/// Errors from context operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Model, portfolio or numeric failure.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Configuration cannot drive the requested run.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Models, portfolio and cached results of one simulation session.
#[derive(Debug)]
pub struct SimulationContext {
    config: SimulationConfig,
    pd: SplineSurvivalModel,
    lgd: EgdModel,
    seasonality: MonthlySeasonality,
    portfolio: Portfolio,
    simulation: Option<PortfolioSimulation>,
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl SimulationContext {
    /// Creates an empty context.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            pd: SplineSurvivalModel::new(config.link),
            lgd: EgdModel::new(),
            seasonality: MonthlySeasonality::new(),
            portfolio: Portfolio::with_length_on_books(config.total_length_on_books),
            simulation: None,
            config,
        }
    }

    /// Configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// PD model.
    pub fn pd_model(&self) -> &SplineSurvivalModel {
        &self.pd
    }

    /// PD model, for loading parameters.
    pub fn pd_model_mut(&mut self) -> &mut SplineSurvivalModel {
        &mut self.pd
    }

    /// Loss model.
    pub fn lgd_model(&self) -> &EgdModel {
        &self.lgd
    }

    /// Loss model, for loading parameters.
    pub fn lgd_model_mut(&mut self) -> &mut EgdModel {
        &mut self.lgd
    }

    /// Seasonality table.
    pub fn seasonality(&self) -> &MonthlySeasonality {
        &self.seasonality
    }

    /// Seasonality table, for loading factors.
    pub fn seasonality_mut(&mut self) -> &mut MonthlySeasonality {
        &mut self.seasonality
    }

    /// Portfolio.
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Portfolio, for loading loans.
    pub fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    /// Finalises the loaded models.
    ///
    /// Checks the portfolio vectors agree, initialises both models, checks
    /// they cover every loan and validates the seasonality table when one
    /// was loaded.
    pub fn init(&mut self) -> Result<(), ModelError> {
        self.portfolio.check_size()?;
        self.pd.init()?;
        self.lgd.init()?;
        for (context, loans) in [
            ("PD model loans vs portfolio", self.pd.loan_count()),
            ("loss model loans vs portfolio", self.lgd.loan_count()),
        ] {
            if loans != self.portfolio.len() {
                return Err(ModelError::DimensionMismatch {
                    context,
                    expected: self.portfolio.len(),
                    actual: loans,
                });
            }
        }
        if !self.seasonality.factors().is_empty() {
            self.seasonality.validate()?;
        }
        self.simulation = None;
        debug!(loans = self.portfolio.len(), "simulation context initialised");
        Ok(())
    }

    /// Clears models, portfolio, seasonality and the cached simulation.
    pub fn reset_all(&mut self) {
        self.portfolio.reset_all();
        self.pd.reset_all();
        self.lgd.reset_all();
        self.seasonality.clear();
        self.simulation = None;
        debug!("simulation context reset");
    }

    /// Cumulative unit loss curves, optionally seasonally adjusted.
    pub fn cumulative_unit_loss(&self, seasonal: bool) -> Result<LossCurves, ModelError> {
        if seasonal {
            let season = SeasonalAdjustment::new(self.pd.link(), &self.seasonality);
            self.portfolio.cumulative_unit_loss(&self.pd, &season)
        } else {
            self.portfolio.cumulative_unit_loss(&self.pd, &NoSeasonality)
        }
    }

    /// Cumulative net loss curves normalised by `balance`, optionally
    /// seasonally adjusted.
    pub fn cumulative_net_loss(&self, balance: f64, seasonal: bool) -> Result<LossCurves, ModelError> {
        if seasonal {
            let season = SeasonalAdjustment::new(self.pd.link(), &self.seasonality);
            self.portfolio
                .cumulative_net_loss(balance, &self.pd, &self.lgd, &season)
        } else {
            self.portfolio
                .cumulative_net_loss(balance, &self.pd, &self.lgd, &NoSeasonality)
        }
    }

    /// Seasonally adjusted cumulative default forecast.
    pub fn unit_loss_forecast(&self, months_out: usize) -> Result<Vec<f64>, ModelError> {
        let season = SeasonalAdjustment::new(self.pd.link(), &self.seasonality);
        self.portfolio
            .unit_loss_forecast(&self.pd, &season, months_out)
    }

    /// Seasonally adjusted cumulative dollar loss forecast.
    pub fn net_loss_forecast(&self, months_out: usize) -> Result<Vec<f64>, ModelError> {
        let season = SeasonalAdjustment::new(self.pd.link(), &self.seasonality);
        self.portfolio
            .net_loss_forecast(&self.pd, &self.lgd, &season, months_out)
    }

    /// Monthly expected defaults from today, optionally seasonally adjusted.
    pub fn unit_loss_increments(&self, seasonal: bool) -> Result<Vec<f64>, ModelError> {
        if seasonal {
            let season = SeasonalAdjustment::new(self.pd.link(), &self.seasonality);
            self.portfolio.unit_loss_increments(&self.pd, &season)
        } else {
            self.portfolio.unit_loss_increments(&self.pd, &NoSeasonality)
        }
    }

    /// Runs the Monte Carlo simulation with `trials` trials, or returns the
    /// cached run when one exists. A cached run is kept whatever `trials`
    /// asks for; call [`reset_all`](Self::reset_all) to rerun.
    pub fn simulate(&mut self, trials: usize) -> Result<&PortfolioSimulation, ContextError> {
        let simulation = match self.simulation.take() {
            Some(cached) => {
                debug!(
                    cached_trials = cached.trials,
                    requested_trials = trials,
                    "reusing cached simulation until reset"
                );
                cached
            }
            None => self.run_simulation(trials)?,
        };
        Ok(self.simulation.insert(simulation))
    }

    /// Last simulation, if any.
    pub fn simulation(&self) -> Option<&PortfolioSimulation> {
        self.simulation.as_ref()
    }

    /// Returns `true` when a simulation is cached.
    pub fn has_run(&self) -> bool {
        self.simulation.is_some()
    }

    fn run_simulation(&self, trials: usize) -> Result<PortfolioSimulation, ContextError> {
        let config = SimulationConfig {
            trials,
            ..self.config.clone()
        };
        config.validate()?;
        let engine = MonteCarloEngine::new(config.monte_carlo()?);
        let options = config.simulation_options();
        let frailty = config.frailty.build()?;
        info!(trials, dependence = ?config.dependence, "simulating portfolio losses");

        let (portfolio, pd, lgd) = (&self.portfolio, &self.pd, &self.lgd);
        let simulation = match (config.dependence, frailty) {
            (DependenceMode::Frailty, frailty) => {
                portfolio.simulate(&engine, pd, lgd, &frailty, &options)?
            }
            (DependenceMode::Copula, FrailtyModel::None(_)) => {
                let copula = ArchimedeanCopula::new(NoFrailty);
                portfolio.simulate_with_copula(&engine, pd, lgd, &copula, &options)?
            }
            (DependenceMode::Copula, FrailtyModel::InverseGaussian(ig)) => {
                let copula = ArchimedeanCopula::new(ig);
                portfolio.simulate_with_copula(&engine, pd, lgd, &copula, &options)?
            }
            (DependenceMode::Copula, FrailtyModel::LogNormal(_)) => {
                return Err(ConfigError::Incompatible(
                    "copula dependence is unavailable for log-normal frailty".to_string(),
                )
                .into())
            }
        };
        Ok(simulation)
    }
}
