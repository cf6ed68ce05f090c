//! # Loss Risk (L4: Portfolio Risk)
//!
//! Portfolio-level credit loss analytics built on the loan models and the
//! Monte Carlo engine.
//!
//! This crate provides:
//! - Loan portfolio with deterministic expected-loss curves and forecasts
//!   (`portfolio`)
//! - Monte Carlo portfolio loss simulation with frailty or copula
//!   dependence (`portfolio::simulation`)
//! - VaR, Expected Shortfall and covariance risk contributions
//!   (`contribution`)
//! - Equal-width histograms of simulated distributions (`histogram`)
//! - TOML simulation configuration (`config`)
//! - Owned simulation context with cached results (`context`)
//! - Concurrent parameter loading from an external store (`loader`)
//!
//! ## Usage Example
//!
//! ```rust
//! use loss_engine::frailty::NoFrailty;
//! use loss_engine::mc::{MonteCarloConfig, MonteCarloEngine};
//! use loss_models::{EgdModel, LinkFunction, SplineSurvivalModel};
//! use loss_risk::{Portfolio, SimulationOptions};
//!
//! let mut pd = SplineSurvivalModel::new(LinkFunction::Odds);
//! for (k, g) in [(0.0, -6.0), (1.5, 1.2), (4.3, 0.01)] {
//!     pd.add_knot(k);
//!     pd.add_gamma(g);
//! }
//! pd.add_coefficient(0.0);
//! pd.add_mean(0.0);
//! pd.add_attribute(0.0);
//! pd.init().unwrap();
//!
//! let mut lgd = EgdModel::new();
//! lgd.add_coefficient(0.0);
//! for v in [0.0, 0.06, 20_000.0, 15_000.0] {
//!     lgd.add_attribute(v);
//! }
//! lgd.init().unwrap();
//!
//! let mut portfolio = Portfolio::new();
//! portfolio.add_loan(6.0, 66.0, 3, false);
//!
//! let engine = MonteCarloEngine::new(MonteCarloConfig::builder().trials(1_000).build().unwrap());
//! let sim = portfolio
//!     .simulate(&engine, &pd, &lgd, &NoFrailty, &SimulationOptions::default())
//!     .unwrap();
//!
//! assert_eq!(sim.losses.len(), 1_000);
//! assert_eq!(sim.contributions.len(), 1);
//! assert!(sim.estimate >= 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod context;
pub mod contribution;
pub mod histogram;
pub mod loader;
pub mod portfolio;

pub use config::{ConfigError, DependenceMode, FrailtyKind, FrailtyModel, SimulationConfig};
pub use context::{ContextError, SimulationContext};
pub use contribution::{sort_indices, RiskContribution, TailDirection};
pub use histogram::Histogram;
pub use loader::{
    CovariateEstimate, LoadError, LoadSummary, LoanRecord, ParameterSource, SourceError,
};
pub use portfolio::{
    DefaultTimeSolver, LossCurves, Portfolio, PortfolioSimulation, SimulationOptions,
    TOTAL_LENGTH_ON_BOOKS,
};
