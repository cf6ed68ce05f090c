//! Parallel Monte Carlo engine.
//!
//! # Architecture
//!
//! ```text
//! MonteCarloEngine
//! ├── MonteCarloConfig   (trial count, seed)
//! ├── LossRng::for_trial (independent stream per trial)
//! └── Execution
//!     ├── simulate()                aggregate moments only
//!     ├── simulate_distribution()   moments + outcome per trial slot
//!     └── run_with_accumulator()    moments + outcomes + mergeable side sums
//! ```
//!
//! Trials run on the rayon pool with no ordering guarantee. Running sums
//! are folded per worker and combined by parallel reduction; outcomes are
//! written to the slot of their trial index.
//!
//! # Examples
//!
//! ```rust
//! use loss_engine::mc::{MonteCarloConfig, MonteCarloEngine};
//!
//! let engine = MonteCarloEngine::new(
//!     MonteCarloConfig::builder().trials(5).build().unwrap(),
//! );
//! let result = engine.simulate_distribution(|trial| (trial + 1) as f64);
//!
//! assert_eq!(result.mean, 3.0);
//! assert_eq!(result.variance, 2.5);
//! assert_eq!(result.distribution, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
//! ```

mod config;
mod engine;
mod error;

pub use config::{MonteCarloConfig, MonteCarloConfigBuilder, DEFAULT_SEED, MAX_TRIALS};
pub use engine::{McResult, MonteCarloEngine, TrialAccumulator};
pub use error::ConfigError;
