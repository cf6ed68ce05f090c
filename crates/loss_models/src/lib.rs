//! # Loss Models (L2: Credit Models)
//!
//! Loan-level credit models evaluated by the simulation engine.
//!
//! This crate provides:
//! - Restricted cubic spline survival model for probability of default (`pd`)
//! - Parametric exposure-given-default model in dollars (`lgd`)
//! - Monthly seasonality table and adjusters (`seasonality`)
//! - Model capability traits consumed by the orchestrator (`traits`)
//!
//! ## Design Principles
//!
//! - **Load then finalise**: parameters are appended from a parameter source,
//!   then validated once by `init()`
//! - **Generic scalars**: PD evaluation is generic over
//!   [`Scalar`](loss_core::types::Scalar) so the same code serves plain
//!   evaluation and Newton–Raphson with dual numbers
//! - **Thread-safe memoisation**: per-loan offsets are computed lazily behind
//!   `OnceLock`, so models can be shared across simulation threads

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod lgd;
pub mod pd;
pub mod seasonality;
pub mod traits;

pub use lgd::{AmortizationTerms, EgdModel, RecoveryParameters};
pub use pd::{LinkFunction, SplineSurvivalModel};
pub use seasonality::{MonthlySeasonality, NoSeasonality, SeasonalAdjustment, SeasonalityAdjuster};
pub use traits::{LossModel, PdModel};
