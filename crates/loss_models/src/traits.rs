//! Model capability traits.
//!
//! The portfolio orchestrator is generic over these traits, so alternative
//! PD or loss models can be plugged in without touching the simulation code.

use loss_core::types::{ModelError, Scalar};

/// Loan-level probability of default.
pub trait PdModel: Send + Sync {
    /// Number of loans the model was initialised with.
    fn loan_count(&self) -> usize;

    /// PD of `loan` between `time_on_books` and `horizon` (both in months
    /// since origination) under an additive frailty shock.
    ///
    /// Generic over [`Scalar`] so root finders can differentiate it with
    /// respect to `horizon`.
    fn probability_of_default<S: Scalar>(
        &self,
        loan: usize,
        horizon: S,
        time_on_books: f64,
        frailty: f64,
    ) -> Result<S, ModelError>;
}

/// Loan-level dollar loss given default.
pub trait LossModel: Send + Sync {
    /// Number of loans the model was initialised with.
    fn loan_count(&self) -> usize;

    /// Loss on `loan` for a default at `time` (months since origination).
    ///
    /// `noise` is a standard normal draw scaling the residual error; pass 0
    /// for the expected loss. The result is never negative.
    fn loss_given_default(&self, loan: usize, noise: f64, time: f64) -> Result<f64, ModelError>;
}
