//! Root-finding solvers for default-time inversion.
//!
//! This module provides the two one-dimensional root finders used by the
//! portfolio simulation to invert a cumulative default curve against a
//! uniform draw.
//!
//! ## Available Solvers
//!
//! - [`NewtonRaphsonSolver`]: quadratic convergence, derivatives from [`Dual`](crate::types::Dual)
//! - [`BisectionSolver`]: bracketing method on plain `f64` functions
//!
//! ## Configuration
//!
//! Both solvers use [`SolverConfig`]:
//! - `precision_step`: step / half-width tolerance (default: 1e-7)
//! - `precision_value`: residual tolerance (default: 1e-6)
//! - `max_iterations`: iteration cap (default: 500)
//!
//! ## Outcomes
//!
//! Solvers never fail with an error. They return a [`RootSolution`] whose
//! [`RootStatus`] tells the caller whether the estimate converged, hit the
//! iteration cap, stalled on a zero derivative, diverged to a non-finite
//! iterate, or was handed a bracket without a sign change.
//!
//! ## Examples
//!
//! ```
//! use loss_core::math::solvers::{BisectionSolver, RootStatus, SolverConfig};
//!
//! let solver = BisectionSolver::new(SolverConfig::default());
//! let solution = solver.find_root(|x| x * x - 2.0, 0.0, 2.0);
//!
//! assert_eq!(solution.status, RootStatus::Converged);
//! assert!((solution.root - std::f64::consts::SQRT_2).abs() < 1e-6);
//! ```

mod bisection;
mod config;
mod newton_raphson;

pub use bisection::BisectionSolver;
pub use config::SolverConfig;
pub use newton_raphson::NewtonRaphsonSolver;

/// Termination reason of a root solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RootStatus {
    /// Both step and residual tolerances were met.
    Converged,
    /// The iteration cap was reached first.
    MaxIterationsReached,
    /// Newton–Raphson met a zero derivative and stopped at the current iterate.
    ZeroDerivative,
    /// Newton–Raphson produced a non-finite iterate.
    Diverged,
    /// Bisection was given a bracket without a sign change (or reversed
    /// bounds) and returned the midpoint.
    NonBracketing,
}

/// Root estimate with diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RootSolution {
    /// Root estimate
    pub root: f64,
    /// Function value at `root` (0 for `NonBracketing`)
    pub residual: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Termination reason
    pub status: RootStatus,
}

impl RootSolution {
    /// Returns `true` when the solve converged.
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.status == RootStatus::Converged
    }
}
