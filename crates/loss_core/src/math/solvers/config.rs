//! Solver configuration types.

/// Configuration for root-finding algorithms.
///
/// Shared by [`NewtonRaphsonSolver`](super::NewtonRaphsonSolver) and
/// [`BisectionSolver`](super::BisectionSolver).
///
/// # Example
///
/// ```
/// use loss_core::math::solvers::SolverConfig;
///
/// let config = SolverConfig::default();
/// assert_eq!(config.max_iterations, 500);
///
/// let custom = SolverConfig::new(1e-10, 1e-10, 200);
/// assert_eq!(custom.max_iterations, 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Tolerance on the Newton step or the bisection half-width.
    pub precision_step: f64,

    /// Tolerance on `|f(x)|`.
    pub precision_value: f64,

    /// Maximum number of iterations before giving up.
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    /// Default values:
    /// - `precision_step`: 1e-7
    /// - `precision_value`: 1e-6
    /// - `max_iterations`: 500
    fn default() -> Self {
        Self {
            precision_step: 1e-7,
            precision_value: 1e-6,
            max_iterations: 500,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with specified values.
    ///
    /// # Panics
    ///
    /// Panics if either precision is not positive or `max_iterations == 0`.
    pub fn new(precision_step: f64, precision_value: f64, max_iterations: usize) -> Self {
        assert!(precision_step > 0.0, "precision_step must be positive");
        assert!(precision_value > 0.0, "precision_value must be positive");
        assert!(max_iterations > 0, "max_iterations must be > 0");
        Self {
            precision_step,
            precision_value,
            max_iterations,
        }
    }
}
