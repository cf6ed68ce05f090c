//! Newton-Raphson root-finding solver.

use super::{RootSolution, RootStatus, SolverConfig};
use crate::types::Dual;

/// Newton-Raphson root finder with derivatives from dual numbers.
///
/// Each iteration evaluates `f` once on `Dual::variable(x)`, reading the
/// value and the derivative from the same call, then updates
/// `x ← x − f(x)/f'(x)`.
///
/// # Convergence
///
/// Stops when the step `|Δx|` is below `precision_step` and the residual
/// `|f(x)|` is below `precision_value`. A zero derivative stops the solve
/// with [`RootStatus::ZeroDerivative`], a non-finite iterate with
/// [`RootStatus::Diverged`]. Exhausting the iteration budget reports
/// [`RootStatus::MaxIterationsReached`].
///
/// # Example
///
/// ```
/// use loss_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
/// use loss_core::types::Dual;
///
/// let solver = NewtonRaphsonSolver::new(SolverConfig::default());
///
/// // x³ - x - 2 = 0
/// let solution = solver.find_root(|x: Dual| x * x * x - x - 2.0, 1.5);
/// assert!(solution.is_converged());
/// assert!(solution.residual.abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NewtonRaphsonSolver {
    config: SolverConfig,
}

impl NewtonRaphsonSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Find a root of `f` starting from `guess`.
    pub fn find_root<F>(&self, f: F, guess: f64) -> RootSolution
    where
        F: Fn(Dual) -> Dual,
    {
        let mut x = guess;
        let mut residual = f(Dual::constant(x)).value();

        for iteration in 1..=self.config.max_iterations {
            let fx = f(Dual::variable(x));
            let derivative = fx.derivative();

            if derivative == 0.0 {
                return RootSolution {
                    root: x,
                    residual: fx.value(),
                    iterations: iteration,
                    status: RootStatus::ZeroDerivative,
                };
            }

            let step = fx.value() / derivative;
            x -= step;
            residual = f(Dual::constant(x)).value();

            if !x.is_finite() {
                return RootSolution {
                    root: x,
                    residual,
                    iterations: iteration,
                    status: RootStatus::Diverged,
                };
            }

            if step.abs() < self.config.precision_step
                && residual.abs() < self.config.precision_value
            {
                return RootSolution {
                    root: x,
                    residual,
                    iterations: iteration,
                    status: RootStatus::Converged,
                };
            }
        }

        RootSolution {
            root: x,
            residual,
            iterations: self.config.max_iterations,
            status: RootStatus::MaxIterationsReached,
        }
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // Convergence
    // ========================================

    #[test]
    fn test_find_sqrt() {
        let solver = NewtonRaphsonSolver::with_defaults();
        for c in [2.0, 9.0, 0.25, 1e4] {
            let solution = solver.find_root(|x: Dual| x * x - c, 1.0);
            assert!(solution.is_converged(), "c = {}", c);
            assert_relative_eq!(solution.root, f64::sqrt(c), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_find_exp_root() {
        // exp(x) = 3
        let solver = NewtonRaphsonSolver::with_defaults();
        let solution = solver.find_root(|x: Dual| x.exp() - 3.0, 0.0);
        assert!(solution.is_converged());
        assert_relative_eq!(solution.root, 3.0_f64.ln(), epsilon = 1e-8);
    }

    #[test]
    fn test_find_erf_root() {
        let solver = NewtonRaphsonSolver::with_defaults();
        let solution = solver.find_root(|x: Dual| x.erf() - 0.5, 0.1);
        assert!(solution.is_converged());
        assert_relative_eq!(
            statrs::function::erf::erf(solution.root),
            0.5,
            epsilon = 1e-6
        );
    }

    // ========================================
    // Failure modes
    // ========================================

    #[test]
    fn test_zero_derivative_is_reported() {
        // f'(0) = 0 for x² + 1
        let solver = NewtonRaphsonSolver::with_defaults();
        let solution = solver.find_root(|x: Dual| x * x + 1.0, 0.0);
        assert_eq!(solution.status, RootStatus::ZeroDerivative);
        assert_eq!(solution.root, 0.0);
        assert_eq!(solution.residual, 1.0);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_iteration_cap_is_distinct_from_convergence() {
        // x² + 1 has no real root; Newton wanders
        let solver = NewtonRaphsonSolver::new(SolverConfig::new(1e-12, 1e-12, 10));
        let solution = solver.find_root(|x: Dual| x * x + 1.0, 0.5);
        assert_eq!(solution.status, RootStatus::MaxIterationsReached);
        assert!(!solution.is_converged());
    }

    #[test]
    fn test_divergence_is_distinct_from_iteration_cap() {
        // derivative 1e-320 is subnormal, so the first step overflows
        let solver = NewtonRaphsonSolver::with_defaults();
        let solution = solver.find_root(|x: Dual| x * 1e-320 + 1.0, 0.0);
        assert_eq!(solution.status, RootStatus::Diverged);
        assert!(!solution.root.is_finite());
        assert_eq!(solution.iterations, 1);
        assert!(!solution.is_converged());
    }

    #[test]
    fn test_nan_residual_is_reported_as_divergence() {
        let solver = NewtonRaphsonSolver::with_defaults();
        let solution = solver.find_root(|x: Dual| x + f64::NAN, 1.0);
        assert_eq!(solution.status, RootStatus::Diverged);
        assert!(solution.root.is_nan());
    }

    #[test]
    fn test_config_accessor() {
        let config = SolverConfig::new(1e-9, 1e-9, 42);
        let solver = NewtonRaphsonSolver::new(config);
        assert_eq!(solver.config().max_iterations, 42);
    }
}
