//! Bisection root-finding solver.

use super::{RootSolution, RootStatus, SolverConfig};

/// Bracketing root finder on `[begin, end]`.
///
/// Halves the bracket while the half-width exceeds `precision_step` or the
/// midpoint residual exceeds `precision_value`. The midpoint of each
/// iteration is the current estimate.
///
/// A bracket whose endpoints have the same sign (or `begin > end`) is not
/// an error: the solver returns the midpoint with residual 0 and
/// [`RootStatus::NonBracketing`] so callers can detect it.
///
/// # Example
///
/// ```
/// use loss_core::math::solvers::{BisectionSolver, RootStatus, SolverConfig};
///
/// let solver = BisectionSolver::new(SolverConfig::default());
///
/// let solution = solver.find_root(|x| x * x + 1.0, 0.0, 4.0);
/// assert_eq!(solution.status, RootStatus::NonBracketing);
/// assert_eq!(solution.root, 2.0);
/// assert_eq!(solution.residual, 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BisectionSolver {
    config: SolverConfig,
}

impl BisectionSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Find a root of `f` in `[begin, end]`.
    pub fn find_root<F>(&self, f: F, begin: f64, end: f64) -> RootSolution
    where
        F: Fn(f64) -> f64,
    {
        let f_begin = f(begin);
        if f_begin == 0.0 {
            return Self::exact(begin);
        }
        let f_end = f(end);
        if f_end == 0.0 {
            return Self::exact(end);
        }

        if f_begin * f_end > 0.0 || begin > end {
            return RootSolution {
                root: 0.5 * (begin + end),
                residual: 0.0,
                iterations: 0,
                status: RootStatus::NonBracketing,
            };
        }

        let (mut lo, mut hi, mut f_lo) = (begin, end, f_begin);
        let mut iterations = 0;

        loop {
            let mid = 0.5 * (lo + hi);
            let f_mid = f(mid);
            iterations += 1;

            let settled = 0.5 * (hi - lo) <= self.config.precision_step
                && f_mid.abs() <= self.config.precision_value;
            if settled || f_mid == 0.0 {
                return RootSolution {
                    root: mid,
                    residual: f_mid,
                    iterations,
                    status: RootStatus::Converged,
                };
            }
            if iterations >= self.config.max_iterations {
                return RootSolution {
                    root: mid,
                    residual: f_mid,
                    iterations,
                    status: RootStatus::MaxIterationsReached,
                };
            }

            if f_lo * f_mid < 0.0 {
                hi = mid;
            } else {
                lo = mid;
                f_lo = f_mid;
            }
        }
    }

    fn exact(root: f64) -> RootSolution {
        RootSolution {
            root,
            residual: 0.0,
            iterations: 0,
            status: RootStatus::Converged,
        }
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}
