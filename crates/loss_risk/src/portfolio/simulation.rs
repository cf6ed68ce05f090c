//! Monte Carlo simulation of portfolio dollar losses.
//!
//! Each trial draws one frailty realisation shared by every loan, then for
//! each active loan a default threshold `u`. The default time solves
//! `PD(t) = u` on `[months on books, maturity]`; when the PD at maturity is
//! below `u` the loan survives the window. Defaulted loans are priced by the
//! loss model with a fresh normal residual and floored at zero.

use loss_core::math::solvers::{BisectionSolver, NewtonRaphsonSolver, RootSolution, SolverConfig};
use loss_core::types::{Dual, ModelError};
use loss_engine::frailty::{ArchimedeanCopula, FrailtyGenerator, LaplaceTransform};
use loss_engine::mc::{MonteCarloEngine, TrialAccumulator};
use loss_engine::rng::LossRng;
use loss_models::{LossModel, PdModel};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Portfolio;
use crate::contribution::{RiskContribution, TailDirection};
use crate::histogram::Histogram;

/// Root finder used to invert the PD curve for the default time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultTimeSolver {
    /// Bisection on `[months on books, maturity]`.
    #[default]
    Bisection,
    /// Newton–Raphson from the window midpoint, falling back to bisection
    /// when it fails or leaves the window.
    Newton,
}

/// Knobs of a portfolio simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOptions {
    /// VaR / ES confidence level in `[0, 1)`.
    pub var_quantile: f64,
    /// Number of histogram bins for losses and contributions.
    pub histogram_bins: usize,
    /// Normal quantile for the estimate's confidence bounds.
    pub confidence_z: f64,
    /// Default-time root finder.
    pub solver: DefaultTimeSolver,
    /// Root finder tolerances.
    pub solver_config: SolverConfig,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            var_quantile: 0.99,
            histogram_bins: 50,
            confidence_z: 1.96,
            solver: DefaultTimeSolver::Bisection,
            solver_config: SolverConfig::default(),
        }
    }
}

impl SimulationOptions {
    fn validate(&self) -> Result<(), ModelError> {
        if !(0.0..1.0).contains(&self.var_quantile) {
            return Err(ModelError::invalid_parameter(
                "var_quantile",
                format!("must lie in [0, 1), got {}", self.var_quantile),
            ));
        }
        if !(self.confidence_z >= 0.0) {
            return Err(ModelError::invalid_parameter(
                "confidence_z",
                format!("must be non-negative, got {}", self.confidence_z),
            ));
        }
        Ok(())
    }
}

/// Outcome of a portfolio loss simulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioSimulation {
    /// Number of trials.
    pub trials: usize,
    /// Mean portfolio loss.
    pub estimate: f64,
    /// Sample variance of the portfolio loss.
    pub variance: f64,
    /// Standard error of the estimate.
    pub error: f64,
    /// Lower confidence bound on the estimate.
    pub lower_bound: f64,
    /// Upper confidence bound on the estimate.
    pub upper_bound: f64,
    /// Confidence level of the tail measures.
    pub var_quantile: f64,
    /// Value-at-Risk of the portfolio loss.
    pub value_at_risk: f64,
    /// Expected Shortfall of the portfolio loss.
    pub expected_shortfall: f64,
    /// Portfolio loss per trial, indexed by trial.
    pub losses: Vec<f64>,
    /// Loan-level contributions to VaR, indexed by loan.
    pub contributions: Vec<f64>,
    /// Histogram of `losses`.
    pub loss_histogram: Histogram,
    /// Histogram of `contributions`.
    pub contribution_histogram: Histogram,
    /// Default-time solves that did not converge cleanly.
    pub degenerate_solves: usize,
}

/// Loan losses of one trial.
struct TrialLosses {
    losses: Vec<f64>,
    degenerate_solves: usize,
}

/// Per-loan sums `Σ X_i` and `Σ X_i·L` across trials.
#[derive(Default)]
struct LoanMoments {
    totals: Vec<f64>,
    cross: Vec<f64>,
    degenerate_solves: usize,
}

impl TrialAccumulator for LoanMoments {
    type Sample = TrialLosses;

    fn record(&mut self, _trial: usize, outcome: f64, sample: TrialLosses) {
        if self.totals.len() < sample.losses.len() {
            self.totals.resize(sample.losses.len(), 0.0);
            self.cross.resize(sample.losses.len(), 0.0);
        }
        for (i, loss) in sample.losses.into_iter().enumerate() {
            self.totals[i] += loss;
            self.cross[i] += loss * outcome;
        }
        self.degenerate_solves += sample.degenerate_solves;
    }

    fn merge(&mut self, other: Self) {
        if self.totals.len() < other.totals.len() {
            self.totals.resize(other.totals.len(), 0.0);
            self.cross.resize(other.cross.len(), 0.0);
        }
        for (i, (total, cross)) in other.totals.into_iter().zip(other.cross).enumerate() {
            self.totals[i] += total;
            self.cross[i] += cross;
        }
        self.degenerate_solves += other.degenerate_solves;
    }
}

/// Frailty shock and per-loan default thresholds for one trial.
struct TrialDraw {
    shock: f64,
    thresholds: Vec<f64>,
}

impl Portfolio {
    /// Simulates the loss distribution with a shared frailty multiplier.
    ///
    /// The realised frailty `w` shifts every loan's spline by `ln w`; the
    /// default thresholds are independent uniforms.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` when the loan vectors or models disagree in size
    /// - `InvalidParameter` for out-of-range options
    /// - `NumericDegeneracy` when the frailty is not positive or the PD
    ///   cannot be evaluated inside a solve
    /// - any model error
    pub fn simulate<P, L, F>(
        &self,
        engine: &MonteCarloEngine,
        pd: &P,
        lgd: &L,
        frailty: &F,
        options: &SimulationOptions,
    ) -> Result<PortfolioSimulation, ModelError>
    where
        P: PdModel,
        L: LossModel,
        F: FrailtyGenerator,
    {
        self.run(engine, pd, lgd, options, "frailty", |rng, active| {
            let w = frailty.sample(rng);
            if !(w > 0.0) || !w.is_finite() {
                return Err(ModelError::NumericDegeneracy(format!(
                    "frailty draw must be positive, got {}",
                    w
                )));
            }
            let mut thresholds = vec![0.0; active];
            rng.fill_uniform(&mut thresholds);
            Ok(TrialDraw {
                shock: w.ln(),
                thresholds,
            })
        })
    }

    /// Simulates the loss distribution with default thresholds drawn from an
    /// Archimedean copula.
    ///
    /// Each copula uniform `u` becomes the PD target `1 − u`, so a high
    /// frailty draw pulls every loan's default forward together. The PD
    /// model is evaluated without an additive shock.
    pub fn simulate_with_copula<P, L, G>(
        &self,
        engine: &MonteCarloEngine,
        pd: &P,
        lgd: &L,
        copula: &ArchimedeanCopula<G>,
        options: &SimulationOptions,
    ) -> Result<PortfolioSimulation, ModelError>
    where
        P: PdModel,
        L: LossModel,
        G: FrailtyGenerator + LaplaceTransform,
    {
        self.run(engine, pd, lgd, options, "copula", |rng, active| {
            let w = copula.generator().sample(rng);
            if !(w > 0.0) || !w.is_finite() {
                return Err(ModelError::NumericDegeneracy(format!(
                    "frailty draw must be positive, got {}",
                    w
                )));
            }
            let mut thresholds = Vec::with_capacity(active);
            copula.generate(active, w, rng, |u, _| thresholds.push(1.0 - u));
            Ok(TrialDraw {
                shock: 0.0,
                thresholds,
            })
        })
    }

    fn run<P, L, D>(
        &self,
        engine: &MonteCarloEngine,
        pd: &P,
        lgd: &L,
        options: &SimulationOptions,
        dependence: &'static str,
        draw: D,
    ) -> Result<PortfolioSimulation, ModelError>
    where
        P: PdModel,
        L: LossModel,
        D: Fn(&mut LossRng, usize) -> Result<TrialDraw, ModelError> + Sync + Send,
    {
        self.check_size()?;
        self.check_model("PD model loans vs portfolio", pd.loan_count())?;
        self.check_model("loss model loans vs portfolio", lgd.loan_count())?;
        options.validate()?;

        let active = self.active_loans();
        info!(
            loans = self.len(),
            active = active.len(),
            trials = engine.trials(),
            seed = engine.seed(),
            dependence,
            solver = ?options.solver,
            "starting portfolio simulation"
        );

        let (result, moments) = engine.run_with_accumulator::<LoanMoments, _, ModelError>(|trial| {
            let mut rng = engine.rng_for_trial(trial);
            let TrialDraw { shock, thresholds } = draw(&mut rng, active.len())?;
            let mut residuals = vec![0.0; active.len()];
            rng.fill_normal(&mut residuals);

            let mut losses = vec![0.0; self.len()];
            let mut total = 0.0;
            let mut degenerate_solves = 0;
            for ((&loan, &target), &noise) in active.iter().zip(&thresholds).zip(&residuals) {
                let tob = self.time_on_books[loan];
                let maturity = tob + self.time_remaining[loan];
                let at_maturity: f64 = pd.probability_of_default(loan, maturity, tob, shock)?;
                if at_maturity - target < 0.0 {
                    continue;
                }

                let (default_time, clean) =
                    solve_default_time(pd, loan, tob, maturity, shock, target, options)?;
                if !clean {
                    degenerate_solves += 1;
                }
                if default_time <= maturity {
                    let loss = lgd
                        .loss_given_default(loan, noise, default_time)?
                        .max(0.0);
                    losses[loan] = loss;
                    total += loss;
                }
            }
            Ok((
                total,
                TrialLosses {
                    losses,
                    degenerate_solves,
                },
            ))
        })?;

        let mut totals = moments.totals;
        let mut cross = moments.cross;
        totals.resize(self.len(), 0.0);
        cross.resize(self.len(), 0.0);

        let ranking = RiskContribution::new(&result.distribution, TailDirection::Upper);
        let value_at_risk = ranking.value_at_risk(options.var_quantile)?;
        let expected_shortfall = ranking.expected_shortfall(options.var_quantile)?;
        let contributions = ranking.covariance_contributions(
            &cross,
            &totals,
            result.mean,
            result.variance,
            value_at_risk,
        )?;

        if moments.degenerate_solves > 0 {
            warn!(
                degenerate_solves = moments.degenerate_solves,
                "default-time solves did not converge cleanly"
            );
        }

        let error = result.standard_error();
        let (lower_bound, upper_bound) = result.confidence_interval(options.confidence_z);
        info!(
            estimate = result.mean,
            error,
            value_at_risk,
            expected_shortfall,
            "portfolio simulation complete"
        );

        Ok(PortfolioSimulation {
            trials: result.trials,
            estimate: result.mean,
            variance: result.variance,
            error,
            lower_bound,
            upper_bound,
            var_quantile: options.var_quantile,
            value_at_risk,
            expected_shortfall,
            loss_histogram: Histogram::from_values(&result.distribution, options.histogram_bins),
            contribution_histogram: Histogram::from_values(&contributions, options.histogram_bins),
            losses: result.distribution,
            contributions,
            degenerate_solves: moments.degenerate_solves,
        })
    }
}

/// Default time of `loan` for PD target `target`, and whether the solve
/// converged without fallback.
fn solve_default_time<P: PdModel>(
    pd: &P,
    loan: usize,
    tob: f64,
    maturity: f64,
    shock: f64,
    target: f64,
    options: &SimulationOptions,
) -> Result<(f64, bool), ModelError> {
    let bisect = || {
        BisectionSolver::new(options.solver_config).find_root(
            |t| {
                pd.probability_of_default(loan, t, tob, shock)
                    .unwrap_or(f64::NAN)
                    - target
            },
            tob,
            maturity,
        )
    };

    match options.solver {
        DefaultTimeSolver::Bisection => {
            let solution = finite(bisect(), loan)?;
            Ok((solution.root, solution.is_converged()))
        }
        DefaultTimeSolver::Newton => {
            let newton = NewtonRaphsonSolver::new(options.solver_config).find_root(
                |t: Dual| {
                    pd.probability_of_default(loan, t, tob, shock)
                        .unwrap_or(Dual::constant(f64::NAN))
                        - target
                },
                0.5 * (tob + maturity),
            );
            if newton.is_converged() && (tob..=maturity).contains(&newton.root) {
                return Ok((newton.root, true));
            }
            let solution = finite(bisect(), loan)?;
            Ok((solution.root, false))
        }
    }
}

fn finite(solution: RootSolution, loan: usize) -> Result<RootSolution, ModelError> {
    if solution.root.is_finite() && solution.residual.is_finite() {
        Ok(solution)
    } else {
        Err(ModelError::NumericDegeneracy(format!(
            "default time for loan {} is not finite",
            loan
        )))
    }
}
