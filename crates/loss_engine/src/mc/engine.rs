//! Monte Carlo engine and results.

use rayon::prelude::*;
use tracing::debug;

use super::config::{MonteCarloConfig, DEFAULT_SEED};
use crate::rng::LossRng;

/// Aggregate result of a Monte Carlo run.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct McResult {
    /// Number of trials.
    pub trials: usize,
    /// Sample mean.
    pub mean: f64,
    /// Unbiased sample variance (0 for a single trial).
    pub variance: f64,
    /// Outcome per trial index; empty for aggregate-only runs.
    pub distribution: Vec<f64>,
}

impl McResult {
    /// Standard error of the mean, `sqrt(variance / trials)`.
    #[inline]
    pub fn standard_error(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        (self.variance / self.trials as f64).sqrt()
    }

    /// Confidence interval `mean ± z·standard_error`.
    #[inline]
    pub fn confidence_interval(&self, z: f64) -> (f64, f64) {
        let half_width = z * self.standard_error();
        (self.mean - half_width, self.mean + half_width)
    }
}

/// Per-trial side statistics folded alongside the outcome.
///
/// Each rayon worker starts from `Default::default()`, records its trials,
/// and partial accumulators are merged pairwise.
pub trait TrialAccumulator: Default + Send {
    /// Per-trial payload produced by the simulation closure.
    type Sample: Send;

    /// Adds one trial.
    fn record(&mut self, trial: usize, outcome: f64, sample: Self::Sample);

    /// Absorbs another partial accumulator.
    fn merge(&mut self, other: Self);
}

impl TrialAccumulator for () {
    type Sample = ();

    #[inline]
    fn record(&mut self, _: usize, _: f64, _: ()) {}

    #[inline]
    fn merge(&mut self, _: ()) {}
}

#[derive(Clone, Copy, Debug, Default)]
struct Moments {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    #[inline]
    fn push(mut self, x: f64) -> Self {
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
        self
    }

    #[inline]
    fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            sum_sq: self.sum_sq + other.sum_sq,
        }
    }

    fn into_result(self, distribution: Vec<f64>) -> McResult {
        let m = self.count as f64;
        let mean = if self.count == 0 { 0.0 } else { self.sum / m };
        let variance = if self.count < 2 {
            0.0
        } else {
            ((self.sum_sq - mean * mean * m) / (m - 1.0)).max(0.0)
        };
        McResult {
            trials: self.count,
            mean,
            variance,
            distribution,
        }
    }
}

/// Rayon-parallel Monte Carlo engine.
///
/// # Examples
///
/// ```rust
/// use loss_engine::mc::{MonteCarloConfig, MonteCarloEngine};
///
/// let engine = MonteCarloEngine::new(
///     MonteCarloConfig::builder().trials(20_000).seed(3).build().unwrap(),
/// );
///
/// // E[Z²] = 1 for a standard normal
/// let result = engine.simulate(|trial| {
///     let z = engine.rng_for_trial(trial).gen_normal();
///     z * z
/// });
/// assert!((result.mean - 1.0).abs() < 0.05);
/// ```
#[derive(Clone, Debug)]
pub struct MonteCarloEngine {
    config: MonteCarloConfig,
}

impl MonteCarloEngine {
    /// Creates an engine from a validated configuration.
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Number of trials.
    #[inline]
    pub fn trials(&self) -> usize {
        self.config.trials()
    }

    /// Base seed (the configured seed or [`DEFAULT_SEED`]).
    #[inline]
    pub fn seed(&self) -> u64 {
        self.config.seed().unwrap_or(DEFAULT_SEED)
    }

    /// Independent random stream for `trial`.
    #[inline]
    pub fn rng_for_trial(&self, trial: usize) -> LossRng {
        LossRng::for_trial(self.seed(), trial as u64)
    }

    /// Runs every trial and keeps the aggregate moments only.
    pub fn simulate<F>(&self, f: F) -> McResult
    where
        F: Fn(usize) -> f64 + Sync + Send,
    {
        debug!(trials = self.trials(), seed = self.seed(), "Monte Carlo run (aggregate)");
        (0..self.trials())
            .into_par_iter()
            .fold(Moments::default, |acc, trial| acc.push(f(trial)))
            .reduce(Moments::default, Moments::merge)
            .into_result(Vec::new())
    }

    /// Runs every trial and keeps the outcome of each in its trial slot.
    pub fn simulate_distribution<F>(&self, f: F) -> McResult
    where
        F: Fn(usize) -> f64 + Sync + Send,
    {
        debug!(trials = self.trials(), seed = self.seed(), "Monte Carlo run (distribution)");
        let distribution: Vec<f64> = (0..self.trials()).into_par_iter().map(&f).collect();
        Self::moments_of(&distribution).into_result(distribution)
    }

    /// Fallible [`simulate`](Self::simulate): the first error aborts the run.
    pub fn try_simulate<F, E>(&self, f: F) -> Result<McResult, E>
    where
        F: Fn(usize) -> Result<f64, E> + Sync + Send,
        E: Send,
    {
        let moments = (0..self.trials())
            .into_par_iter()
            .try_fold(Moments::default, |acc, trial| f(trial).map(|x| acc.push(x)))
            .try_reduce(Moments::default, |a, b| Ok(a.merge(b)))?;
        Ok(moments.into_result(Vec::new()))
    }

    /// Fallible [`simulate_distribution`](Self::simulate_distribution).
    pub fn try_simulate_distribution<F, E>(&self, f: F) -> Result<McResult, E>
    where
        F: Fn(usize) -> Result<f64, E> + Sync + Send,
        E: Send,
    {
        let distribution = (0..self.trials())
            .into_par_iter()
            .map(&f)
            .collect::<Result<Vec<f64>, E>>()?;
        Ok(Self::moments_of(&distribution).into_result(distribution))
    }

    /// Runs every trial, keeping outcomes and folding each trial's side
    /// sample into a [`TrialAccumulator`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loss_engine::mc::{MonteCarloConfig, MonteCarloEngine, TrialAccumulator};
    ///
    /// #[derive(Default)]
    /// struct Cross(f64);
    ///
    /// impl TrialAccumulator for Cross {
    ///     type Sample = f64;
    ///     fn record(&mut self, _: usize, outcome: f64, sample: f64) {
    ///         self.0 += outcome * sample;
    ///     }
    ///     fn merge(&mut self, other: Self) {
    ///         self.0 += other.0;
    ///     }
    /// }
    ///
    /// let engine = MonteCarloEngine::new(MonteCarloConfig::builder().trials(4).build().unwrap());
    /// let (result, cross) = engine
    ///     .run_with_accumulator::<Cross, _, ()>(|trial| Ok((trial as f64, 1.0)))
    ///     .unwrap();
    ///
    /// assert_eq!(result.mean, 1.5);
    /// assert_eq!(cross.0, 6.0);
    /// ```
    pub fn run_with_accumulator<A, F, E>(&self, f: F) -> Result<(McResult, A), E>
    where
        A: TrialAccumulator,
        F: Fn(usize) -> Result<(f64, A::Sample), E> + Sync + Send,
        E: Send,
    {
        let m = self.trials();
        debug!(trials = m, seed = self.seed(), "Monte Carlo run (accumulator)");

        let (moments, outcomes, accumulator) = (0..m)
            .into_par_iter()
            .try_fold(
                || (Moments::default(), Vec::new(), A::default()),
                |(moments, mut outcomes, mut acc), trial| {
                    let (value, sample) = f(trial)?;
                    outcomes.push((trial, value));
                    acc.record(trial, value, sample);
                    Ok((moments.push(value), outcomes, acc))
                },
            )
            .try_reduce(
                || (Moments::default(), Vec::new(), A::default()),
                |(m1, mut o1, mut a1), (m2, o2, a2)| {
                    o1.extend(o2);
                    a1.merge(a2);
                    Ok((m1.merge(m2), o1, a1))
                },
            )?;

        let mut distribution = vec![0.0; m];
        for (trial, value) in outcomes {
            distribution[trial] = value;
        }
        Ok((moments.into_result(distribution), accumulator))
    }

    fn moments_of(values: &[f64]) -> Moments {
        values
            .par_iter()
            .fold(Moments::default, |acc, &x| acc.push(x))
            .reduce(Moments::default, Moments::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn engine(trials: usize) -> MonteCarloEngine {
        MonteCarloEngine::new(
            MonteCarloConfig::builder()
                .trials(trials)
                .seed(2024)
                .build()
                .unwrap(),
        )
    }

    // ========================================
    // Moments
    // ========================================

    #[test]
    fn test_mean_and_variance_of_one_to_five() {
        let result = engine(5).simulate(|trial| (trial + 1) as f64);
        assert_relative_eq!(result.mean, 3.0);
        assert_relative_eq!(result.variance, 2.5);
        assert!(result.distribution.is_empty());
    }

    #[test]
    fn test_single_trial_has_zero_variance() {
        let result = engine(1).simulate_distribution(|_| 4.0);
        assert_eq!(result.mean, 4.0);
        assert_eq!(result.variance, 0.0);
        assert_eq!(result.standard_error(), 0.0);
    }

    #[test]
    fn test_standard_error_and_interval() {
        let result = McResult {
            trials: 100,
            mean: 10.0,
            variance: 4.0,
            distribution: Vec::new(),
        };
        assert_relative_eq!(result.standard_error(), 0.2);
        let (lo, hi) = result.confidence_interval(1.96);
        assert_relative_eq!(lo, 10.0 - 0.392);
        assert_relative_eq!(hi, 10.0 + 0.392);
    }

    // ========================================
    // Distribution slots and reproducibility
    // ========================================

    #[test]
    fn test_distribution_is_indexed_by_trial() {
        let result = engine(1000).simulate_distribution(|trial| (trial * trial) as f64);
        for (trial, value) in result.distribution.iter().enumerate() {
            assert_eq!(*value, (trial * trial) as f64);
        }
    }

    #[test]
    fn test_per_trial_streams_are_reproducible() {
        let e = engine(2000);
        let a = e.simulate_distribution(|t| e.rng_for_trial(t).gen_normal());
        let b = e.simulate_distribution(|t| e.rng_for_trial(t).gen_normal());
        assert_eq!(a.distribution, b.distribution);
        assert_relative_eq!(a.mean, b.mean, epsilon = 1e-12);
    }

    #[test]
    fn test_aggregate_and_distribution_agree() {
        let e = engine(5000);
        let f = |t: usize| e.rng_for_trial(t).gen_uniform();
        let aggregate = e.simulate(f);
        let full = e.simulate_distribution(f);
        assert_relative_eq!(aggregate.mean, full.mean, epsilon = 1e-12);
        assert_relative_eq!(aggregate.variance, full.variance, epsilon = 1e-10);
    }

    // ========================================
    // Fallible runs and accumulators
    // ========================================

    #[test]
    fn test_try_simulate_propagates_error() {
        let result = engine(100).try_simulate(|trial| {
            if trial == 57 {
                Err("trial failed")
            } else {
                Ok(1.0)
            }
        });
        assert_eq!(result, Err("trial failed"));

        let ok = engine(10).try_simulate_distribution(|_| Ok::<f64, ()>(2.0)).unwrap();
        assert_eq!(ok.distribution, vec![2.0; 10]);
    }

    #[derive(Default)]
    struct PerLoanTotals {
        totals: Vec<f64>,
        cross: Vec<f64>,
    }

    impl TrialAccumulator for PerLoanTotals {
        type Sample = Vec<f64>;

        fn record(&mut self, _: usize, outcome: f64, sample: Vec<f64>) {
            if self.totals.is_empty() {
                self.totals = vec![0.0; sample.len()];
                self.cross = vec![0.0; sample.len()];
            }
            for (i, loss) in sample.into_iter().enumerate() {
                self.totals[i] += loss;
                self.cross[i] += loss * outcome;
            }
        }

        fn merge(&mut self, other: Self) {
            if self.totals.is_empty() {
                *self = other;
                return;
            }
            for i in 0..other.totals.len() {
                self.totals[i] += other.totals[i];
                self.cross[i] += other.cross[i];
            }
        }
    }

    #[test]
    fn test_run_with_accumulator() {
        let (result, acc) = engine(100)
            .run_with_accumulator::<PerLoanTotals, _, ()>(|trial| {
                let losses = vec![1.0, trial as f64];
                Ok((losses.iter().sum(), losses))
            })
            .unwrap();

        // outcomes are 1 + trial
        assert_relative_eq!(result.mean, 50.5);
        assert_eq!(result.distribution[10], 11.0);
        assert_relative_eq!(acc.totals[0], 100.0);
        assert_relative_eq!(acc.totals[1], 4950.0);
        let expected_cross: f64 = (0..100).map(|t| (t as f64) * (1.0 + t as f64)).sum();
        assert_relative_eq!(acc.cross[1], expected_cross);
    }
}
