//! Tail risk measures and loan-level risk contributions.
//!
//! Given the simulated portfolio losses `L₁…L_m`, [`RiskContribution`]
//! ranks the outcomes once and answers VaR and Expected Shortfall queries.
//! [`RiskContribution::covariance_contributions`] splits the VaR across
//! loans with the variance-covariance approximation
//!
//! ```text
//! rc_i = E[X_i] + Cov(X_i, L)·(VaR − E[L]) / Var(L)
//! ```
//!
//! which sums to VaR because `Σ Cov(X_i, L) = Var(L)`.

use loss_core::types::ModelError;

/// Which end of the distribution holds the losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TailDirection {
    /// Losses are large positive values; ranks ascend.
    #[default]
    Upper,
    /// Losses are large negative values; ranks descend.
    Lower,
}

/// Stable ranking of `values`: `result[k]` is the index of the k-th outcome.
///
/// # Examples
///
/// ```
/// use loss_risk::contribution::{sort_indices, TailDirection};
///
/// let idx = sort_indices(&[4.0, 3.0, 5.0, 8.0, 1.0], TailDirection::Upper);
/// assert_eq!(idx, vec![4, 1, 0, 2, 3]);
/// ```
pub fn sort_indices(values: &[f64], direction: TailDirection) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    match direction {
        TailDirection::Upper => idx.sort_by(|&a, &b| values[a].total_cmp(&values[b])),
        TailDirection::Lower => idx.sort_by(|&a, &b| values[b].total_cmp(&values[a])),
    }
    idx
}

/// Risk measures over a borrowed outcome vector.
#[derive(Debug, Clone)]
pub struct RiskContribution<'a> {
    outcomes: &'a [f64],
    ranking: Vec<usize>,
    direction: TailDirection,
}

impl<'a> RiskContribution<'a> {
    /// Ranks `outcomes` in the given direction.
    pub fn new(outcomes: &'a [f64], direction: TailDirection) -> Self {
        Self {
            outcomes,
            ranking: sort_indices(outcomes, direction),
            direction,
        }
    }

    /// Number of outcomes.
    #[inline]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns `true` when there are no outcomes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Tail direction used for the ranking.
    #[inline]
    pub fn direction(&self) -> TailDirection {
        self.direction
    }

    /// Outcome indices in rank order.
    #[inline]
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    fn tail_start(&self, q: f64) -> Result<usize, ModelError> {
        if !(0.0..1.0).contains(&q) {
            return Err(ModelError::invalid_parameter(
                "quantile",
                format!("must lie in [0, 1), got {}", q),
            ));
        }
        if self.is_empty() {
            return Err(ModelError::NotInitialized("no outcomes to rank"));
        }
        Ok(((q * self.len() as f64).floor() as usize).min(self.len() - 1))
    }

    /// Value-at-Risk: the outcome at rank `floor(q·m)`.
    pub fn value_at_risk(&self, q: f64) -> Result<f64, ModelError> {
        let k = self.tail_start(q)?;
        Ok(self.outcomes[self.ranking[k]])
    }

    /// Expected Shortfall: the mean outcome over ranks `floor(q·m)..m`.
    pub fn expected_shortfall(&self, q: f64) -> Result<f64, ModelError> {
        let k = self.tail_start(q)?;
        let tail = &self.ranking[k..];
        Ok(tail.iter().map(|&i| self.outcomes[i]).sum::<f64>() / tail.len() as f64)
    }

    /// Loan-level contributions to `value_at_risk`.
    ///
    /// `cross[i]` is `Σ_trials X_i·L` and `asset_totals[i]` is
    /// `Σ_trials X_i`; `mean` and `variance` are the portfolio moments of
    /// the same trials. With zero variance every loan contributes its mean.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `cross` and `asset_totals` differ in length.
    pub fn covariance_contributions(
        &self,
        cross: &[f64],
        asset_totals: &[f64],
        mean: f64,
        variance: f64,
        value_at_risk: f64,
    ) -> Result<Vec<f64>, ModelError> {
        if cross.len() != asset_totals.len() {
            return Err(ModelError::DimensionMismatch {
                context: "cross moments vs asset totals",
                expected: asset_totals.len(),
                actual: cross.len(),
            });
        }
        let m = self.len() as f64;
        if m < 1.0 {
            return Err(ModelError::NotInitialized("no outcomes to rank"));
        }
        let beta = if variance > 0.0 && m > 1.0 {
            (value_at_risk - mean) / variance
        } else {
            0.0
        };
        let denom = (m - 1.0).max(1.0);

        Ok(cross
            .iter()
            .zip(asset_totals)
            .map(|(&c, &total)| {
                let covariance = (c - total * mean) / denom;
                total / m + covariance * beta
            })
            .collect())
    }
}
