//! Deterministic expected-loss curves.
//!
//! Two bucketings are produced from the same PD increments:
//!
//! - **as-of**: bucket `k` holds the increment between months `k − 1` and
//!   `k` from today, for loans that have not defaulted
//! - **origination**: bucket `k` holds the increment between months `k − 1`
//!   and `k` since booking, for every loan
//!
//! Each increment is passed through a [`SeasonalityAdjuster`]. Cumulative
//! curves floor negative buckets at zero before summing.

use loss_core::types::ModelError;
use loss_models::{LossModel, PdModel, SeasonalityAdjuster};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{elapsed_months, whole_months, Portfolio};

/// Cumulative loss curves by months since origination and months from today.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LossCurves {
    /// Cumulative curve by months since booking (`total_length_on_books + 1` points).
    pub origination: Vec<f64>,
    /// Cumulative curve by months from today (`total_length_on_books − min months on books` points).
    pub as_of: Vec<f64>,
}

impl Portfolio {
    /// Cumulative unit (default count) loss curves, normalised by the
    /// number of loans.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` when the loan vectors or the PD model disagree
    ///   in size
    /// - `NotInitialized` for an empty portfolio
    /// - any PD or seasonality error
    pub fn cumulative_unit_loss<P, A>(&self, pd: &P, season: &A) -> Result<LossCurves, ModelError>
    where
        P: PdModel,
        A: SeasonalityAdjuster,
    {
        self.check_size()?;
        self.ensure_loans()?;
        self.check_model("PD model loans vs portfolio", pd.loan_count())?;
        info!(loans = self.len(), "computing cumulative unit loss curves");

        self.loss_curves(pd, season, |_, _| Ok(1.0), self.len() as f64)
    }

    /// Cumulative net (dollar) loss curves, each increment weighted by the
    /// expected loss at the end of its month and normalised by `balance`.
    ///
    /// # Errors
    ///
    /// As [`cumulative_unit_loss`](Self::cumulative_unit_loss), plus
    /// `InvalidParameter` when `balance` is not positive.
    pub fn cumulative_net_loss<P, L, A>(
        &self,
        balance: f64,
        pd: &P,
        lgd: &L,
        season: &A,
    ) -> Result<LossCurves, ModelError>
    where
        P: PdModel,
        L: LossModel,
        A: SeasonalityAdjuster,
    {
        self.check_size()?;
        self.ensure_loans()?;
        self.check_model("PD model loans vs portfolio", pd.loan_count())?;
        self.check_model("loss model loans vs portfolio", lgd.loan_count())?;
        if !(balance > 0.0) || !balance.is_finite() {
            return Err(ModelError::invalid_parameter(
                "balance",
                format!("must be positive, got {}", balance),
            ));
        }
        info!(loans = self.len(), balance, "computing cumulative net loss curves");

        self.loss_curves(
            pd,
            season,
            |loan, t| lgd.loss_given_default(loan, 0.0, t),
            balance,
        )
    }

    /// Expected cumulative defaults over the next `months_out` months (not
    /// normalised).
    pub fn unit_loss_forecast<P, A>(
        &self,
        pd: &P,
        season: &A,
        months_out: usize,
    ) -> Result<Vec<f64>, ModelError>
    where
        P: PdModel,
        A: SeasonalityAdjuster,
    {
        self.check_size()?;
        self.check_model("PD model loans vs portfolio", pd.loan_count())?;
        info!(loans = self.len(), months_out, "computing unit loss forecast");

        let buckets = self.as_of_buckets(pd, season, months_out, |_, _| Ok(1.0))?;
        Ok(cumulate(buckets, months_out, 1.0))
    }

    /// Expected cumulative dollar losses over the next `months_out` months
    /// (not normalised).
    pub fn net_loss_forecast<P, L, A>(
        &self,
        pd: &P,
        lgd: &L,
        season: &A,
        months_out: usize,
    ) -> Result<Vec<f64>, ModelError>
    where
        P: PdModel,
        L: LossModel,
        A: SeasonalityAdjuster,
    {
        self.check_size()?;
        self.check_model("PD model loans vs portfolio", pd.loan_count())?;
        self.check_model("loss model loans vs portfolio", lgd.loan_count())?;
        info!(loans = self.len(), months_out, "computing net loss forecast");

        let buckets = self.as_of_buckets(pd, season, months_out, |loan, t| {
            lgd.loss_given_default(loan, 0.0, t)
        })?;
        Ok(cumulate(buckets, months_out, 1.0))
    }

    /// Expected defaults per month from today (raw buckets, not cumulative),
    /// truncated to the life left on the most seasoned active loan.
    pub fn unit_loss_increments<P, A>(&self, pd: &P, season: &A) -> Result<Vec<f64>, ModelError>
    where
        P: PdModel,
        A: SeasonalityAdjuster,
    {
        self.check_size()?;
        self.check_model("PD model loans vs portfolio", pd.loan_count())?;

        let length = self.total_length_on_books;
        let min_tob = self.min_time_on_books(self.active_loans());
        let mut buckets = self.as_of_buckets(pd, season, length, |_, _| Ok(1.0))?;
        buckets.truncate(length.saturating_sub(min_tob));
        Ok(buckets)
    }

    fn loss_curves<P, A, W>(
        &self,
        pd: &P,
        season: &A,
        weight: W,
        norm: f64,
    ) -> Result<LossCurves, ModelError>
    where
        P: PdModel,
        A: SeasonalityAdjuster,
        W: Fn(usize, f64) -> Result<f64, ModelError>,
    {
        let length = self.total_length_on_books;
        let min_tob = self.min_time_on_books(0..self.len());

        let as_of = self.as_of_buckets(pd, season, length, &weight)?;
        let origination = self.origination_buckets(pd, season, &weight)?;

        Ok(LossCurves {
            origination: cumulate(origination, length + 1, norm),
            as_of: cumulate(as_of, length.saturating_sub(min_tob), norm),
        })
    }

    fn as_of_buckets<P, A, W>(
        &self,
        pd: &P,
        season: &A,
        len: usize,
        weight: W,
    ) -> Result<Vec<f64>, ModelError>
    where
        P: PdModel,
        A: SeasonalityAdjuster,
        W: Fn(usize, f64) -> Result<f64, ModelError>,
    {
        let mut buckets = vec![0.0; len];
        for loan in self.active_loans() {
            let tob = self.time_on_books[loan];
            let steps = whole_months(self.time_remaining[loan].min(len as f64) - 1.0);
            for i in 0..steps {
                let t = tob + i as f64;
                let pd1: f64 = pd.probability_of_default(loan, t, tob, 0.0)?;
                let pd2: f64 = pd.probability_of_default(loan, t + 1.0, tob, 0.0)?;
                let increment =
                    season.adjust(pd1, pd2, self.booking_month[loan], elapsed_months(t))?;
                buckets[i + 1] += increment * weight(loan, t + 1.0)?;
            }
        }
        Ok(buckets)
    }

    fn origination_buckets<P, A, W>(
        &self,
        pd: &P,
        season: &A,
        weight: W,
    ) -> Result<Vec<f64>, ModelError>
    where
        P: PdModel,
        A: SeasonalityAdjuster,
        W: Fn(usize, f64) -> Result<f64, ModelError>,
    {
        let length = self.total_length_on_books;
        let mut buckets = vec![0.0; length + 1];
        for loan in 0..self.len() {
            for i in 0..length {
                let t = i as f64;
                let pd1: f64 = pd.probability_of_default(loan, t, 0.0, 0.0)?;
                let pd2: f64 = pd.probability_of_default(loan, t + 1.0, 0.0, 0.0)?;
                let increment = season.adjust(pd1, pd2, self.booking_month[loan], i as u32)?;
                buckets[i + 1] += increment * weight(loan, t + 1.0)?;
            }
        }
        Ok(buckets)
    }

    /// Smallest whole months on books among `loans`, capped at the contractual life.
    fn min_time_on_books(&self, loans: impl IntoIterator<Item = usize>) -> usize {
        loans
            .into_iter()
            .map(|loan| elapsed_months(self.time_on_books[loan]) as usize)
            .fold(self.total_length_on_books, usize::min)
    }
}

/// Running sum of the first `keep` buckets, negatives floored, divided by `norm`.
fn cumulate(mut buckets: Vec<f64>, keep: usize, norm: f64) -> Vec<f64> {
    buckets.truncate(keep);
    let mut running = 0.0;
    for value in &mut buckets {
        running += value.max(0.0);
        *value = running / norm;
    }
    buckets
}
