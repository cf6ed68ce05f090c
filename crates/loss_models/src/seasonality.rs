//! Monthly seasonality of default increments.
//!
//! [`MonthlySeasonality`] holds twelve multiplicative factors (January
//! first, averaging one). A [`SeasonalityAdjuster`] turns two cumulative
//! PDs into a seasonally adjusted increment for a given calendar month.

use loss_core::types::ModelError;

use crate::pd::LinkFunction;

/// Months in a seasonal cycle.
pub const MONTHS_PER_YEAR: usize = 12;

/// Table of twelve monthly seasonal factors.
///
/// # Examples
///
/// ```
/// use loss_models::MonthlySeasonality;
///
/// let table: MonthlySeasonality = (1..=12).map(f64::from).collect();
///
/// // booked in April, 9 months later is January
/// assert_eq!(table.apply(4, 9).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySeasonality {
    factors: Vec<f64>,
}

impl MonthlySeasonality {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the factor for the next calendar month.
    pub fn add_season(&mut self, factor: f64) {
        self.factors.push(factor);
    }

    /// Stored factors.
    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Returns `true` when exactly twelve factors are stored.
    pub fn is_complete(&self) -> bool {
        self.factors.len() == MONTHS_PER_YEAR
    }

    /// Removes every factor.
    pub fn clear(&mut self) {
        self.factors.clear();
    }

    /// Checks the table holds twelve positive factors.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.is_complete() {
            return Err(ModelError::DimensionMismatch {
                context: "seasonality table",
                expected: MONTHS_PER_YEAR,
                actual: self.factors.len(),
            });
        }
        if let Some(bad) = self.factors.iter().find(|f| !(**f > 0.0)) {
            return Err(ModelError::invalid_parameter(
                "seasonality",
                format!("factors must be positive, got {}", bad),
            ));
        }
        Ok(())
    }

    /// Factor for the calendar month `months_since` months after a loan
    /// booked in `booking_month` (1 = January).
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` when the table does not hold twelve factors
    /// - `InvalidParameter` when `booking_month` is not in `1..=12`
    pub fn apply(&self, booking_month: u32, months_since: u32) -> Result<f64, ModelError> {
        if !self.is_complete() {
            return Err(ModelError::DimensionMismatch {
                context: "seasonality table",
                expected: MONTHS_PER_YEAR,
                actual: self.factors.len(),
            });
        }
        if !(1..=12).contains(&booking_month) {
            return Err(ModelError::invalid_parameter(
                "booking_month",
                format!("expected 1..=12, got {}", booking_month),
            ));
        }
        let index = (months_since as usize + booking_month as usize - 1) % MONTHS_PER_YEAR;
        Ok(self.factors[index])
    }
}

impl FromIterator<f64> for MonthlySeasonality {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}

/// Converts two cumulative PDs into a (possibly seasonal) increment.
pub trait SeasonalityAdjuster: Send + Sync {
    /// Increment between `pd1` and `pd2` for a loan booked in
    /// `booking_month`, `elapsed_months` after booking.
    fn adjust(
        &self,
        pd1: f64,
        pd2: f64,
        booking_month: u32,
        elapsed_months: u32,
    ) -> Result<f64, ModelError>;
}

/// Plain difference `pd2 − pd1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeasonality;

impl SeasonalityAdjuster for NoSeasonality {
    #[inline]
    fn adjust(&self, pd1: f64, pd2: f64, _: u32, _: u32) -> Result<f64, ModelError> {
        Ok(pd2 - pd1)
    }
}

/// Seasonal shift on the link scale by `ln(factor)`.
#[derive(Debug, Clone, Copy)]
pub struct SeasonalAdjustment<'a> {
    link: LinkFunction,
    table: &'a MonthlySeasonality,
}

impl<'a> SeasonalAdjustment<'a> {
    /// Creates an adjuster for the given link and table.
    pub fn new(link: LinkFunction, table: &'a MonthlySeasonality) -> Self {
        Self { link, table }
    }
}

impl SeasonalityAdjuster for SeasonalAdjustment<'_> {
    fn adjust(
        &self,
        pd1: f64,
        pd2: f64,
        booking_month: u32,
        elapsed_months: u32,
    ) -> Result<f64, ModelError> {
        let factor = self.table.apply(booking_month, elapsed_months)?;
        Ok(self.link.adjust_season(pd1, pd2, factor.ln()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn one_to_twelve() -> MonthlySeasonality {
        let mut table = MonthlySeasonality::new();
        for m in 1..=12 {
            table.add_season(f64::from(m));
        }
        table
    }

    #[test]
    fn test_apply_wraps_the_year() {
        let table = one_to_twelve();
        assert_eq!(table.apply(4, 1).unwrap(), 5.0);
        assert_eq!(table.apply(4, 9).unwrap(), 1.0);
        assert_eq!(table.apply(4, 21).unwrap(), 1.0);
        assert_eq!(table.apply(1, 0).unwrap(), 1.0);
        assert_eq!(table.apply(12, 0).unwrap(), 12.0);
    }

    #[test]
    fn test_apply_rejects_bad_month() {
        let table = one_to_twelve();
        assert!(table.apply(0, 3).is_err());
        assert!(table.apply(13, 3).is_err());
    }

    #[test]
    fn test_incomplete_table() {
        let table: MonthlySeasonality = [1.0, 1.0].into_iter().collect();
        assert!(matches!(
            table.apply(1, 1),
            Err(ModelError::DimensionMismatch {
                expected: 12,
                actual: 2,
                ..
            })
        ));
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_factor() {
        let mut factors = vec![1.0; 12];
        factors[5] = 0.0;
        let table: MonthlySeasonality = factors.into_iter().collect();
        assert!(matches!(
            table.validate(),
            Err(ModelError::InvalidParameter { .. })
        ));
        assert!(one_to_twelve().validate().is_ok());
    }

    #[test]
    fn test_no_seasonality_is_difference() {
        assert_relative_eq!(NoSeasonality.adjust(0.1, 0.25, 4, 7).unwrap(), 0.15);
    }

    #[test]
    fn test_neutral_table_matches_no_seasonality() {
        let flat: MonthlySeasonality = std::iter::repeat(1.0).take(12).collect();
        let adjuster = SeasonalAdjustment::new(LinkFunction::Odds, &flat);
        for elapsed in 0..24 {
            assert_relative_eq!(
                adjuster.adjust(0.02, 0.05, 6, elapsed).unwrap(),
                0.03,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_seasonal_adjustment_uses_log_factor() {
        let table = one_to_twelve();
        let adjuster = SeasonalAdjustment::new(LinkFunction::Odds, &table);
        // booked in March, 0 months later -> factor 3 -> odds tripled
        let adjusted = adjuster.adjust(0.0, 0.2, 3, 0).unwrap();
        let odds = 3.0 * 0.2 / 0.8;
        assert_relative_eq!(adjusted, odds / (1.0 + odds), epsilon = 1e-12);
    }
}
