//! Loan portfolio and its loss computations.
//!
//! A [`Portfolio`] stores one entry per loan, in the same order as the
//! model attribute rows:
//!
//! - months on books as of today
//! - months remaining to maturity
//! - booking month (1 = January)
//! - whether the loan has already defaulted
//!
//! Deterministic expected-loss curves live in [`curves`], the Monte Carlo
//! loss distribution in [`simulation`].

pub mod curves;
pub mod simulation;

pub use curves::LossCurves;
pub use simulation::{DefaultTimeSolver, PortfolioSimulation, SimulationOptions};

use loss_core::types::ModelError;

/// Contractual life of a loan in months.
pub const TOTAL_LENGTH_ON_BOOKS: usize = 72;

/// Loan-level portfolio data.
///
/// # Examples
///
/// ```
/// use loss_risk::Portfolio;
///
/// let mut portfolio = Portfolio::new();
/// portfolio.add_loan(12.0, 60.0, 4, false);
/// portfolio.add_loan(30.0, 42.0, 11, true);
///
/// assert_eq!(portfolio.len(), 2);
/// assert_eq!(portfolio.active_loans(), vec![0]);
/// assert!(portfolio.check_size().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    time_on_books: Vec<f64>,
    time_remaining: Vec<f64>,
    booking_month: Vec<u32>,
    defaulted: Vec<bool>,
    total_length_on_books: usize,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::with_length_on_books(TOTAL_LENGTH_ON_BOOKS)
    }
}

impl Portfolio {
    /// Creates an empty portfolio of 72-month loans.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty portfolio with a custom contractual life.
    pub fn with_length_on_books(total_length_on_books: usize) -> Self {
        Self {
            time_on_books: Vec::new(),
            time_remaining: Vec::new(),
            booking_month: Vec::new(),
            defaulted: Vec::new(),
            total_length_on_books,
        }
    }

    /// Appends months on books.
    pub fn add_time_on_books(&mut self, months: f64) {
        self.time_on_books.push(months);
    }

    /// Appends months remaining to maturity.
    pub fn add_time_remaining(&mut self, months: f64) {
        self.time_remaining.push(months);
    }

    /// Appends the booking month.
    pub fn add_booking_month(&mut self, month: u32) {
        self.booking_month.push(month);
    }

    /// Appends a default indicator.
    pub fn add_default_indicator(&mut self, defaulted: bool) {
        self.defaulted.push(defaulted);
    }

    /// Appends a complete loan.
    pub fn add_loan(
        &mut self,
        time_on_books: f64,
        time_remaining: f64,
        booking_month: u32,
        defaulted: bool,
    ) {
        self.add_time_on_books(time_on_books);
        self.add_time_remaining(time_remaining);
        self.add_booking_month(booking_month);
        self.add_default_indicator(defaulted);
    }

    /// Number of loans (by months on books).
    #[inline]
    pub fn len(&self) -> usize {
        self.time_on_books.len()
    }

    /// Returns `true` when no loans are loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time_on_books.is_empty()
    }

    /// Contractual life in months.
    #[inline]
    pub fn total_length_on_books(&self) -> usize {
        self.total_length_on_books
    }

    /// Months on books per loan.
    pub fn time_on_books(&self) -> &[f64] {
        &self.time_on_books
    }

    /// Months remaining per loan.
    pub fn time_remaining(&self) -> &[f64] {
        &self.time_remaining
    }

    /// Booking month per loan.
    pub fn booking_months(&self) -> &[u32] {
        &self.booking_month
    }

    /// Default indicator per loan.
    pub fn default_indicators(&self) -> &[bool] {
        &self.defaulted
    }

    /// Indices of loans that have not defaulted.
    pub fn active_loans(&self) -> Vec<usize> {
        self.defaulted
            .iter()
            .enumerate()
            .filter_map(|(i, d)| (!d).then_some(i))
            .collect()
    }

    /// Clears every loan vector.
    pub fn reset_all(&mut self) {
        self.time_on_books.clear();
        self.time_remaining.clear();
        self.booking_month.clear();
        self.defaulted.clear();
    }

    /// Checks every loan vector has the same length.
    pub fn check_size(&self) -> Result<(), ModelError> {
        let expected = self.time_on_books.len();
        for (context, actual) in [
            ("time remaining vs time on books", self.time_remaining.len()),
            ("booking month vs time on books", self.booking_month.len()),
            ("default indicator vs time on books", self.defaulted.len()),
        ] {
            if actual != expected {
                return Err(ModelError::DimensionMismatch {
                    context,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn check_model(&self, context: &'static str, loans: usize) -> Result<(), ModelError> {
        if loans != self.len() {
            return Err(ModelError::DimensionMismatch {
                context,
                expected: self.len(),
                actual: loans,
            });
        }
        Ok(())
    }

    fn ensure_loans(&self) -> Result<(), ModelError> {
        if self.is_empty() {
            return Err(ModelError::NotInitialized("portfolio has no loans"));
        }
        Ok(())
    }
}

/// Whole months covered by a fractional span (`ceil`, 0 when non-positive).
#[inline]
fn whole_months(span: f64) -> usize {
    if span > 0.0 {
        span.ceil() as usize
    } else {
        0
    }
}

/// Calendar offset fed to the seasonality table.
#[inline]
fn elapsed_months(t: f64) -> u32 {
    if t > 0.0 {
        t.floor() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_size_reports_mismatch() {
        let mut portfolio = Portfolio::new();
        portfolio.add_loan(3.0, 69.0, 1, false);
        portfolio.add_time_on_books(4.0);

        match portfolio.check_size() {
            Err(ModelError::DimensionMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_reset_all_keeps_length_on_books() {
        let mut portfolio = Portfolio::with_length_on_books(60);
        portfolio.add_loan(3.0, 57.0, 1, true);
        portfolio.reset_all();
        assert!(portfolio.is_empty());
        assert_eq!(portfolio.total_length_on_books(), 60);
        assert!(portfolio.check_size().is_ok());
    }

    #[test]
    fn test_whole_months() {
        assert_eq!(whole_months(3.0), 3);
        assert_eq!(whole_months(2.5), 3);
        assert_eq!(whole_months(0.0), 0);
        assert_eq!(whole_months(-1.0), 0);
        assert_eq!(elapsed_months(7.9), 7);
    }
}
