//! Parameter loading from an external source.
//!
//! A [`ParameterSource`] is the contract of the parameter store (typically a
//! database adapter). [`SimulationContext::load`] fetches the model
//! parameters concurrently, then the loan records, and finalises the
//! context.

use loss_core::types::ModelError;
use loss_models::lgd::FIXED_ATTRIBUTE_COLUMNS;
use thiserror::Error;
use tracing::debug;

use crate::context::SimulationContext;

/// Failure reported by a parameter source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// A parameter query failed.
    #[error("Query '{query}' failed: {message}")]
    Query {
        /// Name of the failing query.
        query: &'static str,
        /// Source-specific message.
        message: String,
    },

    /// A returned row could not be interpreted.
    #[error("Malformed row {row}: {message}")]
    Malformed {
        /// Row index within the result set.
        row: usize,
        /// What is wrong with it.
        message: String,
    },
}

/// Errors from [`SimulationContext::load`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source failed.
    #[error("Parameter source error: {0}")]
    Source(#[from] SourceError),

    /// The loaded parameters are inconsistent.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Estimated covariate of the PD model.
#[derive(Debug, Clone, PartialEq)]
pub struct CovariateEstimate {
    /// Column name of the covariate in the loan records.
    pub name: String,
    /// Fitted coefficient.
    pub coefficient: f64,
    /// Estimation-sample mean.
    pub mean: f64,
}

/// One loan as returned by the source.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRecord {
    /// Months on books as of today.
    pub time_on_books: f64,
    /// Booking month (1 = January).
    pub booking_month: u32,
    /// Months remaining to maturity.
    pub time_remaining: f64,
    /// Whether the loan has already defaulted.
    pub defaulted: bool,
    /// PD covariates, in the order of [`ParameterSource::pd_coefficients`].
    pub pd_attributes: Vec<f64>,
    /// Loss covariates, in the order of [`ParameterSource::lgd_coefficients`].
    pub lgd_attributes: Vec<f64>,
    /// Annual percentage rate.
    pub apr: f64,
    /// Original amount financed.
    pub amount_financed: f64,
    /// Collateral value at booking.
    pub collateral_value: f64,
}

/// Totals of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadSummary {
    /// Loans loaded.
    pub loans: usize,
    /// Loans already defaulted.
    pub defaulted: usize,
    /// Sum of amounts financed.
    pub balance: f64,
}

/// Store of fitted model parameters and loan records.
///
/// Implementations must be callable from several threads at once.
pub trait ParameterSource: Sync {
    /// Spline knots of the PD model.
    fn knots(&self) -> Result<Vec<f64>, SourceError>;

    /// Spline coefficients of the PD model.
    fn gamma(&self) -> Result<Vec<f64>, SourceError>;

    /// Covariate coefficients and means of the PD model.
    fn pd_coefficients(&self) -> Result<Vec<CovariateEstimate>, SourceError>;

    /// Named covariate coefficients of the loss model.
    fn lgd_coefficients(&self) -> Result<Vec<(String, f64)>, SourceError>;

    /// Named recovery parameters of the loss model (`scalar1`, `tau`, ...).
    fn lgd_parameters(&self) -> Result<Vec<(String, f64)>, SourceError>;

    /// Residual standard error of the loss model.
    fn lgd_std_error(&self) -> Result<f64, SourceError>;

    /// Twelve monthly seasonal factors, January first.
    fn seasonality(&self) -> Result<Vec<f64>, SourceError>;

    /// Loan records carrying the named covariates.
    fn loan_records(
        &self,
        pd_covariates: &[String],
        lgd_covariates: &[String],
    ) -> Result<Vec<LoanRecord>, SourceError>;
}

impl SimulationContext {
    /// Replaces the context contents with data from `source` and finalises
    /// it with [`init`](Self::init).
    ///
    /// Model parameters are fetched concurrently; loan records are fetched
    /// once the covariate names are known.
    pub fn load<S: ParameterSource>(&mut self, source: &S) -> Result<LoadSummary, LoadError> {
        self.reset_all();

        let ((knots, gamma), ((pd_coefficients, lgd_coefficients), ((lgd_parameters, std_error), season))) =
            rayon::join(
                || rayon::join(|| source.knots(), || source.gamma()),
                || {
                    rayon::join(
                        || rayon::join(|| source.pd_coefficients(), || source.lgd_coefficients()),
                        || {
                            rayon::join(
                                || rayon::join(|| source.lgd_parameters(), || source.lgd_std_error()),
                                || source.seasonality(),
                            )
                        },
                    )
                },
            );
        let (knots, gamma) = (knots?, gamma?);
        let (pd_coefficients, lgd_coefficients) = (pd_coefficients?, lgd_coefficients?);
        let (lgd_parameters, std_error, season) = (lgd_parameters?, std_error?, season?);
        debug!(
            knots = knots.len(),
            pd_covariates = pd_coefficients.len(),
            lgd_covariates = lgd_coefficients.len(),
            "model parameters fetched"
        );

        let pd = self.pd_model_mut();
        for knot in knots.iter().copied() {
            pd.add_knot(knot);
        }
        for g in gamma {
            pd.add_gamma(g);
        }
        for estimate in &pd_coefficients {
            pd.add_coefficient(estimate.coefficient);
            pd.add_mean(estimate.mean);
        }

        let lgd = self.lgd_model_mut();
        for (_, coefficient) in &lgd_coefficients {
            lgd.add_coefficient(*coefficient);
        }
        for (name, value) in &lgd_parameters {
            lgd.set_parameter(name, *value)?;
        }
        lgd.set_std_error(std_error);

        for factor in season {
            self.seasonality_mut().add_season(factor);
        }

        let pd_names: Vec<String> = pd_coefficients.iter().map(|e| e.name.clone()).collect();
        let lgd_names: Vec<String> = lgd_coefficients.iter().map(|(n, _)| n.clone()).collect();
        let records = source.loan_records(&pd_names, &lgd_names)?;

        let mut summary = LoadSummary::default();
        for (row, record) in records.into_iter().enumerate() {
            if record.pd_attributes.len() != pd_names.len() {
                return Err(SourceError::Malformed {
                    row,
                    message: format!(
                        "expected {} PD covariates, got {}",
                        pd_names.len(),
                        record.pd_attributes.len()
                    ),
                }
                .into());
            }
            if record.lgd_attributes.len() != lgd_names.len() {
                return Err(SourceError::Malformed {
                    row,
                    message: format!(
                        "expected {} loss covariates, got {}",
                        lgd_names.len(),
                        record.lgd_attributes.len()
                    ),
                }
                .into());
            }
            self.add_record(&record)?;
            summary.loans += 1;
            summary.defaulted += usize::from(record.defaulted);
            summary.balance += record.amount_financed;
        }

        self.init()?;
        debug!(
            loans = summary.loans,
            defaulted = summary.defaulted,
            balance = summary.balance,
            "loan records loaded"
        );
        Ok(summary)
    }

    fn add_record(&mut self, record: &LoanRecord) -> Result<(), ModelError> {
        self.pd_model_mut()
            .add_loan_attributes(&record.pd_attributes)?;
        let fixed: [f64; FIXED_ATTRIBUTE_COLUMNS] =
            [record.apr, record.amount_financed, record.collateral_value];
        let row: Vec<f64> = record.lgd_attributes.iter().chain(&fixed).copied().collect();
        self.lgd_model_mut().add_loan_attributes(&row)?;
        self.portfolio_mut().add_loan(
            record.time_on_books,
            record.time_remaining,
            record.booking_month,
            record.defaulted,
        );
        Ok(())
    }
}
