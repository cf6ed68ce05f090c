//! Exposure-given-default model.
//!
//! Dollar loss at default is the outstanding amortised balance minus the
//! recovered collateral value, plus a residual term:
//!
//! ```text
//! EGD(t) = B·(1 − (r^t' − 1)/(r^N − 1))
//!        − C·exp((offset + s₃)·t + s₁) + s₂·d/(1 + d)
//!        + σ·ε
//! r = APR/12 + 1,  t' = t − 3 (for t > 3),  d = exp(−(t − τ)·γ)
//! ```
//!
//! The attribute matrix holds the covariates followed by three fixed
//! columns: APR, original balance and collateral value.

use std::sync::OnceLock;

use loss_core::math::DenseMatrix;
use loss_core::types::ModelError;
use tracing::debug;

use crate::traits::LossModel;

/// Number of fixed columns after the covariates (APR, balance, collateral).
pub const FIXED_ATTRIBUTE_COLUMNS: usize = 3;

/// Parameters of the collateral recovery curve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecoveryParameters {
    /// Log-level intercept `s₁`
    pub scalar1: f64,
    /// Logistic recovery amplitude `s₂`
    pub scalar2: f64,
    /// Depreciation drift `s₃`
    pub scalar3: f64,
    /// Logistic midpoint `τ` (months)
    pub tau: f64,
    /// Logistic rate `γ`
    pub gamma: f64,
}

impl RecoveryParameters {
    /// Sets a parameter by name (case-insensitive: `scalar1`, `scalar2`,
    /// `scalar3`, `tau`, `gamma`).
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for any other name.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), ModelError> {
        *self.slot(name)? = value;
        Ok(())
    }

    /// Reads a parameter by name.
    pub fn get(&self, name: &str) -> Result<f64, ModelError> {
        let mut copy = *self;
        copy.slot(name).map(|v| *v)
    }

    fn slot(&mut self, name: &str) -> Result<&mut f64, ModelError> {
        match name.to_ascii_lowercase().as_str() {
            "scalar1" => Ok(&mut self.scalar1),
            "scalar2" => Ok(&mut self.scalar2),
            "scalar3" => Ok(&mut self.scalar3),
            "tau" => Ok(&mut self.tau),
            "gamma" => Ok(&mut self.gamma),
            _ => Err(ModelError::invalid_parameter(
                name,
                "unknown recovery parameter",
            )),
        }
    }
}

/// Amortisation schedule of the underlying loans.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AmortizationTerms {
    /// Total number of scheduled payments
    pub total_payments: u32,
    /// Payments per year
    pub payments_per_year: f64,
    /// Months between the last payment and the recorded default
    pub grace_months: f64,
}

impl Default for AmortizationTerms {
    fn default() -> Self {
        Self {
            total_payments: 72,
            payments_per_year: 12.0,
            grace_months: 3.0,
        }
    }
}

impl AmortizationTerms {
    /// Outstanding balance at month `t` of a level-payment loan.
    ///
    /// Defaults are recorded `grace_months` after the last payment, so
    /// `t` is shifted back by the grace period once it exceeds it. A zero
    /// APR amortises linearly.
    pub fn amount_drawn_down(&self, t: f64, apr: f64, balance: f64) -> f64 {
        let t = if t > self.grace_months {
            t - self.grace_months
        } else {
            t
        };
        let n = f64::from(self.total_payments);
        if apr == 0.0 {
            return balance * (1.0 - t / n);
        }
        let r = apr / self.payments_per_year + 1.0;
        balance * (1.0 - (r.powf(t) - 1.0) / (r.powf(n) - 1.0))
    }
}

/// Exposure-given-default model with loan-level covariates.
///
/// # Examples
///
/// ```
/// use loss_models::EgdModel;
///
/// let mut model = EgdModel::new();
/// model.add_coefficient(-0.01);
/// // covariate, APR, balance, collateral
/// for v in [1.0, 0.12, 20_000.0, 15_000.0] {
///     model.add_attribute(v);
/// }
/// model.set_parameter("tau", 24.0).unwrap();
/// model.init().unwrap();
///
/// let loss = model.predict(0, 0.0, 12.0).unwrap();
/// assert!(loss.is_finite());
/// ```
#[derive(Debug, Default)]
pub struct EgdModel {
    coefficients: Vec<f64>,
    attributes: DenseMatrix,
    recovery: RecoveryParameters,
    std_error: f64,
    terms: AmortizationTerms,
    offsets: Vec<OnceLock<f64>>,
    initialized: bool,
}

impl EgdModel {
    /// Creates an empty model with the default 72-month schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty model with a custom amortisation schedule.
    pub fn with_terms(terms: AmortizationTerms) -> Self {
        Self {
            terms,
            ..Self::default()
        }
    }

    /// Appends a covariate coefficient.
    pub fn add_coefficient(&mut self, coefficient: f64) {
        self.coefficients.push(coefficient);
    }

    /// Appends one loan attribute in row-major order.
    pub fn add_attribute(&mut self, attribute: f64) {
        self.attributes.push(attribute);
    }

    /// Appends one loan row: the named covariates followed by APR, amount
    /// financed and collateral value.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the row is not `coefficients + 3` long.
    pub fn add_loan_attributes(&mut self, row: &[f64]) -> Result<(), ModelError> {
        self.attributes
            .set_width(self.coefficients.len() + FIXED_ATTRIBUTE_COLUMNS);
        self.attributes.push_row(row)
    }

    /// Sets a recovery parameter by name.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), ModelError> {
        self.recovery.set(name, value)
    }

    /// Sets the residual standard error.
    pub fn set_std_error(&mut self, std_error: f64) {
        self.std_error = std_error;
    }

    /// Recovery parameters.
    pub fn recovery(&self) -> &RecoveryParameters {
        &self.recovery
    }

    /// Residual standard error.
    pub fn std_error(&self) -> f64 {
        self.std_error
    }

    /// Amortisation schedule.
    pub fn terms(&self) -> &AmortizationTerms {
        &self.terms
    }

    /// Number of loans (0 before `init`).
    pub fn loan_count(&self) -> usize {
        self.offsets.len()
    }

    /// Validates the attribute table and prepares the offset cache.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` when no loan rows were loaded
    /// - `DimensionMismatch` when the attributes do not fill whole rows of
    ///   `coefficients + 3` columns
    pub fn init(&mut self) -> Result<(), ModelError> {
        self.initialized = false;
        let width = self.coefficients.len() + FIXED_ATTRIBUTE_COLUMNS;
        self.attributes.set_width(width);

        if self.attributes.rows() == 0 {
            return Err(ModelError::NotInitialized("EGD model has no loan rows"));
        }
        if !self.attributes.is_rectangular() {
            return Err(ModelError::DimensionMismatch {
                context: "EGD attributes vs coefficient width",
                expected: self.attributes.len().div_ceil(width) * width,
                actual: self.attributes.len(),
            });
        }

        let loans = self.attributes.rows();
        self.offsets = (0..loans).map(|_| OnceLock::new()).collect();
        self.initialized = true;

        debug!(
            covariates = self.coefficients.len(),
            loans,
            std_error = self.std_error,
            "EGD model initialised"
        );
        Ok(())
    }

    /// Clears coefficients, attributes and parameters.
    pub fn reset_all(&mut self) {
        self.coefficients.clear();
        self.attributes.clear();
        self.offsets.clear();
        self.recovery = RecoveryParameters::default();
        self.std_error = 0.0;
        self.initialized = false;
    }

    /// Outstanding balance at month `t`; see [`AmortizationTerms::amount_drawn_down`].
    pub fn amount_drawn_down(&self, t: f64, apr: f64, balance: f64) -> f64 {
        self.terms.amount_drawn_down(t, apr, balance)
    }

    /// Recovered collateral value at month `t`.
    pub fn recovered_collateral(&self, offset: f64, collateral: f64, t: f64) -> f64 {
        let p = &self.recovery;
        let d = (-(t - p.tau) * p.gamma).exp();
        collateral * ((offset + p.scalar3) * t + p.scalar1).exp() - p.scalar2 * d / (1.0 + d)
    }

    /// Covariate offset `Σ β_j·a_ij`, memoised per loan.
    pub fn offset(&self, loan: usize) -> Result<f64, ModelError> {
        if !self.initialized {
            return Err(ModelError::NotInitialized("EGD model"));
        }
        let cell = self.offsets.get(loan).ok_or(ModelError::IndexOutOfBounds {
            row: loan,
            column: 0,
            rows: self.offsets.len(),
            columns: self.attributes.width(),
        })?;
        if let Some(offset) = cell.get() {
            return Ok(*offset);
        }
        let row = self.attributes.row(loan)?;
        let offset = row.iter().zip(&self.coefficients).map(|(a, b)| a * b).sum();
        Ok(*cell.get_or_init(|| offset))
    }

    /// Raw dollar loss for `loan` defaulting at month `t`.
    ///
    /// May be negative when the collateral covers the balance; the
    /// [`LossModel`] implementation floors it at zero.
    pub fn predict(&self, loan: usize, noise: f64, t: f64) -> Result<f64, ModelError> {
        let offset = self.offset(loan)?;
        let m = self.coefficients.len();
        let row = self.attributes.row(loan)?;
        let (apr, balance, collateral) = (row[m], row[m + 1], row[m + 2]);

        Ok(self.amount_drawn_down(t, apr, balance)
            - self.recovered_collateral(offset, collateral, t)
            + self.std_error * noise)
    }
}

impl LossModel for EgdModel {
    fn loan_count(&self) -> usize {
        EgdModel::loan_count(self)
    }

    fn loss_given_default(&self, loan: usize, noise: f64, time: f64) -> Result<f64, ModelError> {
        Ok(self.predict(loan, noise, time)?.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> EgdModel {
        let mut m = EgdModel::new();
        m.add_coefficient(-0.02);
        m.add_coefficient(0.001);
        // covariates, APR, balance, collateral
        for v in [1.0, 10.0, 0.12, 20_000.0, 18_000.0] {
            m.add_attribute(v);
        }
        for v in [0.0, 5.0, 0.0, 10_000.0, 2_000.0] {
            m.add_attribute(v);
        }
        m.set_parameter("Scalar1", -0.1).unwrap();
        m.set_parameter("Scalar2", 500.0).unwrap();
        m.set_parameter("Scalar3", -0.01).unwrap();
        m.set_parameter("tau", 12.0).unwrap();
        m.set_parameter("gamma", 0.2).unwrap();
        m.set_std_error(250.0);
        m.init().unwrap();
        m
    }

    // ========================================
    // Amortisation
    // ========================================

    #[test]
    fn test_amount_drawn_down_endpoints() {
        let terms = AmortizationTerms::default();
        assert_relative_eq!(terms.amount_drawn_down(0.0, 0.12, 20_000.0), 20_000.0);
        // 75 months with a 3 month grace lands on the final payment
        assert_relative_eq!(
            terms.amount_drawn_down(75.0, 0.12, 20_000.0),
            0.0,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_grace_period_applies_after_three_months() {
        let terms = AmortizationTerms::default();
        let at_two = terms.amount_drawn_down(2.0, 0.12, 1_000.0);
        let r: f64 = 1.01;
        let expected = 1_000.0 * (1.0 - (r.powf(2.0) - 1.0) / (r.powf(72.0) - 1.0));
        assert_relative_eq!(at_two, expected, epsilon = 1e-10);

        assert_relative_eq!(
            terms.amount_drawn_down(10.0, 0.12, 1_000.0),
            terms.amount_drawn_down(7.0, 0.12, 1_000.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_zero_apr_amortises_linearly() {
        let terms = AmortizationTerms::default();
        assert_relative_eq!(terms.amount_drawn_down(39.0, 0.0, 7_200.0), 3_600.0);
    }

    // ========================================
    // Parameters
    // ========================================

    #[test]
    fn test_recovery_parameter_names() {
        let mut p = RecoveryParameters::default();
        p.set("scalar2", 3.0).unwrap();
        p.set("TAU", 6.0).unwrap();
        assert_eq!(p.scalar2, 3.0);
        assert_eq!(p.get("tau").unwrap(), 6.0);
        assert!(matches!(
            p.set("delta", 1.0),
            Err(ModelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_init_requires_rows() {
        let mut m = EgdModel::new();
        m.add_coefficient(1.0);
        assert!(matches!(m.init(), Err(ModelError::NotInitialized(_))));
    }

    #[test]
    fn test_init_rejects_ragged_attributes() {
        let mut m = EgdModel::new();
        m.add_coefficient(1.0);
        for v in [1.0, 0.1, 100.0, 50.0, 2.0] {
            m.add_attribute(v);
        }
        assert!(matches!(
            m.init(),
            Err(ModelError::DimensionMismatch {
                expected: 8,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_loan_attribute_rows_carry_fixed_columns() {
        let mut m = EgdModel::new();
        m.add_coefficient(-0.02);
        m.add_coefficient(0.001);
        assert!(matches!(
            m.add_loan_attributes(&[1.0, 10.0]),
            Err(ModelError::DimensionMismatch {
                expected: 5,
                actual: 2,
                ..
            })
        ));
        m.add_loan_attributes(&[1.0, 10.0, 0.12, 20_000.0, 18_000.0])
            .unwrap();
        m.init().unwrap();
        assert_relative_eq!(m.offset(0).unwrap(), -0.02 + 0.01, epsilon = 1e-15);
    }

    // ========================================
    // Prediction
    // ========================================

    #[test]
    fn test_predict_matches_formula() {
        let m = model();
        let t = 20.0;
        let offset = -0.02 * 1.0 + 0.001 * 10.0;
        assert_relative_eq!(m.offset(0).unwrap(), offset, epsilon = 1e-15);

        let drawn = m.amount_drawn_down(t, 0.12, 20_000.0);
        let d = (-(t - 12.0) * 0.2_f64).exp();
        let recovered = 18_000.0 * ((offset - 0.01) * t - 0.1).exp() - 500.0 * d / (1.0 + d);
        let expected = drawn - recovered + 250.0 * 0.5;

        assert_relative_eq!(m.predict(0, 0.5, t).unwrap(), expected, epsilon = 1e-8);
    }

    #[test]
    fn test_loss_given_default_is_floored() {
        let mut m = EgdModel::new();
        m.add_coefficient(0.0);
        // collateral far above the balance
        for v in [0.0, 0.1, 1_000.0, 50_000.0] {
            m.add_attribute(v);
        }
        m.init().unwrap();
        assert!(m.predict(0, 0.0, 10.0).unwrap() < 0.0);
        assert_eq!(m.loss_given_default(0, 0.0, 10.0).unwrap(), 0.0);
    }

    #[test]
    fn test_noise_scales_with_std_error() {
        let m = model();
        let base = m.predict(1, 0.0, 30.0).unwrap();
        let shocked = m.predict(1, 2.0, 30.0).unwrap();
        assert_relative_eq!(shocked - base, 500.0, epsilon = 1e-8);
    }

    #[test]
    fn test_reset_all() {
        let mut m = model();
        assert_eq!(m.loan_count(), 2);
        m.reset_all();
        assert_eq!(m.loan_count(), 0);
        assert_eq!(m.std_error(), 0.0);
        assert_eq!(*m.recovery(), RecoveryParameters::default());
        assert!(m.predict(0, 0.0, 1.0).is_err());
    }
}
