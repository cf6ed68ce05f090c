//! Restricted cubic spline survival model for probability of default.
//!
//! The baseline is a natural cubic spline in `x = ln t` (months on book):
//!
//! ```text
//! g(x) = γ₀ + γ₁·x + Σ_{i=1}^{n-2} γ_{i+1}·v_i(x)
//! v_i(x) = (x − k_i)³₊ − λ_i·(x − k_0)³₊ − (1 − λ_i)·(x − k_{n−1})³₊
//! λ_i = (k_{n−1} − k_i) / (k_{n−1} − k_0)
//! ```
//!
//! A loan-level offset `Σ β_j·(a_ij − ā_j)` and a frailty shock shift `g`,
//! and the [`LinkFunction`] maps the shifted value to a survival
//! probability. The PD over `(s, t]` is `1 − S(t)/S(s)`.

use std::f64::consts::FRAC_1_SQRT_2;
use std::sync::OnceLock;

use loss_core::math::DenseMatrix;
use loss_core::types::{ModelError, Scalar};
use tracing::debug;

use crate::traits::PdModel;

/// Link between the spline and the survival probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinkFunction {
    /// Proportional hazards: `S = exp(−exp(g))`
    Hazard,
    /// Proportional odds: `S = 1/(1 + exp(g))`
    #[default]
    Odds,
    /// Probit: `S = ½ + ½·erf(g/√2)`
    Probit,
}

impl LinkFunction {
    /// Maps a shifted spline value to a survival probability.
    #[inline]
    pub fn survival<S: Scalar>(self, g: S) -> S {
        match self {
            LinkFunction::Hazard => (-g.exp()).exp(),
            LinkFunction::Odds => S::from(1.0) / (g.exp() + 1.0),
            LinkFunction::Probit => (g * FRAC_1_SQRT_2).erf() * 0.5 + 0.5,
        }
    }

    /// Applies a seasonal shift to the incremental PD between two horizons.
    ///
    /// The increment `Δ = pd2 − pd1` is moved to the link scale, shifted by
    /// `season` and mapped back. Probit increments, and increments outside
    /// `(0, 1)` where the transform is undefined, are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use loss_models::LinkFunction;
    ///
    /// // doubling the odds of a 0.2 increment gives 0.5/1.5
    /// let adjusted = LinkFunction::Odds.adjust_season(0.1, 0.3, 2.0_f64.ln());
    /// assert!((adjusted - 1.0 / 3.0).abs() < 1e-12);
    /// ```
    pub fn adjust_season(self, pd1: f64, pd2: f64, season: f64) -> f64 {
        let delta = pd2 - pd1;
        if !(delta > 0.0 && delta < 1.0) {
            return delta;
        }
        match self {
            LinkFunction::Hazard => {
                let shifted = (-(1.0 - delta).ln()).ln() + season;
                1.0 - (-shifted.exp()).exp()
            }
            LinkFunction::Odds => {
                let odds = (delta / (1.0 - delta)).ln() + season;
                let odds = odds.exp();
                odds / (1.0 + odds)
            }
            LinkFunction::Probit => delta,
        }
    }
}

/// Spline survival PD model with loan-level covariates.
///
/// Parameters are appended with the `add_*` methods and finalised with
/// [`init`](Self::init). The attribute matrix has one row per loan and one
/// column per coefficient.
///
/// # Examples
///
/// ```
/// use loss_models::{LinkFunction, SplineSurvivalModel};
///
/// let mut model = SplineSurvivalModel::new(LinkFunction::Odds);
/// for (k, g) in [(0.0, -6.0), (2.0, 1.0), (4.3, 0.01)] {
///     model.add_knot(k);
///     model.add_gamma(g);
/// }
/// model.add_coefficient(0.0);
/// model.add_mean(0.0);
/// model.add_attribute(0.0);
/// model.init().unwrap();
///
/// let pd = model.predict(0, 24.0, 0.0).unwrap();
/// assert!(pd > 0.0 && pd < 1.0);
/// ```
#[derive(Debug, Default)]
pub struct SplineSurvivalModel {
    link: LinkFunction,
    knots: Vec<f64>,
    gamma: Vec<f64>,
    coefficients: Vec<f64>,
    means: Vec<f64>,
    attributes: DenseMatrix,
    offsets: Vec<OnceLock<f64>>,
    span: f64,
    initialized: bool,
}

impl SplineSurvivalModel {
    /// Creates an empty model with the given link.
    pub fn new(link: LinkFunction) -> Self {
        Self {
            link,
            ..Self::default()
        }
    }

    /// Appends a knot location (in log months).
    pub fn add_knot(&mut self, knot: f64) {
        self.knots.push(knot);
    }

    /// Appends a spline coefficient; pairs with [`add_knot`](Self::add_knot).
    pub fn add_gamma(&mut self, gamma: f64) {
        self.gamma.push(gamma);
    }

    /// Appends a covariate coefficient.
    pub fn add_coefficient(&mut self, coefficient: f64) {
        self.coefficients.push(coefficient);
    }

    /// Appends the estimation-sample mean of a covariate.
    pub fn add_mean(&mut self, mean: f64) {
        self.means.push(mean);
    }

    /// Appends one loan attribute in row-major order.
    pub fn add_attribute(&mut self, attribute: f64) {
        self.attributes.push(attribute);
    }

    /// Appends the covariate row of one loan.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the row length differs from the number of
    /// coefficients added so far.
    pub fn add_loan_attributes(&mut self, row: &[f64]) -> Result<(), ModelError> {
        self.attributes.set_width(self.coefficients.len());
        self.attributes.push_row(row)
    }

    /// Validates the loaded parameters and prepares the offset cache.
    ///
    /// # Errors
    ///
    /// When no means were added, covariates are centred on the portfolio
    /// column means.
    ///
    /// - `DimensionMismatch` when knots and gamma, or coefficients and means,
    ///   differ in length, or the attributes do not fill whole rows
    /// - `InvalidParameter` when there are fewer than two knots or they are
    ///   not strictly increasing
    /// - `NotInitialized` when no loan rows were loaded
    pub fn init(&mut self) -> Result<(), ModelError> {
        self.initialized = false;

        if self.knots.len() != self.gamma.len() {
            return Err(ModelError::DimensionMismatch {
                context: "knots vs gamma",
                expected: self.knots.len(),
                actual: self.gamma.len(),
            });
        }
        if !self.means.is_empty() && self.coefficients.len() != self.means.len() {
            return Err(ModelError::DimensionMismatch {
                context: "coefficients vs means",
                expected: self.coefficients.len(),
                actual: self.means.len(),
            });
        }
        if self.knots.len() < 2 {
            return Err(ModelError::invalid_parameter(
                "knots",
                format!("need at least 2, got {}", self.knots.len()),
            ));
        }
        if self.knots.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ModelError::invalid_parameter(
                "knots",
                "must be strictly increasing",
            ));
        }

        let width = self.coefficients.len();
        self.attributes.set_width(width);
        if width == 0 || self.attributes.rows() == 0 {
            return Err(ModelError::NotInitialized("PD model has no loan rows"));
        }
        if !self.attributes.is_rectangular() {
            return Err(ModelError::DimensionMismatch {
                context: "PD attributes vs coefficient width",
                expected: self.attributes.len().div_ceil(width) * width,
                actual: self.attributes.len(),
            });
        }

        if self.means.is_empty() {
            self.means = (0..width)
                .map(|column| self.attributes.column_mean(column))
                .collect::<Result<_, _>>()?;
        }

        let loans = self.attributes.rows();
        self.offsets = (0..loans).map(|_| OnceLock::new()).collect();
        self.span = self.knots[self.knots.len() - 1] - self.knots[0];
        self.initialized = true;

        debug!(
            link = ?self.link,
            knots = self.knots.len(),
            covariates = width,
            loans,
            "PD model initialised"
        );
        Ok(())
    }

    /// Clears every parameter and returns to the uninitialised state.
    pub fn reset_all(&mut self) {
        self.knots.clear();
        self.gamma.clear();
        self.coefficients.clear();
        self.means.clear();
        self.attributes.clear();
        self.offsets.clear();
        self.span = 0.0;
        self.initialized = false;
    }

    /// Knot locations.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Spline coefficients.
    pub fn gamma(&self) -> &[f64] {
        &self.gamma
    }

    /// Link function.
    pub fn link(&self) -> LinkFunction {
        self.link
    }

    /// Number of loans (0 before `init`).
    pub fn loan_count(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` after a successful `init`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Baseline spline `g(x)` at `x = ln t`.
    pub fn spline<S: Scalar>(&self, x: S) -> S {
        let n = self.knots.len();
        let zero = S::from(0.0);
        let cube_plus = |d: S| if d > zero { d * d * d } else { zero };

        let lower = cube_plus(x - self.knots[0]);
        let upper = cube_plus(x - self.knots[n - 1]);

        let mut acc = zero;
        for i in 1..n - 1 {
            let lambda = (self.knots[n - 1] - self.knots[i]) / self.span;
            let basis = cube_plus(x - self.knots[i]) - lower * lambda - upper * (1.0 - lambda);
            acc = acc + basis * self.gamma[i + 1];
        }
        x * self.gamma[1] + self.gamma[0] + acc
    }

    /// Survival from `s` to `t` with the spline shifted by `offset + frailty`.
    ///
    /// Returns `S(t)` when `s ≤ 0` and `S(t)/S(s)` otherwise. A horizon
    /// `t ≤ 0` has survival 1.
    pub fn survival<S: Scalar>(&self, t: S, s: f64, offset: f64, frailty: f64) -> S {
        if t.value() <= 0.0 {
            return S::from(1.0);
        }
        let shift = offset + frailty;
        let at_t = self.link.survival(self.spline(t.ln()) + shift);
        if s > 0.0 {
            let at_s: f64 = self.link.survival(self.spline(s.ln()) + shift);
            at_t / at_s
        } else {
            at_t
        }
    }

    /// Loan-level offset `Σ β_j·(a_ij − ā_j)`, memoised per loan.
    pub fn offset(&self, loan: usize) -> Result<f64, ModelError> {
        self.ensure_initialized()?;
        let cell = self
            .offsets
            .get(loan)
            .ok_or(ModelError::IndexOutOfBounds {
                row: loan,
                column: 0,
                rows: self.offsets.len(),
                columns: self.coefficients.len(),
            })?;
        if let Some(offset) = cell.get() {
            return Ok(*offset);
        }
        let row = self.attributes.row(loan)?;
        let offset = row
            .iter()
            .zip(&self.coefficients)
            .zip(&self.means)
            .map(|((a, beta), mean)| beta * (a - mean))
            .sum();
        Ok(*cell.get_or_init(|| offset))
    }

    /// PD of `loan` over `(s, t]` without frailty.
    pub fn predict<S: Scalar>(&self, loan: usize, t: S, s: f64) -> Result<S, ModelError> {
        self.predict_with_frailty(loan, t, s, 0.0)
    }

    /// PD of `loan` over `(s, t]` with an additive frailty shock.
    pub fn predict_with_frailty<S: Scalar>(
        &self,
        loan: usize,
        t: S,
        s: f64,
        frailty: f64,
    ) -> Result<S, ModelError> {
        let offset = self.offset(loan)?;
        if t.value() <= 0.0 {
            return Ok(S::from(0.0));
        }
        Ok(-self.survival(t, s, offset, frailty) + 1.0)
    }

    fn ensure_initialized(&self) -> Result<(), ModelError> {
        if self.initialized {
            Ok(())
        } else {
            Err(ModelError::NotInitialized("spline survival model"))
        }
    }
}

impl PdModel for SplineSurvivalModel {
    fn loan_count(&self) -> usize {
        SplineSurvivalModel::loan_count(self)
    }

    fn probability_of_default<S: Scalar>(
        &self,
        loan: usize,
        horizon: S,
        time_on_books: f64,
        frailty: f64,
    ) -> Result<S, ModelError> {
        self.predict_with_frailty(loan, horizon, time_on_books, frailty)
    }
}
