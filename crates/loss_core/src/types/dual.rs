//! Forward-mode automatic differentiation with dual numbers.
//!
//! A [`Dual`] carries a value and its derivative along a single direction.
//! Every arithmetic operator and elementary function propagates the
//! derivative with the matching calculus rule, so evaluating a function on
//! `Dual::variable(x)` yields both `f(x)` and `f'(x)` in one pass.
//!
//! ## Usage
//!
//! ```rust
//! use loss_core::types::Dual;
//!
//! // f(x) = x·exp(x) at x = 1, f'(x) = (1 + x)·exp(x)
//! let x = Dual::variable(1.0);
//! let fx = x * x.exp();
//!
//! assert!((fx.value() - 1.0_f64.exp()).abs() < 1e-12);
//! assert!((fx.derivative() - 2.0 * 1.0_f64.exp()).abs() < 1e-12);
//! ```
//!
//! ## Ordering
//!
//! Comparisons look at the value only. Two duals with equal values and
//! different derivatives compare equal; this keeps branching code (spline
//! truncation, bracket tests) identical for `f64` and `Dual` evaluation.

use std::cmp::Ordering;
use std::f64::consts::FRAC_2_SQRT_PI;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

/// Scalar type accepted by differentiable model code.
///
/// Implemented by `f64` (plain evaluation) and [`Dual`] (value plus
/// derivative). Model functions written against `Scalar` can be evaluated
/// cheaply during curve building and differentiated inside Newton–Raphson
/// without duplicating code.
pub trait Scalar:
    Copy
    + fmt::Debug
    + PartialOrd
    + From<f64>
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    /// Primal value.
    fn value(&self) -> f64;

    /// Natural exponential.
    fn exp(self) -> Self;

    /// Natural logarithm.
    fn ln(self) -> Self;

    /// Square root.
    fn sqrt(self) -> Self;

    /// Gauss error function.
    fn erf(self) -> Self;
}

impl Scalar for f64 {
    #[inline]
    fn value(&self) -> f64 {
        *self
    }

    #[inline]
    fn exp(self) -> Self {
        f64::exp(self)
    }

    #[inline]
    fn ln(self) -> Self {
        f64::ln(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn erf(self) -> Self {
        statrs::function::erf::erf(self)
    }
}

/// Dual number `value + derivative·ε` with `ε² = 0`.
///
/// # Examples
///
/// ```rust
/// use loss_core::types::Dual;
///
/// let x = Dual::variable(3.0);
/// let y = x * x + 2.0 * x;
///
/// assert_eq!(y.value(), 15.0);
/// assert_eq!(y.derivative(), 8.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dual {
    value: f64,
    derivative: f64,
}

impl Dual {
    /// Creates a dual number from a value and a derivative.
    #[inline]
    pub const fn new(value: f64, derivative: f64) -> Self {
        Self { value, derivative }
    }

    /// Creates a constant (derivative 0).
    #[inline]
    pub const fn constant(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    /// Creates the independent variable (derivative seeded to 1).
    #[inline]
    pub const fn variable(value: f64) -> Self {
        Self::new(value, 1.0)
    }

    /// Returns the value part.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the derivative part.
    #[inline]
    pub fn derivative(&self) -> f64 {
        self.derivative
    }

    /// Reciprocal `1/f` with `d(1/f) = -f'/f²`.
    #[inline]
    pub fn recip(self) -> Self {
        Self::new(
            1.0 / self.value,
            -self.derivative / (self.value * self.value),
        )
    }

    /// Sine.
    #[inline]
    pub fn sin(self) -> Self {
        Self::new(self.value.sin(), self.value.cos() * self.derivative)
    }

    /// Cosine.
    #[inline]
    pub fn cos(self) -> Self {
        Self::new(self.value.cos(), -self.value.sin() * self.derivative)
    }

    /// Natural exponential.
    #[inline]
    pub fn exp(self) -> Self {
        let e = self.value.exp();
        Self::new(e, e * self.derivative)
    }

    /// Natural logarithm.
    #[inline]
    pub fn ln(self) -> Self {
        Self::new(self.value.ln(), self.derivative / self.value)
    }

    /// Square root.
    #[inline]
    pub fn sqrt(self) -> Self {
        let s = self.value.sqrt();
        Self::new(s, self.derivative / (2.0 * s))
    }

    /// Gauss error function, `d(erf f) = 2/√π · exp(-f²) · f'`.
    #[inline]
    pub fn erf(self) -> Self {
        Self::new(
            statrs::function::erf::erf(self.value),
            FRAC_2_SQRT_PI * (-self.value * self.value).exp() * self.derivative,
        )
    }

    /// Raises to a constant power.
    ///
    /// A non-positive base with a non-integer exponent has no real
    /// derivative; the result is the defined value `Dual(0, 0)` rather than
    /// NaN. Integer exponents on non-positive bases use the exact power rule.
    ///
    /// ```rust
    /// use loss_core::types::Dual;
    ///
    /// let x = Dual::variable(-2.0);
    /// assert_eq!(x.powf(0.5).derivative(), 0.0);
    /// assert_eq!(x.powf(2.0).derivative(), -4.0);
    /// ```
    pub fn powf(self, exponent: f64) -> Self {
        if self.value > 0.0 {
            let v = self.value.powf(exponent);
            Self::new(v, exponent * (v / self.value) * self.derivative)
        } else if exponent.fract() == 0.0 {
            let v = self.value.powf(exponent);
            let d = if exponent == 0.0 {
                0.0
            } else {
                exponent * self.value.powf(exponent - 1.0) * self.derivative
            };
            Self::new(v, d)
        } else {
            Self::new(0.0, 0.0)
        }
    }

    /// Raises to a dual power, `f^g = exp(g·ln f)`.
    ///
    /// Falls back to [`Dual::powf`] when the base is non-positive and the
    /// exponent is a constant.
    pub fn pow(self, exponent: Dual) -> Self {
        if self.value > 0.0 {
            (exponent * self.ln()).exp()
        } else if exponent.derivative == 0.0 {
            self.powf(exponent.value)
        } else {
            Self::new(0.0, 0.0)
        }
    }

    /// Raises a constant base to a dual power, `d(b^g) = g'·b^g·ln b`.
    pub fn scalar_pow(base: f64, exponent: Dual) -> Self {
        if base > 0.0 {
            let v = base.powf(exponent.value);
            Self::new(v, exponent.derivative * v * base.ln())
        } else if exponent.value.fract() == 0.0 {
            Self::new(base.powf(exponent.value), 0.0)
        } else {
            Self::new(0.0, 0.0)
        }
    }
}

impl Scalar for Dual {
    #[inline]
    fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    fn exp(self) -> Self {
        Dual::exp(self)
    }

    #[inline]
    fn ln(self) -> Self {
        Dual::ln(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        Dual::sqrt(self)
    }

    #[inline]
    fn erf(self) -> Self {
        Dual::erf(self)
    }
}

impl From<f64> for Dual {
    #[inline]
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl fmt::Display for Dual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}ε", self.value, self.derivative)
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

impl Add for Dual {
    type Output = Dual;

    #[inline]
    fn add(self, rhs: Dual) -> Dual {
        Dual::new(self.value + rhs.value, self.derivative + rhs.derivative)
    }
}

impl Add<f64> for Dual {
    type Output = Dual;

    #[inline]
    fn add(self, rhs: f64) -> Dual {
        Dual::new(self.value + rhs, self.derivative)
    }
}

impl Add<Dual> for f64 {
    type Output = Dual;

    #[inline]
    fn add(self, rhs: Dual) -> Dual {
        rhs + self
    }
}

impl Sub for Dual {
    type Output = Dual;

    #[inline]
    fn sub(self, rhs: Dual) -> Dual {
        Dual::new(self.value - rhs.value, self.derivative - rhs.derivative)
    }
}

impl Sub<f64> for Dual {
    type Output = Dual;

    #[inline]
    fn sub(self, rhs: f64) -> Dual {
        Dual::new(self.value - rhs, self.derivative)
    }
}

impl Sub<Dual> for f64 {
    type Output = Dual;

    #[inline]
    fn sub(self, rhs: Dual) -> Dual {
        Dual::new(self - rhs.value, -rhs.derivative)
    }
}

impl Mul for Dual {
    type Output = Dual;

    #[inline]
    fn mul(self, rhs: Dual) -> Dual {
        Dual::new(
            self.value * rhs.value,
            self.value * rhs.derivative + self.derivative * rhs.value,
        )
    }
}

impl Mul<f64> for Dual {
    type Output = Dual;

    #[inline]
    fn mul(self, rhs: f64) -> Dual {
        Dual::new(self.value * rhs, self.derivative * rhs)
    }
}

impl Mul<Dual> for f64 {
    type Output = Dual;

    #[inline]
    fn mul(self, rhs: Dual) -> Dual {
        rhs * self
    }
}

impl Div for Dual {
    type Output = Dual;

    #[inline]
    fn div(self, rhs: Dual) -> Dual {
        self * rhs.recip()
    }
}

impl Div<f64> for Dual {
    type Output = Dual;

    #[inline]
    fn div(self, rhs: f64) -> Dual {
        self * (1.0 / rhs)
    }
}

impl Div<Dual> for f64 {
    type Output = Dual;

    #[inline]
    fn div(self, rhs: Dual) -> Dual {
        rhs.recip() * self
    }
}

impl Neg for Dual {
    type Output = Dual;

    #[inline]
    fn neg(self) -> Dual {
        Dual::new(-self.value, -self.derivative)
    }
}

impl AddAssign for Dual {
    #[inline]
    fn add_assign(&mut self, rhs: Dual) {
        *self = *self + rhs;
    }
}

impl AddAssign<f64> for Dual {
    #[inline]
    fn add_assign(&mut self, rhs: f64) {
        self.value += rhs;
    }
}

impl SubAssign for Dual {
    #[inline]
    fn sub_assign(&mut self, rhs: Dual) {
        *self = *self - rhs;
    }
}

impl SubAssign<f64> for Dual {
    #[inline]
    fn sub_assign(&mut self, rhs: f64) {
        self.value -= rhs;
    }
}

impl MulAssign for Dual {
    #[inline]
    fn mul_assign(&mut self, rhs: Dual) {
        *self = *self * rhs;
    }
}

impl MulAssign<f64> for Dual {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl DivAssign for Dual {
    #[inline]
    fn div_assign(&mut self, rhs: Dual) {
        *self = *self / rhs;
    }
}

impl DivAssign<f64> for Dual {
    #[inline]
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

impl Sum for Dual {
    fn sum<I: Iterator<Item = Dual>>(iter: I) -> Dual {
        iter.fold(Dual::zero(), |acc, x| acc + x)
    }
}

impl Zero for Dual {
    #[inline]
    fn zero() -> Self {
        Dual::constant(0.0)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.value == 0.0 && self.derivative == 0.0
    }
}

impl One for Dual {
    #[inline]
    fn one() -> Self {
        Dual::constant(1.0)
    }
}

// ---------------------------------------------------------------------------
// Comparison (value only)
// ---------------------------------------------------------------------------

impl PartialEq for Dual {
    #[inline]
    fn eq(&self, other: &Dual) -> bool {
        self.value == other.value
    }
}

impl PartialEq<f64> for Dual {
    #[inline]
    fn eq(&self, other: &f64) -> bool {
        self.value == *other
    }
}

impl PartialEq<Dual> for f64 {
    #[inline]
    fn eq(&self, other: &Dual) -> bool {
        *self == other.value
    }
}

impl PartialOrd for Dual {
    #[inline]
    fn partial_cmp(&self, other: &Dual) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl PartialOrd<f64> for Dual {
    #[inline]
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

impl PartialOrd<Dual> for f64 {
    #[inline]
    fn partial_cmp(&self, other: &Dual) -> Option<Ordering> {
        self.partial_cmp(&other.value)
    }
}
