//! Error types for structured error handling.
//!
//! This module provides [`ModelError`], the error taxonomy shared by the
//! model, engine and risk layers. Every fallible model operation returns
//! `Result<T, ModelError>`; failures propagate synchronously with `?` and
//! are never retried.

use thiserror::Error;

/// Categorised model errors.
///
/// # Variants
/// - `DimensionMismatch`: two collections that must agree in length do not
/// - `NotInitialized`: a model was queried before `init()` succeeded
/// - `NumericDegeneracy`: a detectable numeric failure (NaN, empty sample)
/// - `IndexOutOfBounds`: matrix access outside the stored data
/// - `InvalidParameter`: a parameter value or name is not acceptable
///
/// # Examples
/// ```
/// use loss_core::types::ModelError;
///
/// let err = ModelError::DimensionMismatch {
///     context: "knots vs gamma",
///     expected: 5,
///     actual: 4,
/// };
/// assert_eq!(
///     format!("{}", err),
///     "Dimension mismatch in knots vs gamma: expected 5, got 4"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Collection sizes disagree.
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which pair of collections was compared
        context: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Model used before initialisation, or initialised with no rows.
    #[error("Model not initialised: {0}")]
    NotInitialized(&'static str),

    /// Detectable numeric failure.
    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// Matrix access outside stored data.
    #[error("Index ({row}, {column}) out of bounds for {rows}x{columns} matrix")]
    IndexOutOfBounds {
        /// Requested row
        row: usize,
        /// Requested column
        column: usize,
        /// Current row count
        rows: usize,
        /// Matrix width
        columns: usize,
    },

    /// Parameter rejected.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ModelError {
    /// Shorthand for [`ModelError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_display() {
        let err = ModelError::NotInitialized("spline survival model");
        assert_eq!(
            format!("{}", err),
            "Model not initialised: spline survival model"
        );
    }

    #[test]
    fn test_index_out_of_bounds_display() {
        let err = ModelError::IndexOutOfBounds {
            row: 5,
            column: 1,
            rows: 5,
            columns: 3,
        };
        assert_eq!(
            format!("{}", err),
            "Index (5, 1) out of bounds for 5x3 matrix"
        );
    }

    #[test]
    fn test_invalid_parameter_helper() {
        let err = ModelError::invalid_parameter("knots", "must be strictly increasing");
        assert_eq!(
            err,
            ModelError::InvalidParameter {
                name: "knots".to_string(),
                reason: "must be strictly increasing".to_string(),
            }
        );
        assert_eq!(
            format!("{}", err),
            "Invalid parameter 'knots': must be strictly increasing"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&ModelError::NumericDegeneracy("NaN".to_string()));
    }
}
