//! Error types for the Monte Carlo engine.

use thiserror::Error;

/// Configuration error for the Monte Carlo engine.
///
/// These errors occur during construction when invalid parameters are provided.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Trial count outside valid range [1, 10_000_000].
    #[error("Invalid trial count {0}: must be in range [1, 10_000_000]")]
    InvalidTrialCount(usize),

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidTrialCount(0);
        assert!(err.to_string().contains("Invalid trial count 0"));

        let err = ConfigError::InvalidParameter {
            name: "trials",
            value: "must be specified".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid parameter 'trials': must be specified");
    }
}
