//! Error types for statistics and market data validation.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors raised while validating inputs or computing statistics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// Series too short for the requested statistic
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Lengths of paired inputs differ
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Out-of-range or otherwise invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// NaN/Infinity or a covariance matrix that cannot be a covariance matrix
    #[error("Data quality error: {0}")]
    DataQuality(String),
}

impl StatsError {
    /// Create an insufficient data error.
    pub const fn insufficient(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Create an invalid input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a data quality error.
    pub fn data_quality(message: impl Into<String>) -> Self {
        Self::DataQuality(message.into())
    }
}

/// Fail with [`StatsError::DataQuality`] if any value is NaN or infinite.
pub fn ensure_finite(values: &[f64], context: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(StatsError::data_quality(format!(
            "{context}: non-finite value {} at index {idx}",
            values[idx]
        ))),
        None => Ok(()),
    }
}

/// Fail with [`StatsError::DataQuality`] if a computed scalar is NaN or infinite.
pub fn ensure_finite_scalar(value: f64, context: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StatsError::data_quality(format!(
            "{context} evaluated to {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite_reports_index() {
        let err = ensure_finite(&[0.1, f64::NAN, 0.2], "returns").unwrap_err();
        assert!(matches!(err, StatsError::DataQuality(ref msg) if msg.contains("index 1")));
        assert!(ensure_finite(&[0.1, -0.2], "returns").is_ok());
    }

    #[test]
    fn test_ensure_finite_scalar() {
        assert_eq!(ensure_finite_scalar(1.5, "x").unwrap(), 1.5);
        assert!(ensure_finite_scalar(f64::INFINITY, "x").is_err());
    }
}
