//! Error types for risk measurement.

use ballast_core::StatsError;
use thiserror::Error;

/// Result type for risk operations.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors raised while measuring risk
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskError {
    /// Underlying statistics failed (including too few observations)
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Out-of-range argument or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// NaN/Infinity in a series or snapshot
    #[error("Data quality error: {0}")]
    DataQuality(String),
}

impl RiskError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) const fn insufficient(required: usize, actual: usize) -> Self {
        Self::Stats(StatsError::insufficient(required, actual))
    }
}
