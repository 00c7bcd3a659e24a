//! Error types for sizing and allocation.

use ballast_core::{StatsError, StopReason};
use thiserror::Error;

/// Result type for sizing operations.
pub type Result<T> = std::result::Result<T, SizingError>;

/// Errors that can occur while sizing positions or optimizing weights
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SizingError {
    /// Statistics or market data validation failed
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Out-of-range argument or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not enough observations to estimate an input
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// NaN/Infinity appeared during iteration
    #[error("Data quality error: {0}")]
    DataQuality(String),

    /// Stopped before a single iteration finished
    #[error("Computation stopped before any iteration completed ({reason:?})")]
    Timeout {
        /// Why the run stopped
        reason: StopReason,
    },
}

impl SizingError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
