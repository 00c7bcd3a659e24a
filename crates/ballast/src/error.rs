//! Engine-wide error type and taxonomy.

use ballast_core::StatsError;
use ballast_risk::RiskError;
use ballast_sim::SimulationError;
use ballast_sizing::SizingError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Coarse error category every engine failure maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Argument or configuration out of range
    #[display("invalid_input")]
    InvalidInput,
    /// Too few observations for the requested statistic
    #[display("insufficient_data")]
    InsufficientData,
    /// NaN, infinity or a matrix that is not a covariance matrix
    #[display("data_quality")]
    DataQuality,
    /// Deadline or cancellation before any work completed
    #[display("computation_timeout")]
    ComputationTimeout,
}

/// Errors returned by [`RiskEngine`](crate::RiskEngine)
#[derive(Debug, Error)]
pub enum EngineError {
    /// Statistics or market data validation failed
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Position sizing or weight optimization failed
    #[error(transparent)]
    Sizing(#[from] SizingError),

    /// Monte Carlo simulation failed
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Risk measurement failed
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Request arguments that no component could accept
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        /// File path
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Configuration document could not be parsed
    #[error("Invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Stats(e) => stats_kind(e),
            Self::Sizing(e) => match e {
                SizingError::Stats(s) => stats_kind(s),
                SizingError::InvalidInput(_) => ErrorKind::InvalidInput,
                SizingError::InsufficientData(_) => ErrorKind::InsufficientData,
                SizingError::DataQuality(_) => ErrorKind::DataQuality,
                SizingError::Timeout { .. } => ErrorKind::ComputationTimeout,
            },
            Self::Simulation(e) => match e {
                SimulationError::Stats(s) => stats_kind(s),
                SimulationError::InvalidInput(_) => ErrorKind::InvalidInput,
                SimulationError::DataQuality(_) => ErrorKind::DataQuality,
                SimulationError::Timeout { .. } => ErrorKind::ComputationTimeout,
            },
            Self::Risk(e) => match e {
                RiskError::Stats(s) => stats_kind(s),
                RiskError::InvalidInput(_) => ErrorKind::InvalidInput,
                RiskError::DataQuality(_) => ErrorKind::DataQuality,
            },
            Self::InvalidInput(_) | Self::ConfigRead { .. } | Self::ConfigParse(_) => {
                ErrorKind::InvalidInput
            }
        }
    }
}

const fn stats_kind(error: &StatsError) -> ErrorKind {
    match error {
        StatsError::InsufficientData { .. } => ErrorKind::InsufficientData,
        StatsError::DimensionMismatch { .. } | StatsError::InvalidInput(_) => {
            ErrorKind::InvalidInput
        }
        StatsError::DataQuality(_) => ErrorKind::DataQuality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballast_core::StopReason;
    use rstest::rstest;

    #[rstest]
    #[case(StatsError::insufficient(2, 1).into(), ErrorKind::InsufficientData)]
    #[case(StatsError::DimensionMismatch { expected: 3, actual: 2 }.into(), ErrorKind::InvalidInput)]
    #[case(StatsError::invalid("x").into(), ErrorKind::InvalidInput)]
    #[case(StatsError::data_quality("x").into(), ErrorKind::DataQuality)]
    #[case(SizingError::Stats(StatsError::insufficient(2, 0)).into(), ErrorKind::InsufficientData)]
    #[case(SizingError::InvalidInput("x".into()).into(), ErrorKind::InvalidInput)]
    #[case(SizingError::InsufficientData("x".into()).into(), ErrorKind::InsufficientData)]
    #[case(SizingError::DataQuality("x".into()).into(), ErrorKind::DataQuality)]
    #[case(SizingError::Timeout { reason: StopReason::DeadlineExceeded }.into(), ErrorKind::ComputationTimeout)]
    #[case(SimulationError::Stats(StatsError::data_quality("x")).into(), ErrorKind::DataQuality)]
    #[case(SimulationError::InvalidInput("x".into()).into(), ErrorKind::InvalidInput)]
    #[case(SimulationError::DataQuality("x".into()).into(), ErrorKind::DataQuality)]
    #[case(SimulationError::Timeout { reason: StopReason::Cancelled }.into(), ErrorKind::ComputationTimeout)]
    #[case(RiskError::Stats(StatsError::insufficient(2, 1)).into(), ErrorKind::InsufficientData)]
    #[case(RiskError::InvalidInput("x".into()).into(), ErrorKind::InvalidInput)]
    #[case(RiskError::DataQuality("x".into()).into(), ErrorKind::DataQuality)]
    #[case(EngineError::invalid("x"), ErrorKind::InvalidInput)]
    fn test_kind_mapping(#[case] error: EngineError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn test_config_errors_are_invalid_input() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(EngineError::from(parse).kind(), ErrorKind::InvalidInput);

        let read = EngineError::ConfigRead {
            path: "ballast.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(read.kind(), ErrorKind::InvalidInput);
        assert!(read.to_string().contains("ballast.json"));
    }

    #[test]
    fn test_transparent_messages() {
        let error = EngineError::from(StatsError::insufficient(2, 1));
        assert_eq!(
            error.to_string(),
            "Insufficient data: need at least 2 observations, got 1"
        );
        assert_eq!(ErrorKind::ComputationTimeout.to_string(), "computation_timeout");
    }
}
