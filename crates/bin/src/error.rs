//! CLI error type.

use ballast::EngineError;
use thiserror::Error;

/// Errors surfaced by the `ballast` binary.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// An input file could not be opened.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// CSV input was malformed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON input or output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input parsed but its content is unusable.
    #[error("Invalid input: {0}")]
    Input(String),

    /// The engine rejected the request.
    #[error("{kind}: {source}")]
    Engine {
        /// Error category
        kind: ballast::ErrorKind,
        /// Engine error
        source: EngineError,
    },
}

impl From<EngineError> for CliError {
    fn from(source: EngineError) -> Self {
        Self::Engine {
            kind: source.kind(),
            source,
        }
    }
}

impl From<ballast::core::StatsError> for CliError {
    fn from(error: ballast::core::StatsError) -> Self {
        EngineError::from(error).into()
    }
}
