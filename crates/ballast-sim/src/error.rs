//! Error types for simulation.

use ballast_core::{StatsError, StopReason};
use thiserror::Error;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Errors raised by the Monte Carlo simulator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    /// Statistics over the simulated distribution failed
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Out-of-range parameter or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A scenario produced NaN or infinity
    #[error("Data quality error: {0}")]
    DataQuality(String),

    /// Stopped before a single scenario finished
    #[error("Simulation stopped before any scenario completed ({reason:?})")]
    Timeout {
        /// Why the run stopped
        reason: StopReason,
    },
}
