#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ballast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;

// Re-export component crates
pub use ballast_core as core;
pub use ballast_risk as risk;
pub use ballast_sim as sim;
pub use ballast_sizing as sizing;

pub use config::{CovarianceConfig, EngineConfig};
pub use engine::{DrawdownReport, RiskEngine, SimulationRequest};
pub use error::{EngineError, ErrorKind, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
