#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ballast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod frontier;
pub mod kelly;
pub mod optimizer;
pub mod parity;
pub mod projection;

pub use error::{Result, SizingError};
pub use frontier::{Frontier, FrontierConfig, FrontierPoint, efficient_frontier};
pub use kelly::{KellyCalculator, KellyConfig, KellyInput, KellyResult, RiskLevel};
pub use optimizer::{MeanVarianceOptimizer, OptimizerConfig, PortfolioOptimization};
pub use parity::{
    AssetCorrelation, RiskParityAllocation, RiskParityAllocator, RiskParityConfig,
    RiskParityMethod,
};
pub use projection::{cap_and_redistribute, project_onto_bounds};
