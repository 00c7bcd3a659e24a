#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ballast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod drawdown;
pub mod error;
pub mod ratios;
pub mod tail;

pub use aggregate::{
    CompositeWeights, PortfolioSnapshot, Position, RiskAggregator, RiskAggregatorConfig,
    RiskClassification, RiskMetricsSnapshot, RiskScores,
};
pub use drawdown::{
    DrawdownAction, DrawdownAnalysis, DrawdownAssessment, DrawdownPolicy, DrawdownRecord,
    DrawdownTracker, analyze_drawdown, analyze_drawdown_with_timestamps,
};
pub use error::{Result, RiskError};
pub use ratios::{RiskAdjustedRatios, compounded_path, compute_ratios};
pub use tail::{TailConfig, TailRisk, conditional_value_at_risk, tail_risk, value_at_risk};
