#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ballast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod control;
pub mod covariance;
pub mod error;
pub mod market;
pub mod series;
pub mod stats;
pub mod weights;

pub use control::{CancellationToken, Completion, Progress, RunControl, StopReason};
pub use covariance::{
    CovarianceEstimator, CovarianceMatrix, EwmaConfig, EwmaCovarianceEstimator,
    SampleCovarianceEstimator,
};
pub use error::{Result, StatsError};
pub use market::MarketStatistics;
pub use series::{AssetId, Periodicity, ReturnSeries};
pub use weights::{AssetWeight, PortfolioWeights, WeightBounds};
