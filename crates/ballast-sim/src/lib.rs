#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ballast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod distribution;
pub mod error;
pub mod monte_carlo;
pub mod rng;

pub use distribution::{DistributionSummary, Percentiles, percentile};
pub use error::{Result, SimulationError};
pub use monte_carlo::{
    GbmParameters, MonteCarloConfig, MonteCarloResult, MonteCarloScenario, MonteCarloSimulator,
};
pub use rng::{SeededStreams, StdRngStream, StreamFactory, UniformSource, standard_normal};
