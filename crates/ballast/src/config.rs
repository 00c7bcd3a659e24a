//! Engine configuration.

use crate::error::{EngineError, Result};
use ballast_core::{
    CovarianceEstimator, EwmaConfig, EwmaCovarianceEstimator, SampleCovarianceEstimator,
};
use ballast_risk::{DrawdownPolicy, RiskAggregatorConfig};
use ballast_sim::MonteCarloConfig;
use ballast_sizing::{FrontierConfig, KellyConfig, OptimizerConfig, RiskParityConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How covariance is estimated from return histories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CovarianceConfig {
    /// Bessel-corrected sample covariance
    #[default]
    Sample,
    /// Exponentially weighted covariance
    Ewma(EwmaConfig),
}

impl CovarianceConfig {
    /// Build the configured estimator.
    pub fn estimator(&self) -> Result<Box<dyn CovarianceEstimator + Send + Sync>> {
        Ok(match self {
            Self::Sample => Box::new(SampleCovarianceEstimator),
            Self::Ewma(config) => Box::new(EwmaCovarianceEstimator::new(config.clone())?),
        })
    }
}

/// Configuration for every engine component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Covariance estimation
    pub covariance: CovarianceConfig,
    /// Kelly sizing
    pub kelly: KellyConfig,
    /// Mean-variance optimizer
    pub optimizer: OptimizerConfig,
    /// Efficient frontier grid
    pub frontier: FrontierConfig,
    /// Risk parity
    pub risk_parity: RiskParityConfig,
    /// Monte Carlo defaults
    pub monte_carlo: MonteCarloConfig,
    /// Drawdown thresholds
    pub drawdown: DrawdownPolicy,
    /// Composite risk report
    pub aggregator: RiskAggregatorConfig,
}

impl EngineConfig {
    /// Parse a JSON document; omitted sections keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.kelly.max_fraction, 0.25);
        assert_eq!(config.optimizer.max_iterations, 100);
        assert_eq!(config.risk_parity.max_weight, 0.5);
        assert_eq!(config.monte_carlo.num_scenarios, 10_000);
        assert_eq!(config.drawdown.halt_at, -0.20);
        assert!(matches!(config.covariance, CovarianceConfig::Sample));
    }

    #[test]
    fn test_partial_overrides() {
        let json = r#"{
            "kelly": {"max_fraction": 0.1},
            "covariance": {"method": "ewma", "decay": 0.97},
            "monte_carlo": {"seed": 7, "num_scenarios": 500}
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.kelly.max_fraction, 0.1);
        assert_eq!(config.kelly.conservative_below, 0.05);
        assert_eq!(config.monte_carlo.seed, Some(7));
        assert_eq!(config.monte_carlo.horizon_days, 252);
        match config.covariance {
            CovarianceConfig::Ewma(ewma) => {
                assert_eq!(ewma.decay, 0.97);
                assert!(ewma.bias_correction);
            }
            CovarianceConfig::Sample => panic!("expected EWMA"),
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(EngineConfig::from_json_str("{\"kelly\": 3}").is_err());
        assert!(EngineConfig::from_json_file("/nonexistent/ballast.json").is_err());
    }
}
