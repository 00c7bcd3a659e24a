//! Empirical tail risk
//!
//! Historical VaR and CVaR read straight off the sorted return distribution.
//! Both are reported as non-negative loss magnitudes: when the α-quantile is
//! itself a gain, the loss at that confidence is zero.

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Confidence levels reported by the risk aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// Confidence levels in (0, 1) (default: 0.95 and 0.99)
    pub confidence_levels: Vec<f64>,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            confidence_levels: vec![0.95, 0.99],
        }
    }
}

/// VaR and CVaR at one confidence level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailRisk {
    /// Confidence level α
    pub confidence: f64,
    /// Loss magnitude at the (1 - α) quantile
    pub value_at_risk: f64,
    /// Mean loss magnitude of returns at or below that quantile
    pub conditional_value_at_risk: f64,
}

/// Compute VaR and CVaR at confidence `confidence`.
///
/// The quantile is `sorted[floor(N·(1 - α))]`.
///
/// # Errors
/// * `InvalidInput` for α outside (0, 1)
/// * `InsufficientData` for fewer than two returns
/// * `DataQuality` for NaN or infinite returns
pub fn tail_risk(returns: &[f64], confidence: f64) -> Result<TailRisk> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(RiskError::invalid(format!(
            "confidence must be in (0, 1), got {confidence}"
        )));
    }
    if returns.len() < 2 {
        return Err(RiskError::insufficient(2, returns.len()));
    }
    if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
        return Err(RiskError::DataQuality(format!("return series contains {bad}")));
    }

    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let index = ((n as f64 * (1.0 - confidence)).floor() as usize).min(n - 1);
    let quantile = sorted[index];

    let tail_len = sorted.partition_point(|&r| r <= quantile);
    let tail_mean = sorted[..tail_len].iter().sum::<f64>() / tail_len as f64;

    Ok(TailRisk {
        confidence,
        value_at_risk: (-quantile).max(0.0),
        conditional_value_at_risk: (-tail_mean).max(0.0),
    })
}

/// Historical value at risk as a loss magnitude.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Result<f64> {
    Ok(tail_risk(returns, confidence)?.value_at_risk)
}

/// Historical conditional value at risk (expected shortfall) as a loss magnitude.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> Result<f64> {
    Ok(tail_risk(returns, confidence)?.conditional_value_at_risk)
}
