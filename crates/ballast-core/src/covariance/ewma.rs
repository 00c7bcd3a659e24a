//! Exponentially Weighted Moving Average (EWMA) Covariance Estimator
//!
//! EWMA gives more weight to recent observations, making the estimate
//! responsive to changing market conditions.
//!
//! Observation t (of T) receives weight w_t ∝ λ^(T-1-t), normalized to sum to 1:
//! Cov(i,j) = Σ_t w_t (r_{i,t} - m_i)(r_{j,t} - m_j)
//!
//! where m is the weighted mean and λ the decay factor (0.94 is the
//! RiskMetrics daily convention). With bias correction the estimate is divided
//! by 1 - Σ w_t², which reduces to Bessel's correction as λ → 1.

use super::CovarianceEstimator;
use crate::error::{Result, StatsError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// EWMA covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EwmaConfig {
    /// Decay factor λ (default: 0.94)
    /// Higher values = more weight on past, slower adaptation
    pub decay: f64,

    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,

    /// Divide by 1 - Σw² so small samples are not biased low (default: true)
    pub bias_correction: bool,
}

impl Default for EwmaConfig {
    fn default() -> Self {
        Self {
            decay: 0.94,
            min_observations: 2,
            bias_correction: true,
        }
    }
}

/// EWMA covariance estimator
#[derive(Debug, Clone)]
pub struct EwmaCovarianceEstimator {
    config: EwmaConfig,
}

impl EwmaCovarianceEstimator {
    /// Create a new EWMA estimator with the given configuration
    pub fn new(config: EwmaConfig) -> Result<Self> {
        if !(config.decay > 0.0 && config.decay < 1.0) {
            return Err(StatsError::invalid(format!(
                "EWMA decay must be in (0, 1), got {}",
                config.decay
            )));
        }
        if config.min_observations < 2 {
            return Err(StatsError::invalid(
                "EWMA needs a minimum of at least 2 observations",
            ));
        }
        Ok(Self { config })
    }

    /// Half-life of the weighting scheme in periods: ln(0.5) / ln(λ)
    pub fn half_life(&self) -> f64 {
        0.5_f64.ln() / self.config.decay.ln()
    }

    /// Normalized observation weights, oldest first
    fn weights(&self, n_periods: usize) -> Array1<f64> {
        let lambda = self.config.decay;
        let raw = Array1::from_shape_fn(n_periods, |t| lambda.powf((n_periods - 1 - t) as f64));
        let total = raw.sum();
        raw / total
    }
}

impl CovarianceEstimator for EwmaCovarianceEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>> {
        let (n_periods, n_assets) = returns.dim();
        if n_periods < self.config.min_observations {
            return Err(StatsError::insufficient(
                self.config.min_observations,
                n_periods,
            ));
        }
        if returns.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::data_quality(
                "EWMA covariance input contains non-finite values",
            ));
        }

        let weights = self.weights(n_periods);
        let means = returns.t().dot(&weights);

        let mut cov = Array2::<f64>::zeros((n_assets, n_assets));
        for (t, row) in returns.rows().into_iter().enumerate() {
            let w = weights[t];
            for i in 0..n_assets {
                let di = row[i] - means[i];
                for j in i..n_assets {
                    cov[[i, j]] += w * di * (row[j] - means[j]);
                }
            }
        }
        for i in 0..n_assets {
            for j in 0..i {
                cov[[i, j]] = cov[[j, i]];
            }
        }

        if self.config.bias_correction {
            let concentration = weights.dot(&weights);
            cov /= 1.0 - concentration;
        }

        Ok(cov)
    }
}
