//! Sample covariance estimator
//!
//! The unbiased sample covariance:
//! Cov(i,j) = Σ_t (r_{i,t} - mean_i)(r_{j,t} - mean_j) / (T - 1)

use super::CovarianceEstimator;
use crate::error::{Result, StatsError, ensure_finite};
use ndarray::{Array2, Axis};

/// Bessel-corrected sample covariance estimator
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleCovarianceEstimator;

impl CovarianceEstimator for SampleCovarianceEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>> {
        let (n_periods, _n_assets) = returns.dim();
        if n_periods < 2 {
            return Err(StatsError::insufficient(2, n_periods));
        }
        if let Some(slice) = returns.as_slice() {
            ensure_finite(slice, "sample covariance input")?;
        } else if returns.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::data_quality(
                "sample covariance input contains non-finite values",
            ));
        }

        let means = returns
            .mean_axis(Axis(0))
            .ok_or_else(|| StatsError::insufficient(1, 0))?;
        let centered = returns - &means.insert_axis(Axis(0));

        Ok(centered.t().dot(&centered) / (n_periods as f64 - 1.0))
    }
}
