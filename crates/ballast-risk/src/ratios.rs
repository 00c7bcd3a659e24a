//! Risk-adjusted performance ratios
//!
//! All ratios are annualized from periodic returns. A ratio whose denominator
//! is zero or undefined is `None` rather than a placeholder number.

use crate::drawdown::analyze_drawdown;
use crate::error::{Result, RiskError};
use ballast_core::stats;
use serde::{Deserialize, Serialize};

/// Annualized risk-adjusted ratios
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAdjustedRatios {
    /// (R - rf) / σ
    pub sharpe: Option<f64>,
    /// (R - rf) / downside deviation
    pub sortino: Option<f64>,
    /// R / |max drawdown|
    pub calmar: Option<f64>,
    /// (R - rf) / β against the benchmark
    pub treynor: Option<f64>,
    /// Active return / tracking error
    pub information: Option<f64>,
}

/// Compute ratios for periodic `returns`.
///
/// `risk_free_rate` is annual. Benchmark ratios are `None` without a benchmark.
///
/// # Errors
/// * `InsufficientData` for fewer than two returns
/// * `DataQuality` for NaN or infinite returns
/// * `InvalidInput` when the benchmark length differs or `periods_per_year` is not positive
pub fn compute_ratios(
    returns: &[f64],
    benchmark: Option<&[f64]>,
    risk_free_rate: f64,
    periods_per_year: f64,
) -> Result<RiskAdjustedRatios> {
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(RiskError::invalid(format!(
            "periods per year must be positive, got {periods_per_year}"
        )));
    }
    if !risk_free_rate.is_finite() {
        return Err(RiskError::invalid("risk-free rate must be finite"));
    }
    if returns.len() < 2 {
        return Err(RiskError::insufficient(2, returns.len()));
    }
    if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
        return Err(RiskError::DataQuality(format!("return series contains {bad}")));
    }

    let annual_return = stats::mean(returns)? * periods_per_year;
    let excess = annual_return - risk_free_rate;
    let volatility = stats::std_dev(returns)? * periods_per_year.sqrt();

    let sharpe = ratio(excess, volatility);
    let sortino = stats::downside_deviation(returns)?
        .and_then(|dd| ratio(excess, dd * periods_per_year.sqrt()));

    let path = compounded_path(returns)?;
    let max_drawdown = analyze_drawdown(&path)?.max_drawdown;
    let calmar = ratio(annual_return, max_drawdown.abs());

    let (treynor, information) = match benchmark {
        None => (None, None),
        Some(bench) => {
            if bench.len() != returns.len() {
                return Err(RiskError::invalid(format!(
                    "benchmark has {} returns, portfolio has {}",
                    bench.len(),
                    returns.len()
                )));
            }
            if let Some(bad) = bench.iter().find(|r| !r.is_finite()) {
                return Err(RiskError::DataQuality(format!(
                    "benchmark series contains {bad}"
                )));
            }

            let bench_variance = stats::variance(bench)?;
            let beta = (bench_variance > 0.0)
                .then(|| stats::covariance(returns, bench))
                .transpose()?
                .map(|cov| cov / bench_variance);
            let treynor = beta.and_then(|b| ratio(excess, b));

            let active: Vec<f64> = returns.iter().zip(bench).map(|(p, b)| p - b).collect();
            let active_return = stats::mean(&active)? * periods_per_year;
            let tracking_error = stats::std_dev(&active)? * periods_per_year.sqrt();
            (treynor, ratio(active_return, tracking_error))
        }
    };

    Ok(RiskAdjustedRatios {
        sharpe,
        sortino,
        calmar,
        treynor,
        information,
    })
}

/// Value path of one unit compounded through `returns`.
///
/// # Errors
/// `InvalidInput` when a return of -100% or worse wipes out the path.
pub fn compounded_path(returns: &[f64]) -> Result<Vec<f64>> {
    let mut path = Vec::with_capacity(returns.len() + 1);
    let mut value = 1.0;
    path.push(value);
    for &r in returns {
        if r <= -1.0 {
            return Err(RiskError::invalid(format!(
                "return {r} wipes out the portfolio"
            )));
        }
        value *= 1.0 + r;
        path.push(value);
    }
    Ok(path)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0 && denominator.is_finite()).then(|| numerator / denominator)
}
