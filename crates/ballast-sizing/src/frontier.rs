//! Efficient frontier sweep
//!
//! Runs the optimizer once per risk tolerance on a fixed grid. Sweep points are
//! independent, so they run on the rayon pool; the result is sorted by risk.

use crate::error::{Result, SizingError};
use crate::optimizer::MeanVarianceOptimizer;
use ballast_core::{Completion, MarketStatistics, PortfolioWeights, RunControl};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Risk tolerance grid
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// First risk tolerance (default: 0.1)
    pub min_risk_tolerance: f64,
    /// Last risk tolerance, inclusive (default: 2.0)
    pub max_risk_tolerance: f64,
    /// Grid spacing (default: 0.1)
    pub step: f64,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            min_risk_tolerance: 0.1,
            max_risk_tolerance: 2.0,
            step: 0.1,
        }
    }
}

impl FrontierConfig {
    /// Risk tolerances on the grid, ascending.
    pub fn grid(&self) -> Result<Vec<f64>> {
        let valid = self.min_risk_tolerance.is_finite()
            && self.max_risk_tolerance.is_finite()
            && self.step.is_finite()
            && self.min_risk_tolerance >= 0.0
            && self.max_risk_tolerance >= self.min_risk_tolerance
            && self.step > 0.0;
        if !valid {
            return Err(SizingError::invalid(format!(
                "invalid frontier grid {} to {} by {}",
                self.min_risk_tolerance, self.max_risk_tolerance, self.step
            )));
        }
        let span = self.max_risk_tolerance - self.min_risk_tolerance;
        // Round so 0.1..=2.0 by 0.1 yields 20 points despite float error
        let points = (span / self.step + 1e-9).floor() as usize + 1;
        Ok((0..points)
            .map(|k| self.min_risk_tolerance + k as f64 * self.step)
            .collect())
    }
}

/// One point on the frontier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Risk tolerance the point was optimized for
    pub risk_tolerance: f64,
    /// Portfolio volatility
    pub risk: f64,
    /// Portfolio expected return
    pub expected_return: f64,
    /// Sharpe ratio, if defined
    pub sharpe_ratio: Option<f64>,
    /// Optimal weights
    pub weights: PortfolioWeights,
    /// Completion of the underlying optimization
    pub completion: Completion,
}

/// Frontier points and whether the whole grid was optimized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frontier {
    /// Points sorted by ascending risk
    pub points: Vec<FrontierPoint>,
    /// `completed` counts grid points whose optimization ran to the end;
    /// `points` may also hold partially optimized ones
    pub completion: Completion,
}

impl Frontier {
    /// Number of points traced.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no point was traced.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Trace the efficient frontier.
///
/// Grid points the run control stops before their first iteration are
/// skipped; the frontier is then labelled incomplete.
///
/// # Errors
/// * `Timeout` when no grid point produced a result
/// * any other optimizer error at any grid point, or an invalid grid
pub fn efficient_frontier(
    optimizer: &MeanVarianceOptimizer,
    market: &MarketStatistics,
    config: &FrontierConfig,
    control: &RunControl,
) -> Result<Frontier> {
    let grid = config.grid()?;

    let outcomes = grid
        .par_iter()
        .map(|&risk_tolerance| match optimizer.optimize(market, risk_tolerance, control) {
            Ok(result) => Ok(Ok(FrontierPoint {
                risk_tolerance,
                risk: result.expected_volatility,
                expected_return: result.expected_return,
                sharpe_ratio: result.sharpe_ratio,
                weights: result.weights,
                completion: result.completion,
            })),
            Err(SizingError::Timeout { reason }) => Ok(Err(reason)),
            Err(e) => Err(e),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut points = Vec::with_capacity(grid.len());
    let mut skipped = None;
    for outcome in outcomes {
        match outcome {
            Ok(point) => points.push(point),
            Err(reason) => {
                skipped.get_or_insert(reason);
            }
        }
    }

    let stopped = skipped.or_else(|| {
        points.iter().find_map(|p| match p.completion {
            Completion::Incomplete { reason, .. } => Some(reason),
            Completion::Complete => None,
        })
    });
    let completion = match stopped {
        Some(reason) if points.is_empty() => return Err(SizingError::Timeout { reason }),
        Some(reason) => {
            let completed = points.iter().filter(|p| p.completion.is_complete()).count();
            warn!(
                points = points.len(),
                completed,
                requested = grid.len(),
                ?reason,
                "frontier sweep stopped early"
            );
            Completion::Incomplete {
                completed,
                requested: grid.len(),
                reason,
            }
        }
        None => Completion::Complete,
    };

    points.sort_by(|a, b| a.risk.total_cmp(&b.risk));
    debug!(points = points.len(), "traced efficient frontier");
    Ok(Frontier { points, completion })
}
