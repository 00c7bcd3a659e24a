//! Mean-variance portfolio optimizer
//!
//! Maximizes the quadratic utility
//!
//! U(w) = wᵀr - λ wᵀΣw
//!
//! subject to Σw = 1 and per-asset bounds, by projected gradient ascent from
//! equal weights. Each iteration steps along ∇U = r - 2λΣw and projects back
//! onto the bounded simplex (see [`crate::projection`]). With a step below
//! 1 / (2λ·max eigenvalue of Σ) every iteration is non-decreasing in utility.
//!
//! The method is a heuristic with a fixed iteration budget; it reports its
//! utility trace so callers can check progress rather than assume optimality.

use crate::error::{Result, SizingError};
use crate::projection::project_onto_bounds;
use ballast_core::{Completion, MarketStatistics, PortfolioWeights, RunControl, WeightBounds};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Iteration budget (default: 100)
    pub max_iterations: usize,

    /// Gradient step size (default: 0.01)
    pub step_size: f64,

    /// Stop once no weight moves by more than this (default: 1e-9)
    pub tolerance: f64,

    /// Annual risk-free rate for the Sharpe ratio (default: 0.02)
    pub risk_free_rate: f64,

    /// Per-asset weight bounds (default: [0, 1])
    pub bounds: WeightBounds,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            step_size: 0.01,
            tolerance: 1e-9,
            risk_free_rate: 0.02,
            bounds: WeightBounds::default(),
        }
    }
}

/// Optimized portfolio and its diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOptimization {
    /// Optimal weights
    pub weights: PortfolioWeights,
    /// wᵀr
    pub expected_return: f64,
    /// sqrt(wᵀΣw)
    pub expected_volatility: f64,
    /// (return - risk free) / volatility; `None` for a riskless portfolio
    pub sharpe_ratio: Option<f64>,
    /// Risk tolerance parameter λ used
    pub risk_tolerance: f64,
    /// Final utility
    pub utility: f64,
    /// Utility after each completed iteration
    pub utility_trace: Vec<f64>,
    /// Iterations run
    pub iterations: usize,
    /// Whether the weights stopped moving before the budget ran out
    pub converged: bool,
    /// Whether every requested iteration ran
    pub completion: Completion,
}

/// Projected gradient mean-variance optimizer
#[derive(Debug, Clone, Default)]
pub struct MeanVarianceOptimizer {
    config: OptimizerConfig,
}

impl MeanVarianceOptimizer {
    /// Create an optimizer, validating the configuration.
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        if config.max_iterations == 0 {
            return Err(SizingError::invalid("optimizer needs at least one iteration"));
        }
        if !(config.step_size.is_finite() && config.step_size > 0.0) {
            return Err(SizingError::invalid(format!(
                "step size must be positive, got {}",
                config.step_size
            )));
        }
        if !(config.tolerance.is_finite() && config.tolerance >= 0.0) {
            return Err(SizingError::invalid(format!(
                "tolerance must be non-negative, got {}",
                config.tolerance
            )));
        }
        if !config.risk_free_rate.is_finite() {
            return Err(SizingError::invalid("risk-free rate must be finite"));
        }
        Ok(Self { config })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize weights for the given market and risk tolerance.
    ///
    /// # Errors
    /// * `InvalidInput` for a negative or non-finite risk tolerance, or bounds
    ///   that cannot hold a fully invested portfolio
    /// * `DataQuality` when the iteration produces NaN or infinity
    /// * `Timeout` when `control` stops the run before the first iteration
    pub fn optimize(
        &self,
        market: &MarketStatistics,
        risk_tolerance: f64,
        control: &RunControl,
    ) -> Result<PortfolioOptimization> {
        if !(risk_tolerance.is_finite() && risk_tolerance >= 0.0) {
            return Err(SizingError::invalid(format!(
                "risk tolerance must be a non-negative number, got {risk_tolerance}"
            )));
        }
        let n = market.len();
        let bounds = self.config.bounds;
        bounds.validate_for(n)?;

        let r = market.expected_returns();
        let sigma = market.covariance().matrix();
        let utility = |w: &Array1<f64>| r.dot(w) - risk_tolerance * w.dot(&sigma.dot(w));

        let mut weights = project_onto_bounds(Array1::from_elem(n, 1.0 / n as f64).view(), &bounds)?;
        let mut utility_trace = Vec::new();
        let mut converged = false;
        let mut stopped = None;

        for _ in 0..self.config.max_iterations {
            if let Some(reason) = control.stop_reason() {
                stopped = Some(reason);
                break;
            }

            let gradient = r - &(sigma.dot(&weights) * (2.0 * risk_tolerance));
            let stepped = &weights + &(gradient * self.config.step_size);
            let next = project_onto_bounds(stepped.view(), &bounds)?;

            let value = utility(&next);
            if !value.is_finite() {
                return Err(SizingError::DataQuality(format!(
                    "utility became {value} at iteration {}",
                    utility_trace.len() + 1
                )));
            }

            let max_change = (&next - &weights)
                .iter()
                .fold(0.0_f64, |acc, d| acc.max(d.abs()));
            weights = next;
            utility_trace.push(value);
            control.tick();

            if max_change < self.config.tolerance {
                converged = true;
                break;
            }
        }

        let iterations = utility_trace.len();
        let completion = match stopped {
            Some(reason) if iterations == 0 => return Err(SizingError::Timeout { reason }),
            Some(reason) => {
                warn!(iterations, ?reason, "optimizer stopped early");
                Completion::Incomplete {
                    completed: iterations,
                    requested: self.config.max_iterations,
                    reason,
                }
            }
            None => Completion::Complete,
        };

        let expected_return = r.dot(&weights);
        let variance = market.covariance().quadratic_form(weights.view())?;
        let expected_volatility = variance.max(0.0).sqrt();
        let sharpe_ratio = (expected_volatility > 0.0)
            .then(|| (expected_return - self.config.risk_free_rate) / expected_volatility);
        let final_utility = expected_return - risk_tolerance * variance;

        debug!(
            assets = n,
            risk_tolerance,
            iterations,
            converged,
            utility = final_utility,
            "optimized portfolio"
        );

        Ok(PortfolioOptimization {
            weights: PortfolioWeights::from_array(market.assets(), &weights, bounds)?,
            expected_return,
            expected_volatility,
            sharpe_ratio,
            risk_tolerance,
            utility: final_utility,
            utility_trace,
            iterations,
            converged,
            completion,
        })
    }
}
