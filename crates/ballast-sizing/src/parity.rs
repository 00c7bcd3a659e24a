//! Risk parity allocation
//!
//! Two methods are supported:
//!
//! * **Inverse volatility** (default): each asset's stand-alone risk w_i·σ_i
//!   is equalized by setting w_i ∝ 1/σ_i. Correlations are ignored.
//! * **Equal risk contribution**: each asset's share of portfolio variance,
//!   w_i(Σw)_i / wᵀΣw, is equalized using the full covariance matrix. Solved by
//!   cyclical coordinate descent on the budgeting first-order conditions
//!   (Griveau-Billion, Richard and Roncalli, 2013).
//!
//! In both cases the target weights are capped at `max_weight`, with the excess
//! redistributed proportionally among the remaining assets.

use crate::error::{Result, SizingError};
use crate::projection::cap_and_redistribute;
use ballast_core::{AssetId, MarketStatistics, PortfolioWeights};
use derive_more::Display;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How risk is measured and equalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RiskParityMethod {
    /// w_i ∝ 1/σ_i
    #[default]
    #[display("inverse_volatility")]
    InverseVolatility,
    /// Equal shares of portfolio variance
    #[display("equal_risk_contribution")]
    EqualRiskContribution,
}

/// Risk parity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParityConfig {
    /// Allocation method (default: inverse volatility)
    pub method: RiskParityMethod,

    /// Largest weight any single asset may receive (default: 0.5)
    pub max_weight: f64,

    /// Convergence tolerance on risk shares for equal risk contribution (default: 1e-10)
    pub tolerance: f64,

    /// Sweep budget for equal risk contribution (default: 500)
    pub max_iterations: usize,
}

impl Default for RiskParityConfig {
    fn default() -> Self {
        Self {
            method: RiskParityMethod::InverseVolatility,
            max_weight: 0.5,
            tolerance: 1e-10,
            max_iterations: 500,
        }
    }
}

/// Correlation to another asset in the universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCorrelation {
    /// The other asset
    pub asset: AssetId,
    /// Pairwise correlation
    pub correlation: f64,
}

/// Allocation for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParityAllocation {
    /// Asset
    pub asset: AssetId,
    /// Weight before rebalancing
    pub current_weight: f64,
    /// Risk parity weight
    pub adjusted_weight: f64,
    /// Share of total risk at the current weights (shares sum to 1)
    pub risk_contribution: f64,
    /// Target share, 1/N
    pub target_contribution: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// Correlation to every other asset
    pub correlations: Vec<AssetCorrelation>,
    /// Mean of `correlations`; `None` for a single-asset universe
    pub average_correlation: Option<f64>,
}

/// Risk parity allocator
#[derive(Debug, Clone, Default)]
pub struct RiskParityAllocator {
    config: RiskParityConfig,
}

impl RiskParityAllocator {
    /// Create an allocator, validating the configuration.
    pub fn new(config: RiskParityConfig) -> Result<Self> {
        if !(config.max_weight.is_finite() && config.max_weight > 0.0 && config.max_weight <= 1.0)
        {
            return Err(SizingError::invalid(format!(
                "max weight must be in (0, 1], got {}",
                config.max_weight
            )));
        }
        if !(config.tolerance.is_finite() && config.tolerance > 0.0) || config.max_iterations == 0
        {
            return Err(SizingError::invalid(
                "risk parity needs a positive tolerance and iteration budget",
            ));
        }
        Ok(Self { config })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &RiskParityConfig {
        &self.config
    }

    /// Compute risk parity weights.
    ///
    /// `current` is the caller's existing allocation; without one the
    /// inverse-volatility portfolio is reported as current.
    ///
    /// # Errors
    /// * `DataQuality` when an asset has zero volatility
    /// * `InvalidInput` when `N * max_weight < 1`
    pub fn allocate(
        &self,
        market: &MarketStatistics,
        current: Option<&PortfolioWeights>,
    ) -> Result<Vec<RiskParityAllocation>> {
        let n = market.len();
        let assets = market.assets();
        let volatilities = market.volatilities();

        if let Some(i) = volatilities.iter().position(|&v| !(v.is_finite() && v > 0.0)) {
            return Err(SizingError::DataQuality(format!(
                "{} has volatility {}; risk parity is undefined",
                assets[i], volatilities[i]
            )));
        }
        if (n as f64) * self.config.max_weight < 1.0 {
            return Err(SizingError::invalid(format!(
                "max weight {} cannot hold {n} assets fully invested",
                self.config.max_weight
            )));
        }

        let inverse_vol = normalized(volatilities.mapv(f64::recip));
        let current_weights = current.map_or_else(|| inverse_vol.clone(), |w| w.aligned_to(assets));
        let sigma = market.covariance().matrix();

        let (mut adjusted, contributions) = match self.config.method {
            RiskParityMethod::InverseVolatility => {
                let standalone = &current_weights * volatilities;
                (inverse_vol, shares(standalone))
            }
            RiskParityMethod::EqualRiskContribution => {
                let erc = self.equal_risk_contribution(sigma, inverse_vol)?;
                (erc, variance_shares(sigma, &current_weights))
            }
        };
        cap_and_redistribute(&mut adjusted, self.config.max_weight)?;

        let correlation = market.correlation();
        let target = 1.0 / n as f64;
        let allocations = (0..n)
            .map(|i| {
                let correlations: Vec<AssetCorrelation> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| AssetCorrelation {
                        asset: assets[j].clone(),
                        correlation: correlation[[i, j]],
                    })
                    .collect();
                let average_correlation = (!correlations.is_empty()).then(|| {
                    correlations.iter().map(|c| c.correlation).sum::<f64>()
                        / correlations.len() as f64
                });
                RiskParityAllocation {
                    asset: assets[i].clone(),
                    current_weight: current_weights[i],
                    adjusted_weight: adjusted[i],
                    risk_contribution: contributions[i],
                    target_contribution: target,
                    volatility: volatilities[i],
                    correlations,
                    average_correlation,
                }
            })
            .collect();

        debug!(assets = n, method = %self.config.method, "computed risk parity allocation");
        Ok(allocations)
    }

    /// Cyclical coordinate descent for equal variance shares.
    ///
    /// Each coordinate solves Σ_ii w_i² + b_i w_i - 1/N = 0 with
    /// b_i = Σ_{j≠i} Σ_ij w_j, taking the positive root.
    fn equal_risk_contribution(&self, sigma: &Array2<f64>, start: Array1<f64>) -> Result<Array1<f64>> {
        let n = start.len();
        let budget = 1.0 / n as f64;
        let mut w = start;

        for sweep in 0..self.config.max_iterations {
            for i in 0..n {
                let diag = sigma[[i, i]];
                let b: f64 = (0..n).filter(|&j| j != i).map(|j| sigma[[i, j]] * w[j]).sum();
                w[i] = (-b + (b * b + 4.0 * diag * budget).sqrt()) / (2.0 * diag);
            }
            if w.iter().any(|x| !x.is_finite()) {
                return Err(SizingError::DataQuality(format!(
                    "equal risk contribution diverged at sweep {}",
                    sweep + 1
                )));
            }

            let deviation = variance_shares(sigma, &w)
                .iter()
                .fold(0.0_f64, |acc, s| acc.max((s - budget).abs()));
            if deviation < self.config.tolerance {
                debug!(sweeps = sweep + 1, "equal risk contribution converged");
                return Ok(normalized(w));
            }
        }

        warn!(
            sweeps = self.config.max_iterations,
            "equal risk contribution did not reach tolerance"
        );
        Ok(normalized(w))
    }
}

fn normalized(weights: Array1<f64>) -> Array1<f64> {
    let total = weights.sum();
    weights / total
}

fn shares(contributions: Array1<f64>) -> Array1<f64> {
    let total = contributions.sum();
    if total > 0.0 {
        contributions / total
    } else {
        contributions
    }
}

/// w_i(Σw)_i / wᵀΣw
fn variance_shares(sigma: &Array2<f64>, weights: &Array1<f64>) -> Array1<f64> {
    let marginal = sigma.dot(weights);
    shares(weights * &marginal)
}
