//! Composite risk report
//!
//! The composite score is a normalized weighted average of four sub-scores,
//! each in [0, 1]:
//!
//! | score        | definition                                          | default weight |
//! |--------------|-----------------------------------------------------|----------------|
//! | concentration| largest single-asset weight                         | 0.30           |
//! | liquidity    | weight-averaged per-position illiquidity            | 0.20           |
//! | market       | min(annualized volatility / volatility ceiling, 1)  | 0.35           |
//! | operational  | caller-supplied                                     | 0.15           |

use crate::drawdown::analyze_drawdown;
use crate::error::{Result, RiskError};
use crate::ratios::{RiskAdjustedRatios, compounded_path, compute_ratios};
use crate::tail::{TailConfig, TailRisk, tail_risk};
use ballast_core::{AssetId, AssetWeight, Periodicity, PortfolioWeights, stats};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative weights of the sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    /// Weight of the concentration score (default: 0.30)
    pub concentration: f64,
    /// Weight of the liquidity score (default: 0.20)
    pub liquidity: f64,
    /// Weight of the market score (default: 0.35)
    pub market: f64,
    /// Weight of the operational score (default: 0.15)
    pub operational: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            concentration: 0.30,
            liquidity: 0.20,
            market: 0.35,
            operational: 0.15,
        }
    }
}

impl CompositeWeights {
    fn total(&self) -> f64 {
        self.concentration + self.liquidity + self.market + self.operational
    }
}

/// Aggregator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAggregatorConfig {
    /// Sub-score weights
    pub weights: CompositeWeights,
    /// Annualized volatility mapped to a market score of 1 (default: 0.5)
    pub volatility_ceiling: f64,
    /// Annual risk-free rate for the ratios (default: 0.02)
    pub risk_free_rate: f64,
    /// Tail risk confidence levels
    pub tail: TailConfig,
}

impl Default for RiskAggregatorConfig {
    fn default() -> Self {
        Self {
            weights: CompositeWeights::default(),
            volatility_ceiling: 0.5,
            risk_free_rate: 0.02,
            tail: TailConfig::default(),
        }
    }
}

/// One holding in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Asset
    pub asset: AssetId,
    /// Fraction of capital
    pub weight: f64,
    /// Illiquidity score in [0, 1]; 0 is perfectly liquid
    #[serde(default)]
    pub illiquidity: f64,
}

/// Portfolio state to assess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Holdings; weights must sum to one
    pub positions: Vec<Position>,
    /// Periodic portfolio returns, oldest first
    pub returns: Vec<f64>,
    /// Sampling frequency of `returns`
    #[serde(default)]
    pub periodicity: Periodicity,
    /// Benchmark returns aligned with `returns`
    #[serde(default)]
    pub benchmark_returns: Option<Vec<f64>>,
    /// Operational risk score in [0, 1]
    #[serde(default)]
    pub operational_score: f64,
}

/// Overall risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum RiskClassification {
    /// Composite below 0.2
    #[display("low")]
    Low,
    /// Composite below 0.4
    #[display("medium")]
    Medium,
    /// Composite below 0.7
    #[display("high")]
    High,
    /// Composite 0.7 or above
    #[display("extreme")]
    Extreme,
}

impl RiskClassification {
    /// Classify a composite score.
    pub fn from_score(score: f64) -> Self {
        if score < 0.2 {
            Self::Low
        } else if score < 0.4 {
            Self::Medium
        } else if score < 0.7 {
            Self::High
        } else {
            Self::Extreme
        }
    }
}

/// Sub-scores in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScores {
    /// Largest single-asset weight
    pub concentration: f64,
    /// Weight-averaged illiquidity
    pub liquidity: f64,
    /// Volatility relative to the ceiling
    pub market: f64,
    /// Caller-supplied operational score
    pub operational: f64,
}

/// Composite risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetricsSnapshot {
    /// Sub-scores
    pub scores: RiskScores,
    /// Weighted composite in [0, 1]
    pub composite_score: f64,
    /// Classification of the composite
    pub classification: RiskClassification,
    /// Annualized risk-adjusted ratios
    pub ratios: RiskAdjustedRatios,
    /// VaR and CVaR at each configured confidence
    pub tail_risk: Vec<TailRisk>,
    /// Deepest drawdown of the compounded return path (≤ 0)
    pub max_drawdown: f64,
    /// Annualized mean return
    pub annualized_return: f64,
    /// Annualized volatility
    pub annualized_volatility: f64,
}

/// Builds composite risk reports
#[derive(Debug, Clone, Default)]
pub struct RiskAggregator {
    config: RiskAggregatorConfig,
}

impl RiskAggregator {
    /// Create an aggregator, validating the configuration.
    pub fn new(config: RiskAggregatorConfig) -> Result<Self> {
        let w = config.weights;
        let parts = [w.concentration, w.liquidity, w.market, w.operational];
        if parts.iter().any(|x| !(x.is_finite() && *x >= 0.0)) || w.total() <= 0.0 {
            return Err(RiskError::invalid(
                "composite weights must be non-negative with a positive sum",
            ));
        }
        if !(config.volatility_ceiling.is_finite() && config.volatility_ceiling > 0.0) {
            return Err(RiskError::invalid(format!(
                "volatility ceiling must be positive, got {}",
                config.volatility_ceiling
            )));
        }
        if let Some(c) = config
            .tail
            .confidence_levels
            .iter()
            .find(|c| !(**c > 0.0 && **c < 1.0))
        {
            return Err(RiskError::invalid(format!(
                "tail confidence must be in (0, 1), got {c}"
            )));
        }
        Ok(Self { config })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &RiskAggregatorConfig {
        &self.config
    }

    /// Assess a portfolio snapshot.
    ///
    /// # Errors
    /// * `InvalidInput` when weights do not form a valid portfolio or a score
    ///   lies outside [0, 1]
    /// * `InsufficientData` for fewer than two returns
    /// * `DataQuality` for NaN or infinite inputs
    pub fn assess(&self, snapshot: &PortfolioSnapshot) -> Result<RiskMetricsSnapshot> {
        let weights = PortfolioWeights::new(
            snapshot
                .positions
                .iter()
                .map(|p| AssetWeight {
                    asset: p.asset.clone(),
                    weight: p.weight,
                })
                .collect(),
        )?;
        for p in &snapshot.positions {
            check_score(p.illiquidity, &format!("illiquidity of {}", p.asset))?;
        }
        check_score(snapshot.operational_score, "operational score")?;

        let returns = &snapshot.returns;
        let ppy = snapshot.periodicity.periods_per_year();
        let annualized_return = stats::mean(returns)? * ppy;
        let annualized_volatility = stats::annualized_volatility(returns, ppy)?;

        let scores = RiskScores {
            concentration: weights.max_weight().clamp(0.0, 1.0),
            liquidity: snapshot
                .positions
                .iter()
                .map(|p| p.weight * p.illiquidity)
                .sum::<f64>()
                .clamp(0.0, 1.0),
            market: (annualized_volatility / self.config.volatility_ceiling).min(1.0),
            operational: snapshot.operational_score,
        };

        let w = self.config.weights;
        let composite_score = (w.concentration * scores.concentration
            + w.liquidity * scores.liquidity
            + w.market * scores.market
            + w.operational * scores.operational)
            / w.total();
        let classification = RiskClassification::from_score(composite_score);

        let ratios = compute_ratios(
            returns,
            snapshot.benchmark_returns.as_deref(),
            self.config.risk_free_rate,
            ppy,
        )?;
        let tails = self
            .config
            .tail
            .confidence_levels
            .iter()
            .map(|&c| tail_risk(returns, c))
            .collect::<Result<Vec<_>>>()?;
        let max_drawdown = analyze_drawdown(&compounded_path(returns)?)?.max_drawdown;

        debug!(
            composite_score,
            %classification,
            positions = snapshot.positions.len(),
            "assessed portfolio risk"
        );

        Ok(RiskMetricsSnapshot {
            scores,
            composite_score,
            classification,
            ratios,
            tail_risk: tails,
            max_drawdown,
            annualized_return,
            annualized_volatility,
        })
    }
}

fn check_score(value: f64, context: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(RiskError::DataQuality(format!("{context} is {value}")));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(RiskError::invalid(format!(
            "{context} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}
