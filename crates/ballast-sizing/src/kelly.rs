//! Kelly Criterion position sizing
//!
//! The Kelly fraction maximizes long-run logarithmic growth for a repeated bet
//! with win probability p and payoff ratio R = avg_win / avg_loss:
//!
//! kelly = (p * R - (1 - p)) / R
//!
//! Full Kelly is notoriously aggressive, so the raw fraction is scaled by a
//! confidence factor ("fractional Kelly") and clamped to `[0, max_fraction]`.
//! A negative raw fraction means the edge is negative: the position is not
//! taken (fraction 0), which is a valid answer rather than an error.

use crate::error::{Result, SizingError};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Kelly calculator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    /// Upper bound on the recommended fraction (default: 0.25)
    pub max_fraction: f64,

    /// Fractions below this are conservative (default: 0.05)
    pub conservative_below: f64,

    /// Fractions below this (and at least `conservative_below`) are moderate (default: 0.15)
    pub moderate_below: f64,

    /// Probability of the losing streak used for the drawdown estimate (default: 0.01)
    pub ruin_probability: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            max_fraction: 0.25,
            conservative_below: 0.05,
            moderate_below: 0.15,
            ruin_probability: 0.01,
        }
    }
}

/// Aggressiveness of a recommended fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Small fraction of capital at risk
    #[display("conservative")]
    Conservative,
    /// Middle band
    #[display("moderate")]
    Moderate,
    /// Large fraction of capital at risk
    #[display("aggressive")]
    Aggressive,
}

/// Inputs to a Kelly calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KellyInput {
    /// Probability of a winning trade, in (0, 1)
    pub win_probability: f64,
    /// Average gain of a winning trade (> 0)
    pub avg_win: f64,
    /// Average loss magnitude of a losing trade (> 0)
    pub avg_loss: f64,
    /// Fraction of full Kelly to use, in (0, 1] (default: 1)
    pub confidence_factor: f64,
}

impl KellyInput {
    /// Full-Kelly input.
    pub const fn new(win_probability: f64, avg_win: f64, avg_loss: f64) -> Self {
        Self {
            win_probability,
            avg_win,
            avg_loss,
            confidence_factor: 1.0,
        }
    }

    /// Use a fraction of full Kelly.
    pub const fn with_confidence(mut self, confidence_factor: f64) -> Self {
        self.confidence_factor = confidence_factor;
        self
    }

    /// Estimate inputs from a history of per-trade returns.
    ///
    /// Positive values are wins, negative values losses; flat trades are
    /// ignored. At least one win and one loss are required.
    pub fn from_trade_returns(trades: &[f64]) -> Result<Self> {
        if let Some(bad) = trades.iter().find(|t| !t.is_finite()) {
            return Err(SizingError::DataQuality(format!(
                "trade history contains {bad}"
            )));
        }
        let wins: Vec<f64> = trades.iter().copied().filter(|t| *t > 0.0).collect();
        let losses: Vec<f64> = trades.iter().copied().filter(|t| *t < 0.0).collect();
        if wins.is_empty() || losses.is_empty() {
            return Err(SizingError::InsufficientData(format!(
                "need at least one win and one loss, got {} wins and {} losses",
                wins.len(),
                losses.len()
            )));
        }

        let decided = (wins.len() + losses.len()) as f64;
        Ok(Self::new(
            wins.len() as f64 / decided,
            wins.iter().sum::<f64>() / wins.len() as f64,
            losses.iter().map(|l| l.abs()).sum::<f64>() / losses.len() as f64,
        ))
    }

    fn validate(&self) -> Result<()> {
        let p = self.win_probability;
        if !(p.is_finite() && p > 0.0 && p < 1.0) {
            return Err(SizingError::invalid(format!(
                "win probability must be in (0, 1), got {p}"
            )));
        }
        if !(self.avg_win.is_finite() && self.avg_win > 0.0) {
            return Err(SizingError::invalid(format!(
                "average win must be positive, got {}",
                self.avg_win
            )));
        }
        if !(self.avg_loss.is_finite() && self.avg_loss > 0.0) {
            return Err(SizingError::invalid(format!(
                "average loss must be positive, got {}",
                self.avg_loss
            )));
        }
        let c = self.confidence_factor;
        if !(c.is_finite() && c > 0.0 && c <= 1.0) {
            return Err(SizingError::invalid(format!(
                "confidence factor must be in (0, 1], got {c}"
            )));
        }
        Ok(())
    }
}

/// Recommended position size and its diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellyResult {
    /// Recommended fraction of capital, in `[0, max_fraction]`
    pub optimal_fraction: f64,
    /// Unclamped full-Kelly fraction (negative when the edge is negative)
    pub raw_fraction: f64,
    /// Expected gain per unit staked: p * avg_win - (1 - p) * avg_loss
    pub expected_return: f64,
    /// Win probability used
    pub win_probability: f64,
    /// Average win used
    pub avg_win: f64,
    /// Average loss used
    pub avg_loss: f64,
    /// avg_win / avg_loss
    pub payoff_ratio: f64,
    /// Classification of `optimal_fraction`
    pub risk_level: RiskLevel,
    /// Loss from a losing streak whose probability is `ruin_probability`
    pub max_drawdown_estimate: f64,
}

/// Kelly criterion calculator
#[derive(Debug, Clone, Default)]
pub struct KellyCalculator {
    config: KellyConfig,
}

impl KellyCalculator {
    /// Create a calculator, validating the configuration.
    pub fn new(config: KellyConfig) -> Result<Self> {
        if !(config.max_fraction > 0.0 && config.max_fraction <= 1.0) {
            return Err(SizingError::invalid(format!(
                "Kelly cap must be in (0, 1], got {}",
                config.max_fraction
            )));
        }
        if !(config.conservative_below > 0.0 && config.conservative_below < config.moderate_below)
        {
            return Err(SizingError::invalid(
                "Kelly thresholds must satisfy 0 < conservative_below < moderate_below",
            ));
        }
        if !(config.ruin_probability > 0.0 && config.ruin_probability < 1.0) {
            return Err(SizingError::invalid(format!(
                "streak probability must be in (0, 1), got {}",
                config.ruin_probability
            )));
        }
        Ok(Self { config })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &KellyConfig {
        &self.config
    }

    /// Compute the recommended fraction.
    ///
    /// # Errors
    /// `InvalidInput` when p is outside (0, 1), a payoff is not positive, or
    /// the confidence factor is outside (0, 1].
    pub fn compute(&self, input: &KellyInput) -> Result<KellyResult> {
        input.validate()?;

        let p = input.win_probability;
        let payoff_ratio = input.avg_win / input.avg_loss;
        let raw_fraction = (p * payoff_ratio - (1.0 - p)) / payoff_ratio;
        let optimal_fraction =
            (raw_fraction * input.confidence_factor).clamp(0.0, self.config.max_fraction);

        if raw_fraction <= 0.0 {
            warn!(raw_fraction, "negative edge, Kelly recommends no position");
        }

        let expected_return = p * input.avg_win - (1.0 - p) * input.avg_loss;

        // Length of a losing streak that occurs with probability `ruin_probability`
        let consecutive_losses = self.config.ruin_probability.ln() / (1.0 - p).ln();
        let max_drawdown_estimate = optimal_fraction * input.avg_loss * consecutive_losses;

        let risk_level = self.classify(optimal_fraction);
        debug!(raw_fraction, optimal_fraction, %risk_level, "computed Kelly fraction");

        Ok(KellyResult {
            optimal_fraction,
            raw_fraction,
            expected_return,
            win_probability: p,
            avg_win: input.avg_win,
            avg_loss: input.avg_loss,
            payoff_ratio,
            risk_level,
            max_drawdown_estimate,
        })
    }

    fn classify(&self, fraction: f64) -> RiskLevel {
        if fraction < self.config.conservative_below {
            RiskLevel::Conservative
        } else if fraction < self.config.moderate_below {
            RiskLevel::Moderate
        } else {
            RiskLevel::Aggressive
        }
    }
}
