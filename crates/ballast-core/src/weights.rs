//! Portfolio weights

use crate::error::{Result, StatsError};
use crate::series::AssetId;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Tolerance on `Σw = 1`.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Inclusive bounds on a single asset weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    /// Smallest allowed weight
    pub min: f64,
    /// Largest allowed weight
    pub max: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl WeightBounds {
    /// Check that `n` weights inside these bounds can sum to one.
    pub fn validate_for(&self, n: usize) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(StatsError::invalid(format!(
                "invalid weight bounds [{}, {}]",
                self.min, self.max
            )));
        }
        let n = n as f64;
        if n * self.min > 1.0 + WEIGHT_SUM_TOLERANCE || n * self.max < 1.0 - WEIGHT_SUM_TOLERANCE
        {
            return Err(StatsError::invalid(format!(
                "{n} weights within [{}, {}] cannot sum to 1",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Whether `w` lies inside the bounds (with the sum tolerance as slack).
    pub fn contains(&self, w: f64) -> bool {
        w >= self.min - WEIGHT_SUM_TOLERANCE && w <= self.max + WEIGHT_SUM_TOLERANCE
    }
}

/// One asset's allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetWeight {
    /// Asset
    pub asset: AssetId,
    /// Fraction of capital
    pub weight: f64,
}

/// Fully invested allocation: weights sum to one and respect their bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AssetWeight>", into = "Vec<AssetWeight>")]
pub struct PortfolioWeights {
    entries: Vec<AssetWeight>,
}

impl PortfolioWeights {
    /// Validate weights against the default `[0, 1]` bounds.
    pub fn new(entries: Vec<AssetWeight>) -> Result<Self> {
        Self::with_bounds(entries, WeightBounds::default())
    }

    /// Validate weights against explicit bounds.
    pub fn with_bounds(entries: Vec<AssetWeight>, bounds: WeightBounds) -> Result<Self> {
        if entries.is_empty() {
            return Err(StatsError::invalid("portfolio has no assets"));
        }
        for (i, entry) in entries.iter().enumerate() {
            if !entry.weight.is_finite() {
                return Err(StatsError::data_quality(format!(
                    "weight of {} is {}",
                    entry.asset, entry.weight
                )));
            }
            if !bounds.contains(entry.weight) {
                return Err(StatsError::invalid(format!(
                    "weight {} of {} outside [{}, {}]",
                    entry.weight, entry.asset, bounds.min, bounds.max
                )));
            }
            if entries[..i].iter().any(|e| e.asset == entry.asset) {
                return Err(StatsError::invalid(format!("duplicate asset {}", entry.asset)));
            }
        }
        let total: f64 = entries.iter().map(|e| e.weight).sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(StatsError::invalid(format!(
                "weights sum to {total}, expected 1"
            )));
        }
        Ok(Self { entries })
    }

    /// Pair assets with a weight vector.
    pub fn from_array(assets: &[AssetId], weights: &Array1<f64>, bounds: WeightBounds) -> Result<Self> {
        if assets.len() != weights.len() {
            return Err(StatsError::DimensionMismatch {
                expected: assets.len(),
                actual: weights.len(),
            });
        }
        let entries = assets
            .iter()
            .zip(weights.iter())
            .map(|(asset, &weight)| AssetWeight {
                asset: asset.clone(),
                weight,
            })
            .collect();
        Self::with_bounds(entries, bounds)
    }

    /// Equal weight across `assets`.
    pub fn equal(assets: &[AssetId]) -> Result<Self> {
        let n = assets.len();
        Self::from_array(assets, &Array1::from_elem(n, 1.0 / n.max(1) as f64), WeightBounds::default())
    }

    /// Entries in order.
    pub fn entries(&self) -> &[AssetWeight] {
        &self.entries
    }

    /// Weight of `asset`, if held.
    pub fn get(&self, asset: &AssetId) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| &e.asset == asset)
            .map(|e| e.weight)
    }

    /// Largest single-asset weight.
    pub fn max_weight(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.weight)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Weights aligned to `assets` (missing assets get 0).
    pub fn aligned_to(&self, assets: &[AssetId]) -> Array1<f64> {
        assets
            .iter()
            .map(|a| self.get(a).unwrap_or(0.0))
            .collect()
    }

    /// Weight vector in entry order.
    pub fn to_array(&self) -> Array1<f64> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a validated portfolio.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<AssetWeight>> for PortfolioWeights {
    type Error = StatsError;

    fn try_from(entries: Vec<AssetWeight>) -> Result<Self> {
        Self::new(entries)
    }
}

impl From<PortfolioWeights> for Vec<AssetWeight> {
    fn from(weights: PortfolioWeights) -> Self {
        weights.entries
    }
}
