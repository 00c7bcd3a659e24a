//! Return series and asset identifiers

use crate::error::{Result, StatsError, ensure_finite};
use crate::stats;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier of a tradable asset (typically its symbol).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create an asset id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Sampling frequency of a return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    /// Trading days (252 per year)
    #[default]
    #[display("daily")]
    Daily,
    /// Weeks (52 per year)
    #[display("weekly")]
    Weekly,
    /// Months (12 per year)
    #[display("monthly")]
    Monthly,
    /// Quarters (4 per year)
    #[display("quarterly")]
    Quarterly,
    /// Years
    #[display("annual")]
    Annual,
}

impl Periodicity {
    /// Number of periods in one year.
    pub const fn periods_per_year(self) -> f64 {
        match self {
            Self::Daily => 252.0,
            Self::Weekly => 52.0,
            Self::Monthly => 12.0,
            Self::Quarterly => 4.0,
            Self::Annual => 1.0,
        }
    }
}

/// Ordered periodic returns of a single asset.
///
/// Values are chronological and equally spaced. Construction rejects NaN and
/// infinite values so every downstream statistic starts from clean data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    asset_id: AssetId,
    periodicity: Periodicity,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Create a return series, validating that every value is finite.
    pub fn new(
        asset_id: impl Into<AssetId>,
        periodicity: Periodicity,
        values: Vec<f64>,
    ) -> Result<Self> {
        let asset_id = asset_id.into();
        ensure_finite(&values, &format!("returns of {asset_id}"))?;
        Ok(Self {
            asset_id,
            periodicity,
            values,
        })
    }

    /// Create a daily return series.
    pub fn daily(asset_id: impl Into<AssetId>, values: Vec<f64>) -> Result<Self> {
        Self::new(asset_id, Periodicity::Daily, values)
    }

    /// Asset this series belongs to.
    pub const fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    /// Sampling frequency.
    pub const fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    /// Periodic returns in chronological order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean periodic return.
    pub fn mean(&self) -> Result<f64> {
        stats::mean(&self.values)
    }

    /// Annualized arithmetic mean return (`mean * periods_per_year`).
    pub fn annualized_mean(&self) -> Result<f64> {
        Ok(self.mean()? * self.periodicity.periods_per_year())
    }

    /// Annualized volatility of the series.
    pub fn annualized_volatility(&self) -> Result<f64> {
        stats::annualized_volatility(&self.values, self.periodicity.periods_per_year())
    }

    /// Compound the returns into a value path starting at `initial`.
    ///
    /// The returned path has `len() + 1` points, the first being `initial`.
    pub fn value_path(&self, initial: f64) -> Result<Vec<f64>> {
        if !(initial.is_finite() && initial > 0.0) {
            return Err(StatsError::invalid(format!(
                "initial value must be positive, got {initial}"
            )));
        }
        let mut path = Vec::with_capacity(self.values.len() + 1);
        let mut value = initial;
        path.push(value);
        for r in &self.values {
            value *= 1.0 + r;
            path.push(value);
        }
        Ok(path)
    }
}
