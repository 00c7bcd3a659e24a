//! Market statistics context
//!
//! `MarketStatistics` is an immutable snapshot derived from a set of return
//! series: annualized expected returns, volatilities, covariance and
//! correlation. It is built once per request and passed by reference into
//! every computation instead of living as state on a long-lived object.

use crate::covariance::{CovarianceEstimator, CovarianceMatrix, stack_columns};
use crate::error::{Result, StatsError, ensure_finite};
use crate::series::{AssetId, Periodicity, ReturnSeries};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Annualized statistics for a universe of assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatistics {
    assets: Vec<AssetId>,
    periodicity: Periodicity,
    observations: usize,
    expected_returns: Array1<f64>,
    volatilities: Array1<f64>,
    covariance: CovarianceMatrix,
    correlation: Array2<f64>,
}

impl MarketStatistics {
    /// Build statistics from return histories.
    ///
    /// All series must share periodicity and length (at least two
    /// observations). Expected returns default to the annualized historical
    /// mean; the covariance matrix is annualized by `periods_per_year`.
    ///
    /// # Errors
    /// * `InvalidInput` on an empty universe, duplicate assets, or mixed periodicity
    /// * `DimensionMismatch` when series lengths differ
    /// * `InsufficientData` when fewer than two observations exist
    /// * `DataQuality` when the estimated covariance fails the PSD check
    pub fn from_return_series<E>(series: &[ReturnSeries], estimator: &E) -> Result<Self>
    where
        E: CovarianceEstimator + ?Sized,
    {
        let first = series
            .first()
            .ok_or_else(|| StatsError::invalid("at least one return series is required"))?;
        let periodicity = first.periodicity();
        let observations = first.len();

        let mut assets = Vec::with_capacity(series.len());
        for s in series {
            if s.periodicity() != periodicity {
                return Err(StatsError::invalid(format!(
                    "{} is {} but {} is {}",
                    s.asset_id(),
                    s.periodicity(),
                    first.asset_id(),
                    periodicity
                )));
            }
            if assets.contains(s.asset_id()) {
                return Err(StatsError::invalid(format!(
                    "duplicate asset {}",
                    s.asset_id()
                )));
            }
            assets.push(s.asset_id().clone());
        }
        if observations < 2 {
            return Err(StatsError::insufficient(2, observations));
        }

        let columns: Vec<&[f64]> = series.iter().map(ReturnSeries::values).collect();
        let returns = stack_columns(&columns)?;
        let periods = periodicity.periods_per_year();

        let periodic_cov = estimator.estimate(&returns)?;
        let covariance = CovarianceMatrix::new(assets.clone(), periodic_cov)?.scaled(periods)?;

        let expected_returns = series
            .iter()
            .map(ReturnSeries::annualized_mean)
            .collect::<Result<Array1<f64>>>()?;
        let volatilities = covariance.volatilities();
        let correlation = covariance.correlation();

        debug!(
            assets = assets.len(),
            observations,
            %periodicity,
            "built market statistics"
        );

        Ok(Self {
            assets,
            periodicity,
            observations,
            expected_returns,
            volatilities,
            covariance,
            correlation,
        })
    }

    /// Build statistics directly from annualized inputs.
    pub fn from_parts(
        expected_returns: Array1<f64>,
        covariance: CovarianceMatrix,
        periodicity: Periodicity,
    ) -> Result<Self> {
        if expected_returns.len() != covariance.len() {
            return Err(StatsError::DimensionMismatch {
                expected: covariance.len(),
                actual: expected_returns.len(),
            });
        }
        if covariance.is_empty() {
            return Err(StatsError::invalid("at least one asset is required"));
        }
        ensure_finite(&expected_returns.to_vec(), "expected returns")?;
        Ok(Self {
            assets: covariance.assets().to_vec(),
            periodicity,
            observations: 0,
            volatilities: covariance.volatilities(),
            correlation: covariance.correlation(),
            expected_returns,
            covariance,
        })
    }

    /// Replace the historical expected returns with caller-supplied estimates.
    pub fn with_expected_returns(mut self, expected_returns: Array1<f64>) -> Result<Self> {
        if expected_returns.len() != self.assets.len() {
            return Err(StatsError::DimensionMismatch {
                expected: self.assets.len(),
                actual: expected_returns.len(),
            });
        }
        ensure_finite(&expected_returns.to_vec(), "expected returns")?;
        self.expected_returns = expected_returns;
        Ok(self)
    }

    /// Assets in index order.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Sampling frequency of the underlying series.
    pub const fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    /// Observations per series (0 when built from parts).
    pub const fn observations(&self) -> usize {
        self.observations
    }

    /// Annualized expected returns.
    pub const fn expected_returns(&self) -> &Array1<f64> {
        &self.expected_returns
    }

    /// Annualized volatilities.
    pub const fn volatilities(&self) -> &Array1<f64> {
        &self.volatilities
    }

    /// Annualized covariance matrix.
    pub const fn covariance(&self) -> &CovarianceMatrix {
        &self.covariance
    }

    /// Correlation matrix.
    pub const fn correlation(&self) -> &Array2<f64> {
        &self.correlation
    }

    /// Index of an asset.
    pub fn index_of(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::SampleCovarianceEstimator;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn universe() -> Vec<ReturnSeries> {
        vec![
            ReturnSeries::daily("SPY", vec![0.01, -0.005, 0.007, 0.002, -0.003]).unwrap(),
            ReturnSeries::daily("TLT", vec![-0.002, 0.004, -0.001, 0.003, 0.001]).unwrap(),
        ]
    }

    #[test]
    fn test_annualization() {
        let series = universe();
        let stats = MarketStatistics::from_return_series(&series, &SampleCovarianceEstimator).unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats.observations(), 5);
        assert_relative_eq!(
            stats.expected_returns()[0],
            series[0].annualized_mean().unwrap(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            stats.volatilities()[1],
            series[1].annualized_volatility().unwrap(),
            epsilon = 1e-12
        );
        assert_relative_eq!(stats.correlation()[[0, 0]], 1.0);
        assert_eq!(stats.index_of(&AssetId::from("TLT")), Some(1));
    }

    #[test]
    fn test_mixed_periodicity_rejected() {
        let mut series = universe();
        series.push(ReturnSeries::new("GLD", Periodicity::Weekly, vec![0.0; 5]).unwrap());
        assert!(matches!(
            MarketStatistics::from_return_series(&series, &SampleCovarianceEstimator),
            Err(StatsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut series = universe();
        series.push(ReturnSeries::daily("GLD", vec![0.0; 4]).unwrap());
        assert!(matches!(
            MarketStatistics::from_return_series(&series, &SampleCovarianceEstimator),
            Err(StatsError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_asset_rejected() {
        let mut series = universe();
        series.push(series[0].clone());
        assert!(MarketStatistics::from_return_series(&series, &SampleCovarianceEstimator).is_err());
    }

    #[test]
    fn test_single_observation_insufficient() {
        let series = vec![ReturnSeries::daily("SPY", vec![0.01]).unwrap()];
        assert!(matches!(
            MarketStatistics::from_return_series(&series, &SampleCovarianceEstimator),
            Err(StatsError::InsufficientData { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_expected_return_override() {
        let stats = MarketStatistics::from_return_series(&universe(), &SampleCovarianceEstimator)
            .unwrap()
            .with_expected_returns(array![0.08, 0.03])
            .unwrap();
        assert_eq!(stats.expected_returns()[0], 0.08);

        let stats = MarketStatistics::from_return_series(&universe(), &SampleCovarianceEstimator)
            .unwrap();
        assert!(stats.with_expected_returns(array![0.08]).is_err());
    }
}
