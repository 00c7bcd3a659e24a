//! Summary statistics of simulated final values
//!
//! Everything here runs on a sorted copy of the input, so the summary does not
//! depend on the order in which scenarios finished.

use crate::error::{Result, SimulationError};
use ballast_core::stats;
use serde::{Deserialize, Serialize};

/// Final-value percentiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 5th percentile
    pub p5: f64,
    /// 25th percentile
    pub p25: f64,
    /// Median
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 95th percentile
    pub p95: f64,
}

/// Distribution of final portfolio values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Percentiles of final value
    pub percentiles: Percentiles,
    /// Mean final value
    pub expected_value: f64,
    /// Sample standard deviation of final value (0 for a single scenario)
    pub std_dev: f64,
    /// Fraction of scenarios ending below the initial capital
    pub probability_of_loss: f64,
    /// Fraction of scenarios ending at or above the initial capital
    pub probability_of_gain: f64,
    /// Initial capital minus the 5th percentile
    pub var_95: f64,
    /// Initial capital minus the mean of final values at or below the 5th percentile
    pub cvar_95: f64,
    /// Skewness of final values; `None` without dispersion
    pub skewness: Option<f64>,
    /// Excess kurtosis of final values; `None` without dispersion
    pub excess_kurtosis: Option<f64>,
}

impl DistributionSummary {
    /// Summarize final values relative to `initial_capital`.
    ///
    /// # Errors
    /// * `InvalidInput` when `final_values` is empty
    /// * `DataQuality` when any value is NaN or infinite
    pub fn from_final_values(initial_capital: f64, final_values: &[f64]) -> Result<Self> {
        if final_values.is_empty() {
            return Err(SimulationError::InvalidInput(
                "no final values to summarize".into(),
            ));
        }
        if let Some(bad) = final_values.iter().find(|v| !v.is_finite()) {
            return Err(SimulationError::DataQuality(format!(
                "simulated final value is {bad}"
            )));
        }

        let mut sorted = final_values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len() as f64;

        let percentiles = Percentiles {
            p5: percentile(&sorted, 5.0),
            p25: percentile(&sorted, 25.0),
            p50: percentile(&sorted, 50.0),
            p75: percentile(&sorted, 75.0),
            p95: percentile(&sorted, 95.0),
        };

        let expected_value = stats::mean(&sorted)?;
        let std_dev = if sorted.len() > 1 {
            stats::std_dev(&sorted)?
        } else {
            0.0
        };

        let losses = sorted.partition_point(|&v| v < initial_capital);
        let probability_of_loss = losses as f64 / n;
        let probability_of_gain = (sorted.len() - losses) as f64 / n;

        let tail_len = sorted.partition_point(|&v| v <= percentiles.p5).max(1);
        let tail_mean = sorted[..tail_len].iter().sum::<f64>() / tail_len as f64;

        let dispersed = sorted[0] != sorted[sorted.len() - 1];
        let (skewness, excess_kurtosis) = if dispersed {
            (stats::skewness(&sorted)?, stats::excess_kurtosis(&sorted)?)
        } else {
            (None, None)
        };

        Ok(Self {
            percentiles,
            expected_value,
            std_dev,
            probability_of_loss,
            probability_of_gain,
            var_95: initial_capital - percentiles.p5,
            cvar_95: initial_capital - tail_mean,
            skewness,
            excess_kurtosis,
        })
    }
}

/// Percentile `p` (0 to 100) of ascending `sorted`, interpolating linearly
/// between neighbouring order statistics.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (len - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(50.0, 3.0)]
    #[case(100.0, 5.0)]
    #[case(25.0, 2.0)]
    #[case(10.0, 1.4)]
    fn test_percentile_interpolation(#[case] p: f64, #[case] expected: f64) {
        assert_relative_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], p), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_distribution() {
        let summary = DistributionSummary::from_final_values(100.0, &[100.0; 50]).unwrap();
        assert_eq!(summary.percentiles.p5, 100.0);
        assert_eq!(summary.percentiles.p95, 100.0);
        assert_eq!(summary.var_95, 0.0);
        assert_eq!(summary.cvar_95, 0.0);
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.probability_of_loss, 0.0);
        assert_eq!(summary.probability_of_gain, 1.0);
        assert_eq!(summary.skewness, None);
        assert_eq!(summary.excess_kurtosis, None);
    }

    #[test]
    fn test_tail_measures() {
        // 20 values 81..=100: p5 = 81.95, tail = {81}
        let values: Vec<f64> = (81..=100).map(f64::from).collect();
        let summary = DistributionSummary::from_final_values(100.0, &values).unwrap();
        assert_relative_eq!(summary.percentiles.p5, 81.95, epsilon = 1e-9);
        assert_relative_eq!(summary.var_95, 18.05, epsilon = 1e-9);
        assert_relative_eq!(summary.cvar_95, 19.0, epsilon = 1e-9);
        assert!(summary.cvar_95 >= summary.var_95);
        assert_relative_eq!(summary.probability_of_loss, 0.95);
        assert_relative_eq!(summary.probability_of_gain, 0.05);
    }

    #[test]
    fn test_order_does_not_matter() {
        let values = [105.0, 97.0, 120.0, 88.0, 101.0, 99.5, 110.0];
        let mut reversed = values;
        reversed.reverse();
        let a = DistributionSummary::from_final_values(100.0, &values).unwrap();
        let b = DistributionSummary::from_final_values(100.0, &reversed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_empty_and_nan() {
        assert!(DistributionSummary::from_final_values(100.0, &[]).is_err());
        assert!(matches!(
            DistributionSummary::from_final_values(100.0, &[100.0, f64::NAN]),
            Err(SimulationError::DataQuality(_))
        ));
    }
}
