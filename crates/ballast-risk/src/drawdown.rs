//! Drawdown analysis
//!
//! Drawdowns are reported as non-positive fractions of the running peak:
//! a value 12% below its peak has drawdown -0.12.

use crate::error::{Result, RiskError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Incremental drawdown state over a value stream.
#[derive(Debug, Clone)]
pub struct DrawdownTracker {
    peak: f64,
    peak_index: usize,
    current_drawdown: f64,
    current_duration: usize,
    max_drawdown: f64,
    max_duration: usize,
    trough_index: usize,
    peak_before_trough: f64,
    peak_before_trough_index: usize,
    count: usize,
}

impl DrawdownTracker {
    /// Start tracking at `initial`.
    pub const fn with_initial(initial: f64) -> Self {
        Self {
            peak: initial,
            peak_index: 0,
            current_drawdown: 0.0,
            current_duration: 0,
            max_drawdown: 0.0,
            max_duration: 0,
            trough_index: 0,
            peak_before_trough: initial,
            peak_before_trough_index: 0,
            count: 1,
        }
    }

    /// Record the next value and return its drawdown.
    pub fn update(&mut self, value: f64) -> f64 {
        let index = self.count;
        self.count += 1;

        if value >= self.peak {
            self.peak = value;
            self.peak_index = index;
            self.current_drawdown = 0.0;
            self.current_duration = 0;
        } else {
            self.current_drawdown = (value - self.peak) / self.peak;
            self.current_duration += 1;
            self.max_duration = self.max_duration.max(self.current_duration);
            if self.current_drawdown < self.max_drawdown {
                self.max_drawdown = self.current_drawdown;
                self.trough_index = index;
                self.peak_before_trough = self.peak;
                self.peak_before_trough_index = self.peak_index;
            }
        }
        self.current_drawdown
    }

    /// Current drawdown (≤ 0).
    pub const fn current_drawdown(&self) -> f64 {
        self.current_drawdown
    }

    /// Deepest drawdown so far (≤ 0).
    pub const fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// Running peak.
    pub const fn peak(&self) -> f64 {
        self.peak
    }

    /// Periods since the last peak.
    pub const fn current_duration(&self) -> usize {
        self.current_duration
    }

    /// Longest stretch spent below a peak.
    pub const fn max_duration(&self) -> usize {
        self.max_duration
    }
}

/// One observation in a drawdown series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownRecord {
    /// Observation time, when supplied
    pub timestamp: Option<DateTime<Utc>>,
    /// Portfolio value
    pub value: f64,
    /// (value - peak) / peak
    pub drawdown: f64,
}

/// Drawdown statistics for a value series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    /// Per-observation drawdowns
    pub records: Vec<DrawdownRecord>,
    /// Drawdown at the last observation
    pub current_drawdown: f64,
    /// Deepest drawdown
    pub max_drawdown: f64,
    /// Periods since the last peak
    pub drawdown_duration: usize,
    /// Longest stretch spent below a peak
    pub max_drawdown_duration: usize,
    /// Periods from the deepest trough back to the prior peak; `None` if not
    /// yet recovered, `Some(0)` when there was no drawdown
    pub recovery_time: Option<usize>,
    /// Index of the peak preceding the deepest trough
    pub peak_index: usize,
    /// Index of the deepest trough
    pub trough_index: usize,
}

/// Analyze an ordered series of portfolio values.
///
/// # Errors
/// * `InsufficientData` for an empty series
/// * `DataQuality` for NaN or infinite values
/// * `InvalidInput` for values that are not positive
pub fn analyze_drawdown(values: &[f64]) -> Result<DrawdownAnalysis> {
    analyze(values, None)
}

/// Analyze values observed at strictly increasing `timestamps`.
///
/// # Errors
/// As [`analyze_drawdown`], plus `InvalidInput` when the timestamps do not
/// match the values one to one or are out of order.
pub fn analyze_drawdown_with_timestamps(
    values: &[f64],
    timestamps: &[DateTime<Utc>],
) -> Result<DrawdownAnalysis> {
    if timestamps.len() != values.len() {
        return Err(RiskError::invalid(format!(
            "{} timestamps for {} values",
            timestamps.len(),
            values.len()
        )));
    }
    if let Some(w) = timestamps.windows(2).find(|w| w[1] <= w[0]) {
        return Err(RiskError::invalid(format!(
            "timestamps out of order: {} then {}",
            w[0], w[1]
        )));
    }
    analyze(values, Some(timestamps))
}

fn analyze(values: &[f64], timestamps: Option<&[DateTime<Utc>]>) -> Result<DrawdownAnalysis> {
    let first = *values.first().ok_or(RiskError::insufficient(1, 0))?;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(RiskError::DataQuality(format!("value {v} at index {i}")));
        }
        if v <= 0.0 {
            return Err(RiskError::invalid(format!(
                "values must be positive, got {v} at index {i}"
            )));
        }
    }

    let timestamp_at = |i: usize| timestamps.map(|ts| ts[i]);
    let mut tracker = DrawdownTracker::with_initial(first);
    let mut records = Vec::with_capacity(values.len());
    records.push(DrawdownRecord {
        timestamp: timestamp_at(0),
        value: first,
        drawdown: 0.0,
    });
    for (i, &value) in values.iter().enumerate().skip(1) {
        let drawdown = tracker.update(value);
        records.push(DrawdownRecord {
            timestamp: timestamp_at(i),
            value,
            drawdown,
        });
    }

    let recovery_time = if tracker.max_drawdown == 0.0 {
        Some(0)
    } else {
        values[tracker.trough_index..]
            .iter()
            .position(|&v| v >= tracker.peak_before_trough)
    };

    debug!(
        observations = values.len(),
        max_drawdown = tracker.max_drawdown,
        ?recovery_time,
        "analyzed drawdown"
    );

    Ok(DrawdownAnalysis {
        records,
        current_drawdown: tracker.current_drawdown,
        max_drawdown: tracker.max_drawdown,
        drawdown_duration: tracker.current_duration,
        max_drawdown_duration: tracker.max_duration,
        recovery_time,
        peak_index: tracker.peak_before_trough_index,
        trough_index: tracker.trough_index,
    })
}

/// Response to the current drawdown, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawdownAction {
    /// Within normal range
    Normal,
    /// Past the warning level
    Warn,
    /// Cut exposure
    ReduceExposure,
    /// Stop adding risk
    Halt,
}

/// Drawdown thresholds (all ≤ 0, increasingly negative)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawdownPolicy {
    /// Warn at or below this drawdown (default: -0.10)
    pub warn_at: f64,
    /// Reduce exposure at or below this drawdown (default: -0.15)
    pub reduce_at: f64,
    /// Halt at or below this drawdown (default: -0.20)
    pub halt_at: f64,
    /// Exposure multiplier while reducing (default: 0.5)
    pub reduced_exposure: f64,
}

impl Default for DrawdownPolicy {
    fn default() -> Self {
        Self {
            warn_at: -0.10,
            reduce_at: -0.15,
            halt_at: -0.20,
            reduced_exposure: 0.5,
        }
    }
}

/// Policy decision for a drawdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAssessment {
    /// Drawdown evaluated
    pub drawdown: f64,
    /// Action to take
    pub action: DrawdownAction,
    /// Suggested multiplier on current exposure
    pub exposure_scale: f64,
}

impl DrawdownPolicy {
    /// Check the thresholds are ordered `halt_at ≤ reduce_at ≤ warn_at ≤ 0`.
    pub fn validate(&self) -> Result<()> {
        let ordered = self.halt_at <= self.reduce_at && self.reduce_at <= self.warn_at && self.warn_at <= 0.0;
        if !ordered || !self.halt_at.is_finite() {
            return Err(RiskError::invalid(format!(
                "drawdown thresholds must satisfy halt ({}) <= reduce ({}) <= warn ({}) <= 0",
                self.halt_at, self.reduce_at, self.warn_at
            )));
        }
        if !(0.0..=1.0).contains(&self.reduced_exposure) {
            return Err(RiskError::invalid(format!(
                "reduced exposure must be in [0, 1], got {}",
                self.reduced_exposure
            )));
        }
        Ok(())
    }

    /// Map a drawdown to an action.
    pub fn assess(&self, drawdown: f64) -> DrawdownAssessment {
        let action = if drawdown <= self.halt_at {
            DrawdownAction::Halt
        } else if drawdown <= self.reduce_at {
            DrawdownAction::ReduceExposure
        } else if drawdown <= self.warn_at {
            DrawdownAction::Warn
        } else {
            DrawdownAction::Normal
        };
        let exposure_scale = match action {
            DrawdownAction::Normal | DrawdownAction::Warn => 1.0,
            DrawdownAction::ReduceExposure => self.reduced_exposure,
            DrawdownAction::Halt => 0.0,
        };
        DrawdownAssessment {
            drawdown,
            action,
            exposure_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn test_peak_trough_recovery() {
        let values = [100.0, 110.0, 99.0, 88.0, 95.0, 110.0, 115.0];
        let a = analyze_drawdown(&values).unwrap();

        assert_relative_eq!(a.max_drawdown, -0.2, epsilon = 1e-12);
        assert_eq!(a.peak_index, 1);
        assert_eq!(a.trough_index, 3);
        assert_eq!(a.recovery_time, Some(2));
        assert_eq!(a.current_drawdown, 0.0);
        assert_eq!(a.drawdown_duration, 0);
        assert_eq!(a.max_drawdown_duration, 3);
        assert_relative_eq!(a.records[2].drawdown, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_unrecovered() {
        let a = analyze_drawdown(&[100.0, 120.0, 90.0, 100.0]).unwrap();
        assert_relative_eq!(a.max_drawdown, -0.25, epsilon = 1e-12);
        assert_eq!(a.recovery_time, None);
        assert_eq!(a.drawdown_duration, 2);
        assert_relative_eq!(a.current_drawdown, 100.0 / 120.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_monotone_series_has_no_drawdown() {
        let a = analyze_drawdown(&[1.0, 2.0, 2.0, 3.0]).unwrap();
        assert_eq!(a.max_drawdown, 0.0);
        assert_eq!(a.recovery_time, Some(0));
        assert!(a.records.iter().all(|r| r.drawdown == 0.0));
    }

    #[test]
    fn test_single_value() {
        let a = analyze_drawdown(&[50.0]).unwrap();
        assert_eq!(a.records.len(), 1);
        assert_eq!(a.max_drawdown, 0.0);
    }

    #[rstest]
    #[case(&[], "insufficient")]
    #[case(&[100.0, f64::NAN], "quality")]
    #[case(&[100.0, 0.0], "invalid")]
    #[case(&[100.0, -5.0], "invalid")]
    fn test_rejected_series(#[case] values: &[f64], #[case] kind: &str) {
        let err = analyze_drawdown(values).unwrap_err();
        let matched = match kind {
            "insufficient" => matches!(
                err,
                RiskError::Stats(ballast_core::StatsError::InsufficientData { .. })
            ),
            "quality" => matches!(err, RiskError::DataQuality(_)),
            _ => matches!(err, RiskError::InvalidInput(_)),
        };
        assert!(matched, "{err:?}");
    }

    #[test]
    fn test_timestamps_attached() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let ts: Vec<_> = (0..3).map(|d| t0 + chrono::Duration::days(d)).collect();
        let a = analyze_drawdown_with_timestamps(&[10.0, 9.0, 11.0], &ts).unwrap();
        assert_eq!(a.records[1].timestamp, Some(ts[1]));

        let mut reversed = ts.clone();
        reversed.reverse();
        assert!(analyze_drawdown_with_timestamps(&[10.0, 9.0, 11.0], &reversed).is_err());
        assert!(analyze_drawdown_with_timestamps(&[10.0, 9.0], &ts).is_err());
    }

    fn random_walk(seed: u64, len: usize, volatility: f64) -> Vec<f64> {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut value = 100.0;
        (0..len)
            .map(|_| {
                value *= 1.0 + rng.gen_range(-volatility..volatility);
                value
            })
            .collect()
    }

    #[rstest]
    #[case(1, 60, 0.02)]
    #[case(7, 250, 0.05)]
    #[case(42, 500, 0.15)]
    #[case(2024, 30, 0.5)]
    fn test_max_below_current_below_zero_on_every_prefix(
        #[case] seed: u64,
        #[case] len: usize,
        #[case] volatility: f64,
    ) {
        let values = random_walk(seed, len, volatility);
        for end in 1..=values.len() {
            let a = analyze_drawdown(&values[..end]).unwrap();
            assert!(
                a.max_drawdown <= a.current_drawdown && a.current_drawdown <= 0.0,
                "prefix {end}: max {} current {}",
                a.max_drawdown,
                a.current_drawdown
            );
            assert!(a.records.iter().all(|r| r.drawdown >= a.max_drawdown));
        }
    }

    #[rstest]
    #[case(0.0, DrawdownAction::Normal, 1.0)]
    #[case(-0.05, DrawdownAction::Normal, 1.0)]
    #[case(-0.10, DrawdownAction::Warn, 1.0)]
    #[case(-0.15, DrawdownAction::ReduceExposure, 0.5)]
    #[case(-0.19, DrawdownAction::ReduceExposure, 0.5)]
    #[case(-0.20, DrawdownAction::Halt, 0.0)]
    #[case(-0.50, DrawdownAction::Halt, 0.0)]
    fn test_policy_actions(
        #[case] drawdown: f64,
        #[case] action: DrawdownAction,
        #[case] scale: f64,
    ) {
        let assessment = DrawdownPolicy::default().assess(drawdown);
        assert_eq!(assessment.action, action);
        assert_eq!(assessment.exposure_scale, scale);
    }

    #[test]
    fn test_policy_escalates_monotonically() {
        let policy = DrawdownPolicy::default();
        let mut previous = DrawdownAction::Normal;
        for step in 0..=100 {
            let action = policy.assess(-(step as f64) / 200.0).action;
            assert!(action >= previous);
            previous = action;
        }
        assert_eq!(previous, DrawdownAction::Halt);
    }

    #[test]
    fn test_policy_validation() {
        assert!(DrawdownPolicy::default().validate().is_ok());
        let inverted = DrawdownPolicy {
            warn_at: -0.3,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }
}
