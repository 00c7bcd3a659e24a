//! Descriptive statistics over return series
//!
//! All functions are pure and operate on plain slices so they can be used on
//! `ReturnSeries` values, ndarray views (`as_slice()`), or simulated outcomes.
//!
//! Sample statistics use Bessel's correction (divide by N-1). Higher moments
//! (skewness, excess kurtosis) use population moments.

use crate::error::{Result, StatsError, ensure_finite};

/// Arithmetic mean. Requires at least one observation.
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(StatsError::insufficient(1, 0));
    }
    ensure_finite(values, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (Bessel-corrected).
pub fn variance(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(StatsError::insufficient(2, values.len()));
    }
    let mu = mean(values)?;
    let n = values.len() as f64;
    Ok(values.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / (n - 1.0))
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> Result<f64> {
    Ok(variance(values)?.sqrt())
}

/// Annualized volatility: `sqrt(variance) * sqrt(periods_per_year)`.
pub fn annualized_volatility(values: &[f64], periods_per_year: f64) -> Result<f64> {
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(StatsError::invalid(format!(
            "periods per year must be positive, got {periods_per_year}"
        )));
    }
    Ok(std_dev(values)? * periods_per_year.sqrt())
}

/// Sample covariance of two equally long series.
pub fn covariance(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(StatsError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    if a.len() < 2 {
        return Err(StatsError::insufficient(2, a.len()));
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;
    let n = a.len() as f64;

    let sum = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>();
    Ok(sum / (n - 1.0))
}

/// Pearson correlation: `covariance / (std_a * std_b)`.
///
/// Correlation against a constant series is undefined and reported as a data
/// quality error.
pub fn correlation(a: &[f64], b: &[f64]) -> Result<f64> {
    let cov = covariance(a, b)?;
    let std_a = std_dev(a)?;
    let std_b = std_dev(b)?;
    if std_a == 0.0 || std_b == 0.0 {
        return Err(StatsError::data_quality(
            "correlation undefined for a zero-variance series",
        ));
    }
    // Rounding can push perfectly (anti)correlated series a hair past 1.
    Ok((cov / (std_a * std_b)).clamp(-1.0, 1.0))
}

/// Population central moments (m2, m3, m4).
fn central_moments(values: &[f64]) -> Result<(f64, f64, f64)> {
    let mu = mean(values)?;
    let n = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &x in values {
        let d = x - mu;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    Ok((m2 / n, m3 / n, m4 / n))
}

/// Population skewness `m3 / m2^1.5`. `None` when the values have no dispersion.
pub fn skewness(values: &[f64]) -> Result<Option<f64>> {
    let (m2, m3, _) = central_moments(values)?;
    if m2 == 0.0 {
        return Ok(None);
    }
    Ok(Some(m3 / m2.powf(1.5)))
}

/// Excess kurtosis `m4 / m2^2 - 3`. `None` when the values have no dispersion.
pub fn excess_kurtosis(values: &[f64]) -> Result<Option<f64>> {
    let (m2, _, m4) = central_moments(values)?;
    if m2 == 0.0 {
        return Ok(None);
    }
    Ok(Some(m4 / (m2 * m2) - 3.0))
}

/// Sample standard deviation of the strictly negative values.
///
/// `None` when fewer than two negative observations exist.
pub fn downside_deviation(values: &[f64]) -> Result<Option<f64>> {
    ensure_finite(values, "downside deviation")?;
    let negatives: Vec<f64> = values.iter().copied().filter(|v| *v < 0.0).collect();
    if negatives.len() < 2 {
        return Ok(None);
    }
    Ok(Some(std_dev(&negatives)?))
}
