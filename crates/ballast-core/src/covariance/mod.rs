//! Asset covariance estimation and validation
//!
//! Estimators turn a `T x N` matrix of periodic returns (rows are periods,
//! columns are assets) into an `N x N` covariance matrix. Every estimate is
//! wrapped in a [`CovarianceMatrix`], whose constructor rejects matrices that
//! cannot be a covariance matrix: asymmetric, negative variances, correlations
//! beyond ±1, or negative eigenvalues.

pub mod ewma;
pub mod sample;
pub mod utils;

pub use ewma::{EwmaConfig, EwmaCovarianceEstimator};
pub use sample::SampleCovarianceEstimator;
pub use utils::{EigenDecomposition, jacobi_eigendecomp, min_eigenvalue};

use crate::error::{Result, StatsError};
use crate::series::AssetId;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Relative tolerance for symmetry and Cauchy-Schwarz checks
const STRUCTURE_TOLERANCE: f64 = 1e-9;

/// Eigenvalue floor, scaled by `max(1, trace)`
const EIGENVALUE_TOLERANCE: f64 = 1e-10;

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from periodic returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a period and each column is an asset
    ///
    /// # Returns
    /// * Estimated `N x N` covariance matrix in periodic (not annualized) units
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>>;
}

/// Validated covariance matrix indexed by asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    assets: Vec<AssetId>,
    matrix: Array2<f64>,
}

impl CovarianceMatrix {
    /// Wrap a raw matrix after running the positive semi-definite sanity check.
    ///
    /// # Errors
    /// * `InvalidInput` if the matrix is not square or does not match `assets`
    /// * `DataQuality` if the matrix contains non-finite values, is asymmetric,
    ///   has a negative variance, implies a correlation beyond ±1, or has a
    ///   negative eigenvalue
    pub fn new(assets: Vec<AssetId>, matrix: Array2<f64>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(StatsError::invalid(format!(
                "covariance matrix must be square, got {rows}x{cols}"
            )));
        }
        if rows != assets.len() {
            return Err(StatsError::DimensionMismatch {
                expected: assets.len(),
                actual: rows,
            });
        }
        validate_covariance(&matrix, &assets)?;
        Ok(Self { assets, matrix })
    }

    /// Build a covariance matrix from volatilities and a correlation matrix.
    pub fn from_correlation(
        assets: Vec<AssetId>,
        volatilities: &Array1<f64>,
        correlation: &Array2<f64>,
    ) -> Result<Self> {
        let n = volatilities.len();
        if correlation.dim() != (n, n) {
            return Err(StatsError::DimensionMismatch {
                expected: n,
                actual: correlation.nrows(),
            });
        }
        let mut matrix = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in 0..n {
                matrix[[i, j]] = correlation[[i, j]] * volatilities[i] * volatilities[j];
            }
        }
        Self::new(assets, matrix)
    }

    /// Assets in row/column order.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Raw `N x N` matrix.
    pub const fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the matrix covers no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Variance of the asset at `index`.
    pub fn variance(&self, index: usize) -> f64 {
        self.matrix[[index, index]]
    }

    /// Volatility (square root of the diagonal) of each asset.
    pub fn volatilities(&self) -> Array1<f64> {
        self.matrix.diag().mapv(f64::sqrt)
    }

    /// Correlation matrix implied by the covariance.
    ///
    /// Pairs involving a zero-variance asset get correlation 0 (1 on the diagonal).
    pub fn correlation(&self) -> Array2<f64> {
        let vols = self.volatilities();
        let n = self.len();
        let mut corr = Array2::<f64>::eye(n);
        for i in 0..n {
            for j in 0..n {
                if i != j && vols[i] > 0.0 && vols[j] > 0.0 {
                    corr[[i, j]] = (self.matrix[[i, j]] / (vols[i] * vols[j])).clamp(-1.0, 1.0);
                }
            }
        }
        corr
    }

    /// Portfolio variance `wᵗ Σ w`.
    pub fn quadratic_form(&self, weights: ArrayView1<'_, f64>) -> Result<f64> {
        if weights.len() != self.len() {
            return Err(StatsError::DimensionMismatch {
                expected: self.len(),
                actual: weights.len(),
            });
        }
        Ok(weights.dot(&self.matrix.dot(&weights)))
    }

    /// Scale every entry (e.g. by periods per year to annualize).
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(StatsError::invalid(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        Ok(Self {
            assets: self.assets.clone(),
            matrix: &self.matrix * factor,
        })
    }
}

/// Positive semi-definite sanity check.
fn validate_covariance(matrix: &Array2<f64>, assets: &[AssetId]) -> Result<()> {
    let n = matrix.nrows();

    if let Some(v) = matrix.iter().find(|v| !v.is_finite()) {
        return Err(StatsError::data_quality(format!(
            "covariance matrix contains non-finite value {v}"
        )));
    }

    for i in 0..n {
        if matrix[[i, i]] < 0.0 {
            return Err(StatsError::data_quality(format!(
                "negative variance {} for {}",
                matrix[[i, i]],
                assets[i]
            )));
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (matrix[[i, j]], matrix[[j, i]]);
            let scale = a.abs().max(b.abs()).max(1.0);
            if (a - b).abs() > STRUCTURE_TOLERANCE * scale {
                return Err(StatsError::data_quality(format!(
                    "covariance matrix is not symmetric at ({}, {})",
                    assets[i], assets[j]
                )));
            }

            // Cauchy-Schwarz: |cov| <= sd_i * sd_j, i.e. |correlation| <= 1
            let bound = (matrix[[i, i]] * matrix[[j, j]]).sqrt();
            if a.abs() > bound * (1.0 + STRUCTURE_TOLERANCE) + f64::EPSILON {
                return Err(StatsError::data_quality(format!(
                    "covariance of {} and {} implies |correlation| > 1",
                    assets[i], assets[j]
                )));
            }
        }
    }

    if n > 1 {
        let trace: f64 = matrix.diag().sum();
        let floor = -EIGENVALUE_TOLERANCE * trace.max(1.0);
        let smallest = min_eigenvalue(matrix)?;
        if smallest < floor {
            return Err(StatsError::data_quality(format!(
                "covariance matrix is not positive semi-definite (eigenvalue {smallest:.3e})"
            )));
        }
    }

    Ok(())
}

/// Arrange a set of equally long series into a `T x N` matrix.
pub fn stack_columns(columns: &[&[f64]]) -> Result<Array2<f64>> {
    let n_assets = columns.len();
    let n_periods = columns.first().map_or(0, |c| c.len());
    for column in columns {
        if column.len() != n_periods {
            return Err(StatsError::DimensionMismatch {
                expected: n_periods,
                actual: column.len(),
            });
        }
    }
    let mut out = Array2::<f64>::zeros((n_periods, n_assets));
    for (j, column) in columns.iter().enumerate() {
        for (t, value) in column.iter().enumerate() {
            out[[t, j]] = *value;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};

    fn ids(n: usize) -> Vec<AssetId> {
        (0..n).map(|i| AssetId::new(format!("A{i}"))).collect()
    }

    #[test]
    fn test_valid_matrix() {
        let cov = CovarianceMatrix::new(ids(2), array![[0.04, 0.01], [0.01, 0.09]]).unwrap();
        assert_eq!(cov.len(), 2);
        assert_relative_eq!(cov.volatilities()[1], 0.3, epsilon = 1e-12);
        let corr = cov.correlation();
        assert_relative_eq!(corr[[0, 1]], 0.01 / (0.2 * 0.3), epsilon = 1e-12);
        assert_relative_eq!(corr[[0, 0]], 1.0);
    }

    #[test]
    fn test_negative_diagonal_is_data_quality_error() {
        let err = CovarianceMatrix::new(ids(2), array![[-0.01, 0.0], [0.0, 0.04]]).unwrap_err();
        assert!(matches!(err, StatsError::DataQuality(_)));
    }

    #[test]
    fn test_correlation_above_one_is_data_quality_error() {
        // cov = 0.1 but sd_0 * sd_1 = 0.06
        let err = CovarianceMatrix::new(ids(2), array![[0.04, 0.1], [0.1, 0.09]]).unwrap_err();
        assert!(matches!(err, StatsError::DataQuality(msg) if msg.contains("correlation")));
    }

    #[test]
    fn test_asymmetric_matrix_rejected() {
        let err = CovarianceMatrix::new(ids(2), array![[0.04, 0.01], [0.02, 0.09]]).unwrap_err();
        assert!(matches!(err, StatsError::DataQuality(msg) if msg.contains("symmetric")));
    }

    #[test]
    fn test_pairwise_valid_but_not_psd() {
        // Every pairwise correlation is -0.9, which no three assets can jointly satisfy
        let corr = array![[1.0, -0.9, -0.9], [-0.9, 1.0, -0.9], [-0.9, -0.9, 1.0]];
        let vols = Array1::from_elem(3, 0.2);
        let err = CovarianceMatrix::from_correlation(ids(3), &vols, &corr).unwrap_err();
        assert!(matches!(err, StatsError::DataQuality(msg) if msg.contains("semi-definite")));
    }

    #[test]
    fn test_nan_rejected() {
        let err =
            CovarianceMatrix::new(ids(2), array![[0.04, f64::NAN], [f64::NAN, 0.09]]).unwrap_err();
        assert!(matches!(err, StatsError::DataQuality(_)));
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(matches!(
            CovarianceMatrix::new(ids(3), Array2::eye(2)),
            Err(StatsError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            CovarianceMatrix::new(ids(2), Array2::zeros((2, 3))),
            Err(StatsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_quadratic_form_and_scaling() {
        let cov = CovarianceMatrix::new(ids(2), array![[0.04, 0.0], [0.0, 0.09]]).unwrap();
        let w = array![0.5, 0.5];
        assert_relative_eq!(cov.quadratic_form(w.view()).unwrap(), 0.0325, epsilon = 1e-12);
        let annual = cov.scaled(252.0).unwrap();
        assert_relative_eq!(annual.variance(0), 0.04 * 252.0, epsilon = 1e-9);
        assert!(cov.quadratic_form(array![1.0].view()).is_err());
    }

    #[test]
    fn test_stack_columns() {
        let m = stack_columns(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        assert_eq!(m.dim(), (2, 2));
        assert_eq!(m[[1, 0]], 2.0);
        assert_eq!(m[[0, 1]], 3.0);
        assert!(stack_columns(&[&[1.0], &[1.0, 2.0]]).is_err());
    }
}
