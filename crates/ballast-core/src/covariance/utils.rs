//! Symmetric eigendecomposition used by the positive semi-definite check

use crate::error::{Result, StatsError};
use ndarray::{Array1, Array2};

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Smallest eigenvalue of a symmetric matrix.
pub fn min_eigenvalue(matrix: &Array2<f64>) -> Result<f64> {
    let n = matrix.nrows();
    let decomp = jacobi_eigendecomp(matrix, 64 * n * n, 1e-15)?;
    Ok(decomp
        .eigenvalues
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min))
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// Repeatedly annihilates the largest off-diagonal element with a plane
/// rotation. Stable for the small, dense matrices used here.
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_rotations` - Maximum number of rotations
/// * `tolerance` - Convergence tolerance for off-diagonal elements, relative
///   to the largest absolute entry of the input
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_rotations: usize,
    tolerance: f64,
) -> Result<EigenDecomposition> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);
    let scale = matrix.iter().fold(0.0_f64, |m, x| m.max(x.abs())).max(f64::MIN_POSITIVE);

    if n > 1 {
        for _ in 0..max_rotations {
            let (p, q, apq) = largest_off_diagonal(&a);
            if apq.abs() <= tolerance * scale {
                break;
            }
            let (cos_theta, sin_theta) = rotation(a[[p, p]], a[[q, q]], apq);
            rotate(&mut a, &mut v, p, q, cos_theta, sin_theta);
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = order.iter().map(|&i| a[[i, i]]).collect();
    let mut eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in order.iter().enumerate() {
        eigenvectors.column_mut(new_idx).assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

/// Position and value of the largest off-diagonal element
fn largest_off_diagonal(a: &Array2<f64>) -> (usize, usize, f64) {
    let n = a.nrows();
    let (mut p, mut q, mut max_val) = (0, 1, 0.0);
    for i in 0..n {
        for j in (i + 1)..n {
            let val = a[[i, j]].abs();
            if val > max_val {
                max_val = val;
                p = i;
                q = j;
            }
        }
    }
    (p, q, a[[p, q]])
}

/// (cos, sin) of the rotation that zeroes `a[p][q]`
fn rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };
    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    (cos_theta, t * cos_theta)
}

fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    let n = a.nrows();
    let (app, aqq, apq) = (a[[p, p]], a[[q, q]], a[[p, q]]);

    a[[p, p]] = c * c * app - 2.0 * c * s * apq + s * s * aqq;
    a[[q, q]] = s * s * app + 2.0 * c * s * apq + c * c * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let (aip, aiq) = (a[[i, p]], a[[i, q]]);
            a[[i, p]] = c * aip - s * aiq;
            a[[p, i]] = a[[i, p]];
            a[[i, q]] = s * aip + c * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let (vip, viq) = (v[[i, p]], v[[i, q]]);
        v[[i, p]] = c * vip - s * viq;
        v[[i, q]] = s * vip + c * viq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_diagonal_matrix() {
        let m = array![[3.0, 0.0], [0.0, 1.0]];
        let d = jacobi_eigendecomp(&m, 10, 1e-15).unwrap();
        assert_relative_eq!(d.eigenvalues[0], 3.0);
        assert_relative_eq!(d.eigenvalues[1], 1.0);
    }

    #[test]
    fn test_two_by_two() {
        // Eigenvalues of [[2,1],[1,2]] are 3 and 1
        let m = array![[2.0, 1.0], [1.0, 2.0]];
        let d = jacobi_eigendecomp(&m, 10, 1e-15).unwrap();
        assert_relative_eq!(d.eigenvalues[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(d.eigenvalues[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reconstruction() {
        let m = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let d = jacobi_eigendecomp(&m, 500, 1e-15).unwrap();
        let lambda = Array2::from_diag(&d.eigenvalues);
        let rebuilt = d.eigenvectors.dot(&lambda).dot(&d.eigenvectors.t());
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rebuilt[[i, j]], m[[i, j]], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_min_eigenvalue_of_singular_matrix() {
        // Perfectly correlated pair: rank one
        let m = array![[0.04, 0.06], [0.06, 0.09]];
        assert_relative_eq!(min_eigenvalue(&m).unwrap(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_non_square() {
        assert!(jacobi_eigendecomp(&Array2::zeros((2, 3)), 10, 1e-12).is_err());
    }
}
