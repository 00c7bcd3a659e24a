//! Projection of weight vectors onto the bounded simplex
//!
//! Both the optimizer and the risk parity allocator need weights that sum to
//! one while staying inside per-asset bounds. Clamping and then rescaling can
//! push weights back outside their bounds, so the optimizer uses the exact
//! Euclidean projection instead:
//!
//! w_i = clamp(v_i - τ, lo, hi)
//!
//! where τ is the unique shift making Σw = 1. The sum is monotone decreasing
//! in τ, so τ is found by bisection.

use crate::error::{Result, SizingError};
use ballast_core::WeightBounds;
use ballast_core::weights::WEIGHT_SUM_TOLERANCE;
use ndarray::{Array1, ArrayView1};

const MAX_BISECTIONS: usize = 200;
const SUM_TOLERANCE: f64 = 1e-14;

/// Project `v` onto `{w : Σw = 1, lo ≤ w_i ≤ hi}`.
///
/// # Errors
/// * `InvalidInput` when the bounds cannot hold a fully invested portfolio of `v.len()` assets
/// * `DataQuality` when `v` contains NaN or infinity
pub fn project_onto_bounds(v: ArrayView1<'_, f64>, bounds: &WeightBounds) -> Result<Array1<f64>> {
    bounds.validate_for(v.len())?;
    if v.iter().any(|x| !x.is_finite()) {
        return Err(SizingError::DataQuality(
            "cannot project a non-finite weight vector".into(),
        ));
    }

    let shifted_sum = |tau: f64| -> f64 {
        v.iter()
            .map(|x| (x - tau).clamp(bounds.min, bounds.max))
            .sum()
    };

    let v_min = v.iter().copied().fold(f64::INFINITY, f64::min);
    let v_max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Every weight sits at `max` at the low end and at `min` at the high end
    let mut lo = v_min - bounds.max;
    let mut hi = v_max - bounds.min;
    let mut tau = 0.5 * (lo + hi);
    for _ in 0..MAX_BISECTIONS {
        tau = 0.5 * (lo + hi);
        let total = shifted_sum(tau);
        if (total - 1.0).abs() <= SUM_TOLERANCE {
            break;
        }
        if total > 1.0 {
            lo = tau;
        } else {
            hi = tau;
        }
    }

    Ok(v.mapv(|x| (x - tau).clamp(bounds.min, bounds.max)))
}

/// Cap every weight at `cap`, handing the excess to uncapped assets in
/// proportion to their weights (equally when they are all zero).
///
/// Expects non-negative weights summing to one.
///
/// # Errors
/// `InvalidInput` when `weights.len() * cap < 1`.
pub fn cap_and_redistribute(weights: &mut Array1<f64>, cap: f64) -> Result<()> {
    let n = weights.len();
    if !(cap.is_finite() && cap > 0.0) || (n as f64) * cap < 1.0 - WEIGHT_SUM_TOLERANCE {
        return Err(SizingError::invalid(format!(
            "a cap of {cap} cannot hold a fully invested portfolio of {n} assets"
        )));
    }

    let mut capped = vec![false; n];
    // Each pass caps at least one more asset, so n passes suffice
    for _ in 0..n {
        let mut excess = 0.0;
        for (i, w) in weights.iter_mut().enumerate() {
            if *w > cap {
                excess += *w - cap;
                *w = cap;
                capped[i] = true;
            }
        }
        if excess <= 0.0 {
            break;
        }

        let free: Vec<usize> = (0..n).filter(|&i| !capped[i]).collect();
        if free.is_empty() {
            break;
        }
        let free_total: f64 = free.iter().map(|&i| weights[i]).sum();
        for &i in &free {
            weights[i] += if free_total > 0.0 {
                excess * weights[i] / free_total
            } else {
                excess / free.len() as f64
            };
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_projection_of_feasible_point_is_identity() {
        let v = array![0.2, 0.3, 0.5];
        let w = project_onto_bounds(v.view(), &WeightBounds::default()).unwrap();
        for (a, b) in w.iter().zip(v.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_projection_shifts_uniformly() {
        let v = array![0.5, 0.4, 0.4];
        let w = project_onto_bounds(v.view(), &WeightBounds::default()).unwrap();
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[0] - w[1], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_respects_bounds() {
        let bounds = WeightBounds { min: 0.1, max: 0.5 };
        let v = array![2.0, -1.0, 0.3, 0.2];
        let w = project_onto_bounds(v.view(), &bounds).unwrap();
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-12);
        assert!(w.iter().all(|&x| (0.1 - 1e-12..=0.5 + 1e-12).contains(&x)));
        assert_relative_eq!(w[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_rejects_infeasible_bounds() {
        let bounds = WeightBounds { min: 0.0, max: 0.2 };
        assert!(project_onto_bounds(array![0.3, 0.3, 0.4].view(), &bounds).is_err());
    }

    #[test]
    fn test_projection_rejects_nan() {
        let err = project_onto_bounds(array![f64::NAN, 0.5].view(), &WeightBounds::default())
            .unwrap_err();
        assert!(matches!(err, SizingError::DataQuality(_)));
    }

    #[test]
    fn test_cap_redistributes_proportionally() {
        let mut w = array![6.0 / 11.0, 3.0 / 11.0, 2.0 / 11.0];
        cap_and_redistribute(&mut w, 0.5).unwrap();
        assert_relative_eq!(w[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.3, epsilon = 1e-12);
        assert_relative_eq!(w[2], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_cap_cascades() {
        // Redistribution pushes the second asset over the cap as well
        let mut w = array![0.7, 0.25, 0.05];
        cap_and_redistribute(&mut w, 0.4).unwrap();
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-12);
        assert!(w.iter().all(|&x| x <= 0.4 + 1e-12));
        assert_relative_eq!(w[2], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_cap_too_small() {
        let mut w = array![0.5, 0.5];
        assert!(cap_and_redistribute(&mut w, 0.4).is_err());
    }
}
