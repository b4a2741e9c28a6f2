//! angles.rs — Circular-angle arithmetic
//!
//! Everything downstream (maneuver detection, estimator scoring, Bayesian
//! combination, reliability scoring) works on bearings that wrap at 360°.
//! Naive arithmetic averages 350° and 10° to 180°; these helpers decompose
//! to unit vectors so the answer comes out 0°.

/// Normalize any angle to [0, 360).
pub fn normalize_deg(angle: f64) -> f64 {
    let a = angle % 360.0;
    if a < 0.0 {
        a + 360.0
    } else {
        a
    }
}

/// Shortest-path signed difference `a − b`, degrees in (−180, 180].
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let d = normalize_deg(a - b + 180.0) - 180.0;
    // normalize_deg maps exact half-turns to the −180 side; keep the +180 side
    if d == -180.0 {
        180.0
    } else {
        d
    }
}

/// Weighted circular mean, degrees in [0, 360).
///
/// Decomposes to unit vectors, sums weighted sin/cos, recombines via atan2.
/// Zero (or negative) total weight falls back to the unweighted mean rather
/// than dividing by zero. An empty slice returns 0.
pub fn circular_mean(angles: &[f64], weights: &[f64]) -> f64 {
    debug_assert_eq!(angles.len(), weights.len());
    if angles.is_empty() {
        return 0.0;
    }
    let total: f64 = weights.iter().sum();
    let (sin_sum, cos_sum) = if total > 0.0 {
        angles.iter().zip(weights).fold((0.0, 0.0), |(s, c), (&a, &w)| {
            let r = a.to_radians();
            (s + w * r.sin(), c + w * r.cos())
        })
    } else {
        angles.iter().fold((0.0, 0.0), |(s, c), &a| {
            let r = a.to_radians();
            (s + r.sin(), c + r.cos())
        })
    };
    normalize_deg(sin_sum.atan2(cos_sum).to_degrees())
}

/// Unweighted circular mean.
pub fn circular_mean_unweighted(angles: &[f64]) -> f64 {
    let w = vec![1.0; angles.len()];
    circular_mean(angles, &w)
}

/// Mean resultant length `r` of a set of angles: 1.0 = perfectly aligned,
/// 0.0 = uniformly spread. The concentration term of the reliability scorer.
pub fn mean_resultant_length(angles: &[f64]) -> f64 {
    if angles.is_empty() {
        return 0.0;
    }
    let (s, c) = angles.iter().fold((0.0, 0.0), |(s, c), &a| {
        let r = a.to_radians();
        (s + r.sin(), c + r.cos())
    });
    let n = angles.len() as f64;
    ((s / n).powi(2) + (c / n).powi(2)).sqrt()
}

/// Weighted circular standard deviation, degrees. Derived from the weighted
/// mean resultant length via the standard circular-statistics formula
/// `σ = sqrt(−2 ln r)`; degenerate inputs (r ≈ 0) saturate at 180°.
pub fn circular_std(angles: &[f64], weights: &[f64]) -> f64 {
    debug_assert_eq!(angles.len(), weights.len());
    let total: f64 = weights.iter().sum();
    if angles.is_empty() || total <= 0.0 {
        return 0.0;
    }
    let (s, c) = angles.iter().zip(weights).fold((0.0, 0.0), |(s, c), (&a, &w)| {
        let r = a.to_radians();
        (s + w * r.sin(), c + w * r.cos())
    });
    let r = ((s / total).powi(2) + (c / total).powi(2)).sqrt();
    if r < 1e-9 {
        return 180.0;
    }
    ((-2.0 * r.ln()).max(0.0)).sqrt().to_degrees().min(180.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_in_half_open_range() {
        for a in (0..720).step_by(7) {
            for b in (0..720).step_by(11) {
                let d = angle_difference(a as f64, b as f64);
                assert!(d > -180.0 && d <= 180.0, "diff({a},{b}) = {d}");
            }
        }
    }

    #[test]
    fn difference_antisymmetric() {
        for (a, b) in [(10.0, 350.0), (0.0, 90.0), (200.0, 30.0), (123.4, 321.0)] {
            let fwd = angle_difference(a, b);
            let rev = angle_difference(b, a);
            if fwd.abs() < 180.0 {
                assert!((fwd + rev).abs() < 1e-9, "({a},{b}): {fwd} vs {rev}");
            }
        }
    }

    #[test]
    fn difference_of_self_is_zero() {
        for a in [0.0, 45.0, 180.0, 359.9, 720.0] {
            assert_eq!(angle_difference(a, a), 0.0);
        }
    }

    #[test]
    fn difference_wraps_shortest_path() {
        assert!((angle_difference(350.0, 10.0) - (-20.0)).abs() < 1e-9);
        assert!((angle_difference(10.0, 350.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn mean_handles_wraparound() {
        let m = circular_mean(&[350.0, 10.0], &[1.0, 1.0]);
        assert!(m < 1e-6 || m > 359.999, "got {m}");
    }

    #[test]
    fn mean_rotation_invariant() {
        let angles = [355.0, 5.0, 15.0, 340.0];
        let base = circular_mean_unweighted(&angles);
        for k in [30.0, 90.0, 123.0, 270.0] {
            let shifted: Vec<f64> = angles.iter().map(|a| normalize_deg(a + k)).collect();
            let m = circular_mean_unweighted(&shifted);
            let diff = angle_difference(m, normalize_deg(base + k));
            assert!(diff.abs() < 1e-6, "k={k}: {m} vs {}", base + k);
        }
    }

    #[test]
    fn mean_zero_weight_falls_back_to_unweighted() {
        let angles = [90.0, 270.0, 0.0];
        let weighted = circular_mean(&angles, &[0.0, 0.0, 0.0]);
        let unweighted = circular_mean_unweighted(&angles);
        assert!((weighted - unweighted).abs() < 1e-9);
    }

    #[test]
    fn resultant_length_extremes() {
        assert!((mean_resultant_length(&[42.0, 42.0, 42.0]) - 1.0).abs() < 1e-9);
        assert!(mean_resultant_length(&[0.0, 90.0, 180.0, 270.0]) < 1e-9);
    }

    #[test]
    fn std_tight_cluster_is_small() {
        let s = circular_std(&[44.0, 45.0, 46.0], &[1.0, 1.0, 1.0]);
        assert!(s < 2.0, "got {s}");
    }
}
