//! Edge interpolation
//!
//! Locates the point along one cube edge where the scalar field crosses the
//! threshold, assuming the field varies linearly between the two samples.

use isocrate_core::Point3d;

/// Fractional position of the threshold crossing from `v1` towards `v2`
///
/// Returns `None` when the edge does not cross: the threshold lies outside
/// `[min(v1, v2), max(v1, v2)]`, or both samples are equal and differ from the
/// threshold, or either sample is NaN. Equal samples that sit exactly on the
/// threshold cross at the midpoint.
pub fn crossing_fraction(v1: f64, v2: f64, threshold: f64) -> Option<f64> {
    if v1 == v2 {
        return (threshold == v1).then_some(0.5);
    }

    // Comparisons with NaN are false, so a NaN sample never crosses.
    let inside = (v1 <= threshold && threshold <= v2) || (v2 <= threshold && threshold <= v1);
    if !inside {
        return None;
    }

    Some((threshold - v1) / (v2 - v1))
}

/// Interpolated crossing point on the edge between grid points `p1` and `p2`
///
/// The endpoints are ordered before interpolating so that `(p1, p2)` and
/// `(p2, p1)` produce bit-identical points.
pub fn interpolate_edge(
    p1: [usize; 3],
    v1: f64,
    p2: [usize; 3],
    v2: f64,
    threshold: f64,
) -> Option<Point3d> {
    let ((lo, v_lo), (hi, v_hi)) = if p1 <= p2 {
        ((p1, v1), (p2, v2))
    } else {
        ((p2, v2), (p1, v1))
    };

    let t = crossing_fraction(v_lo, v_hi, threshold)?;
    let lerp = |axis: usize| {
        let a = lo[axis] as f64;
        let b = hi[axis] as f64;
        a + t * (b - a)
    };

    Some(Point3d::new(lerp(0), lerp(1), lerp(2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fraction_inside_interval() {
        assert_relative_eq!(crossing_fraction(100.0, 200.0, 150.0).unwrap(), 0.5);
        assert_relative_eq!(crossing_fraction(200.0, 100.0, 175.0).unwrap(), 0.25);
        assert_relative_eq!(crossing_fraction(0.0, 255.0, 0.0).unwrap(), 0.0);
        assert_relative_eq!(crossing_fraction(0.0, 255.0, 255.0).unwrap(), 1.0);
    }

    #[test]
    fn test_fraction_outside_interval() {
        assert_eq!(crossing_fraction(100.0, 200.0, 99.0), None);
        assert_eq!(crossing_fraction(100.0, 200.0, 201.0), None);
        assert_eq!(crossing_fraction(200.0, 100.0, 250.0), None);
    }

    #[test]
    fn test_fraction_degenerate_edge() {
        assert_eq!(crossing_fraction(128.0, 128.0, 128.0), Some(0.5));
        assert_eq!(crossing_fraction(128.0, 128.0, 127.0), None);
    }

    #[test]
    fn test_nan_sample_has_no_crossing() {
        assert_eq!(crossing_fraction(f64::NAN, 200.0, 128.0), None);
        assert_eq!(crossing_fraction(200.0, f64::NAN, 200.0), None);
        assert_eq!(crossing_fraction(f64::NAN, f64::NAN, 128.0), None);
        assert_eq!(crossing_fraction(100.0, 200.0, f64::NAN), None);
        assert!(interpolate_edge([0, 0, 0], 200.0, [1, 0, 0], f64::NAN, 128.0).is_none());
    }

    #[test]
    fn test_interpolated_point_moves_along_one_axis() {
        let p = interpolate_edge([2, 3, 4], 100.0, [2, 4, 4], 200.0, 125.0).unwrap();
        assert_relative_eq!(p, Point3d::new(2.0, 3.25, 4.0));
    }

    #[test]
    fn test_interpolation_is_symmetric() {
        let forward = interpolate_edge([1, 1, 1], 37.0, [1, 1, 2], 211.0, 128.0).unwrap();
        let backward = interpolate_edge([1, 1, 2], 211.0, [1, 1, 1], 37.0, 128.0).unwrap();
        assert_eq!(forward, backward);

        let again = interpolate_edge([1, 1, 1], 37.0, [1, 1, 2], 211.0, 128.0).unwrap();
        assert_eq!(forward, again);
    }

    #[test]
    fn test_no_crossing_propagates() {
        assert!(interpolate_edge([0, 0, 0], 10.0, [1, 0, 0], 20.0, 128.0).is_none());
    }
}
