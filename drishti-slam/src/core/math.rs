//! Mathematical utilities for angles, probabilities and line geometry.
//!
//! All angles are in radians, all distances in millimetres.

use std::f32::consts::PI;

use super::WorldPoint;

/// Two times PI (full circle in radians).
pub const TWO_PI: f32 = 2.0 * PI;

/// Normalize angle to [-π, π).
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TWO_PI;
    if a >= PI {
        a -= TWO_PI;
    } else if a < -PI {
        a += TWO_PI;
    }
    a
}

/// Signed shortest angular difference from `from` to `to`, in [-π, π).
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Convert degrees to radians.
#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg * PI / 180.0
}

/// Square of a value.
#[inline]
pub fn sq(x: f32) -> f32 {
    x * x
}

// ─────────────────────────────────────────────────────────────────────────────
// Probability <-> log-odds
// ─────────────────────────────────────────────────────────────────────────────

/// Smallest/largest probability accepted by [`logit`].
const PROBABILITY_EPSILON: f32 = 1e-4;

/// Log-odds of a probability: `ln(p / (1 - p))`.
///
/// The input is clamped away from 0 and 1 so the result is always finite.
#[inline]
pub fn logit(probability: f32) -> f32 {
    let p = probability.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
    (p / (1.0 - p)).ln()
}

/// Probability from log-odds: `1 / (1 + exp(-l))`.
#[inline]
pub fn log_odds_to_probability(log_odds: f32) -> f32 {
    1.0 / (1.0 + (-log_odds).exp())
}

// ─────────────────────────────────────────────────────────────────────────────
// Line / ray helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Distance along a ray at which it meets the horizontal plane `z = plane_z`.
///
/// Returns `None` when the ray is parallel to the plane or the plane is
/// behind the origin.
pub fn ray_plane_intersection(
    origin: &WorldPoint,
    direction: &WorldPoint,
    plane_z: f32,
) -> Option<f32> {
    if direction.z.abs() < 1e-6 {
        return None;
    }
    let t = (plane_z - origin.z) / direction.z;
    if t > 0.0 && t.is_finite() {
        Some(t)
    } else {
        None
    }
}

/// Closest distance from `point` to the segment `start..end`.
pub fn point_segment_distance(point: &WorldPoint, start: &WorldPoint, end: &WorldPoint) -> f32 {
    let seg = *end - *start;
    let len_sq = seg.dot(&seg);
    if len_sq < 1e-9 {
        return point.distance(start);
    }
    let t = ((*point - *start).dot(&seg) / len_sq).clamp(0.0, 1.0);
    point.distance(&start.along(&seg, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(PI / 2.0), PI / 2.0);
        assert!(normalize_angle(3.0 * PI).abs() - PI < 1e-5);
        assert_relative_eq!(angle_diff(0.1, -0.1), -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_logit_roundtrip() {
        for p in [0.1f32, 0.3, 0.5, 0.7, 0.95] {
            assert_relative_eq!(log_odds_to_probability(logit(p)), p, epsilon = 1e-5);
        }
        assert_eq!(logit(0.5), 0.0);
        assert!(logit(0.0).is_finite());
        assert!(logit(1.0).is_finite());
    }

    #[test]
    fn test_ray_plane_intersection() {
        let origin = WorldPoint::new(0.0, 0.0, 500.0);
        let down = WorldPoint::new(0.0, 1.0, -1.0).normalize().unwrap();
        let t = ray_plane_intersection(&origin, &down, 0.0).unwrap();
        assert_relative_eq!(t, 500.0 * 2f32.sqrt(), epsilon = 1e-2);

        let up = WorldPoint::new(0.0, 0.0, 1.0);
        assert!(ray_plane_intersection(&origin, &up, 0.0).is_none());
        let flat = WorldPoint::new(1.0, 0.0, 0.0);
        assert!(ray_plane_intersection(&origin, &flat, 0.0).is_none());
    }

    #[test]
    fn test_point_segment_distance() {
        let a = WorldPoint::new(0.0, 0.0, 0.0);
        let b = WorldPoint::new(0.0, 1000.0, 0.0);
        assert_relative_eq!(
            point_segment_distance(&WorldPoint::new(500.0, 500.0, 0.0), &a, &b),
            500.0
        );
        assert_relative_eq!(
            point_segment_distance(&WorldPoint::new(0.0, -300.0, 0.0), &a, &b),
            300.0
        );
    }
}
