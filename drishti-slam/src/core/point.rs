//! Point and coordinate types for the 3D occupancy grid.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Grid coordinates (integer cell indices)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// X coordinate (column index)
    pub x: i32,
    /// Y coordinate (row index)
    pub y: i32,
    /// Z coordinate (layer index, 0 = ground layer)
    pub z: i32,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chebyshev distance (max of per-axis distance)
    #[inline]
    pub fn chebyshev_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

impl Add for GridCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        GridCoord::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for GridCoord {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        GridCoord::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// World coordinates in millimetres.
///
/// Also used as a free vector (ray directions, offsets).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate (mm, right of the robot at pan 0)
    pub x: f32,
    /// Y coordinate (mm, forward at pan 0)
    pub y: f32,
    /// Z coordinate (mm, up from the ground plane)
    pub z: f32,
}

impl WorldPoint {
    /// Create a new world point
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero point (origin)
    pub const ZERO: WorldPoint = WorldPoint {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &WorldPoint) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance (faster, avoids sqrt)
    #[inline]
    pub fn distance_squared(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Horizontal (x/y) distance, ignoring height
    #[inline]
    pub fn horizontal_distance(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Length (magnitude) of this point as a vector from origin
    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Normalize to unit length.
    ///
    /// Returns `None` for a zero-length or non-finite vector.
    #[inline]
    pub fn normalize(&self) -> Option<WorldPoint> {
        let len = self.length();
        if len > f32::EPSILON && len.is_finite() {
            Some(*self * (1.0 / len))
        } else {
            None
        }
    }

    /// Dot product
    #[inline]
    pub fn dot(&self, other: &WorldPoint) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Point reached by travelling `distance` along `direction` (unit vector)
    #[inline]
    pub fn along(&self, direction: &WorldPoint, distance: f32) -> WorldPoint {
        *self + *direction * distance
    }

    /// All components finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for WorldPoint {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        WorldPoint::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for WorldPoint {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        WorldPoint::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for WorldPoint {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        WorldPoint::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Neg for WorldPoint {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        WorldPoint::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = WorldPoint::new(0.0, 0.0, 0.0);
        let b = WorldPoint::new(300.0, 400.0, 0.0);
        assert_relative_eq!(a.distance(&b), 500.0);
        assert_relative_eq!(a.horizontal_distance(&WorldPoint::new(3.0, 4.0, 99.0)), 5.0);
    }

    #[test]
    fn test_normalize_zero() {
        assert!(WorldPoint::ZERO.normalize().is_none());
        let n = WorldPoint::new(0.0, 0.0, -7.0).normalize().unwrap();
        assert_relative_eq!(n.z, -1.0);
    }

    #[test]
    fn test_grid_coord_ops() {
        let a = GridCoord::new(1, 2, 3);
        let b = GridCoord::new(4, 0, 3);
        assert_eq!(a + b, GridCoord::new(5, 2, 6));
        assert_eq!(a.chebyshev_distance(&b), 3);
    }
}
