//! 3D robot / camera pose.
//!
//! Orientation is stored as pan, tilt and roll. The local frame has
//! x pointing right, y forward and z up. A pose rotates local vectors by
//! roll (about local y), then tilt (about local x), then pan (about world z):
//!
//! ```text
//! forward(pan, tilt) = (sin pan * cos tilt, cos pan * cos tilt, sin tilt)
//! ```
//!
//! Positive pan turns the forward axis toward +x, positive tilt raises it
//! toward +z.

use serde::{Deserialize, Serialize};

use super::WorldPoint;
use super::math::normalize_angle;

/// Rotation stored as the world-frame images of the local axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation3 {
    /// Image of local +x
    pub right: WorldPoint,
    /// Image of local +y
    pub forward: WorldPoint,
    /// Image of local +z
    pub up: WorldPoint,
}

impl Rotation3 {
    /// Identity rotation.
    pub const IDENTITY: Rotation3 = Rotation3 {
        right: WorldPoint {
            x: 1.0,
            y: 0.0,
            z: 0.0,
        },
        forward: WorldPoint {
            x: 0.0,
            y: 1.0,
            z: 0.0,
        },
        up: WorldPoint {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        },
    };

    /// Build from pan, tilt and roll.
    pub fn from_angles(pan: f32, tilt: f32, roll: f32) -> Self {
        let (sp, cp) = pan.sin_cos();
        let (st, ct) = tilt.sin_cos();
        let (sr, cr) = roll.sin_cos();

        let right = WorldPoint::new(cr * cp + sr * st * sp, -cr * sp + sr * st * cp, -sr * ct);
        let forward = WorldPoint::new(sp * ct, cp * ct, st);
        let up = WorldPoint::new(sr * cp - cr * st * sp, -sr * sp - cr * st * cp, cr * ct);

        Self { right, forward, up }
    }

    /// Recover (pan, tilt, roll).
    pub fn to_angles(&self) -> (f32, f32, f32) {
        let tilt = self.forward.z.clamp(-1.0, 1.0).asin();
        let pan = self.forward.x.atan2(self.forward.y);
        let roll = (-self.right.z).atan2(self.up.z);
        (pan, tilt, roll)
    }

    /// Rotate a local vector into the world frame.
    #[inline]
    pub fn rotate(&self, v: &WorldPoint) -> WorldPoint {
        self.right * v.x + self.forward * v.y + self.up * v.z
    }

    /// Rotate a world vector into the local frame (inverse rotation).
    #[inline]
    pub fn inverse_rotate(&self, v: &WorldPoint) -> WorldPoint {
        WorldPoint::new(self.right.dot(v), self.forward.dot(v), self.up.dot(v))
    }

    /// Compose: apply `local` first, then `self`.
    pub fn compose(&self, local: &Rotation3) -> Rotation3 {
        Rotation3 {
            right: self.rotate(&local.right),
            forward: self.rotate(&local.forward),
            up: self.rotate(&local.up),
        }
    }
}

/// Position (mm) and orientation (radians) of the robot or a camera.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose3D {
    /// X position (mm)
    pub x: f32,
    /// Y position (mm)
    pub y: f32,
    /// Z position (mm above the ground plane)
    pub z: f32,
    /// Rotation about the vertical axis
    pub pan: f32,
    /// Elevation of the forward axis
    pub tilt: f32,
    /// Rotation about the forward axis
    pub roll: f32,
}

impl Pose3D {
    /// Create a pose from position and orientation.
    pub fn new(x: f32, y: f32, z: f32, pan: f32, tilt: f32, roll: f32) -> Self {
        Self {
            x,
            y,
            z,
            pan,
            tilt,
            roll,
        }
    }

    /// Level pose at a position facing `pan`.
    pub fn at(x: f32, y: f32, z: f32, pan: f32) -> Self {
        Self::new(x, y, z, pan, 0.0, 0.0)
    }

    /// Identity pose.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Position as a world point.
    #[inline]
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y, self.z)
    }

    /// Orientation as a rotation.
    #[inline]
    pub fn rotation(&self) -> Rotation3 {
        Rotation3::from_angles(self.pan, self.tilt, self.roll)
    }

    /// Unit forward (viewing) direction.
    #[inline]
    pub fn forward(&self) -> WorldPoint {
        let (sp, cp) = self.pan.sin_cos();
        let (st, ct) = self.tilt.sin_cos();
        WorldPoint::new(sp * ct, cp * ct, st)
    }

    /// Transform a point from this pose's local frame to the world frame.
    #[inline]
    pub fn transform_point(&self, local: &WorldPoint) -> WorldPoint {
        self.position() + self.rotation().rotate(local)
    }

    /// Compose with a pose expressed in this pose's frame (e.g. a camera mount).
    pub fn compose(&self, local: &Pose3D) -> Pose3D {
        let rotation = self.rotation();
        let position = self.position() + rotation.rotate(&local.position());
        let (pan, tilt, roll) = rotation.compose(&local.rotation()).to_angles();
        Pose3D::new(position.x, position.y, position.z, pan, tilt, roll)
    }

    /// Euclidean distance between positions.
    #[inline]
    pub fn distance(&self, other: &Pose3D) -> f32 {
        self.position().distance(&other.position())
    }

    /// Copy with all angles normalized to [-π, π).
    pub fn normalized(&self) -> Pose3D {
        Pose3D::new(
            self.x,
            self.y,
            self.z,
            normalize_angle(self.pan),
            normalize_angle(self.tilt),
            normalize_angle(self.roll),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_forward_matches_rotation() {
        let pose = Pose3D::new(0.0, 0.0, 0.0, 0.4, -0.3, 0.2);
        let f1 = pose.forward();
        let f2 = pose.rotation().rotate(&WorldPoint::new(0.0, 1.0, 0.0));
        assert_relative_eq!(f1.x, f2.x, epsilon = 1e-6);
        assert_relative_eq!(f1.y, f2.y, epsilon = 1e-6);
        assert_relative_eq!(f1.z, f2.z, epsilon = 1e-6);
    }

    #[test]
    fn test_pan_turns_toward_positive_x() {
        let pose = Pose3D::at(0.0, 0.0, 0.0, FRAC_PI_2);
        let f = pose.forward();
        assert_relative_eq!(f.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(f.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let r = Rotation3::from_angles(1.1, 0.5, -0.7);
        assert_relative_eq!(r.right.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(r.up.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(r.right.dot(&r.forward), 0.0, epsilon = 1e-5);
        assert_relative_eq!(r.right.dot(&r.up), 0.0, epsilon = 1e-5);
        assert_relative_eq!(r.forward.dot(&r.up), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_angles_roundtrip() {
        let (pan, tilt, roll) = Rotation3::from_angles(0.8, -0.4, 0.3).to_angles();
        assert_relative_eq!(pan, 0.8, epsilon = 1e-5);
        assert_relative_eq!(tilt, -0.4, epsilon = 1e-5);
        assert_relative_eq!(roll, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_inverse_rotate() {
        let r = Rotation3::from_angles(0.3, 0.2, 0.1);
        let v = WorldPoint::new(10.0, -20.0, 5.0);
        let back = r.inverse_rotate(&r.rotate(&v));
        assert_relative_eq!(back.x, v.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-4);
        assert_relative_eq!(back.z, v.z, epsilon = 1e-4);
    }

    #[test]
    fn test_compose_camera_mount() {
        // Robot facing +x, camera mounted 100mm forward and 400mm up, tilted down
        let robot = Pose3D::at(1000.0, 0.0, 0.0, FRAC_PI_2);
        let mount = Pose3D::new(0.0, 100.0, 400.0, 0.0, -0.2, 0.0);
        let camera = robot.compose(&mount);

        assert_relative_eq!(camera.x, 1100.0, epsilon = 1e-3);
        assert_relative_eq!(camera.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(camera.z, 400.0, epsilon = 1e-3);
        assert_relative_eq!(camera.pan, FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(camera.tilt, -0.2, epsilon = 1e-5);
    }
}
