//! Stereo camera geometry.
//!
//! Triangulation for a rectified stereo pair:
//!
//! ```text
//! depth = focal_length_pixels * baseline_mm / disparity
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{Pose3D, deg_to_rad};

/// Depth (mm) from disparity (pixels).
///
/// `focal_length_mm * pixels_per_mm` gives the focal length in pixels.
/// Returns `None` for non-positive or non-finite input.
pub fn disparity_to_distance(
    disparity: f32,
    focal_length_mm: f32,
    pixels_per_mm: f32,
    baseline_mm: f32,
) -> Option<f32> {
    let focal_length_pixels = focal_length_mm * pixels_per_mm;
    if !(disparity.is_finite() && focal_length_pixels.is_finite() && baseline_mm.is_finite()) {
        return None;
    }
    if disparity <= 0.0 || focal_length_pixels <= 0.0 || baseline_mm <= 0.0 {
        return None;
    }
    let distance = focal_length_pixels * baseline_mm / disparity;
    distance.is_finite().then_some(distance)
}

/// Disparity (pixels) from depth (mm). Inverse of [`disparity_to_distance`].
pub fn distance_to_disparity(
    range_mm: f32,
    focal_length_pixels: f32,
    baseline_mm: f32,
) -> Option<f32> {
    if !(range_mm.is_finite() && focal_length_pixels.is_finite() && baseline_mm.is_finite()) {
        return None;
    }
    if range_mm <= 0.0 || focal_length_pixels <= 0.0 || baseline_mm <= 0.0 {
        return None;
    }
    let disparity = focal_length_pixels * baseline_mm / range_mm;
    disparity.is_finite().then_some(disparity)
}

/// Calibration of one rectified stereo pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StereoCalibration {
    /// Distance between the two camera centres (mm)
    pub baseline_mm: f32,
    /// Horizontal field of view (degrees)
    pub fov_degrees: f32,
    /// Image width (pixels)
    pub image_width: usize,
    /// Image height (pixels)
    pub image_height: usize,
}

impl Default for StereoCalibration {
    fn default() -> Self {
        Self {
            baseline_mm: 100.0,
            fov_degrees: 65.0,
            image_width: 320,
            image_height: 240,
        }
    }
}

impl StereoCalibration {
    /// Focal length in pixels from the horizontal field of view.
    pub fn focal_length_pixels(&self) -> f32 {
        let half_fov = deg_to_rad(self.fov_degrees) / 2.0;
        (self.image_width as f32 / 2.0) / half_fov.tan()
    }

    /// Principal point (image centre).
    pub fn principal_point(&self) -> (f32, f32) {
        (self.image_width as f32 / 2.0, self.image_height as f32 / 2.0)
    }

    /// Depth from disparity for this calibration.
    pub fn depth(&self, disparity: f32) -> Option<f32> {
        disparity_to_distance(disparity, self.focal_length_pixels(), 1.0, self.baseline_mm)
    }

    /// Disparity for a depth under this calibration.
    pub fn disparity(&self, depth_mm: f32) -> Option<f32> {
        distance_to_disparity(depth_mm, self.focal_length_pixels(), self.baseline_mm)
    }

    /// True when every parameter is usable.
    pub fn is_valid(&self) -> bool {
        self.baseline_mm.is_finite()
            && self.baseline_mm > 0.0
            && self.fov_degrees > 0.0
            && self.fov_degrees < 180.0
            && self.image_width > 0
            && self.image_height > 0
    }
}

/// A stereo camera pair and its mounting on the robot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StereoHead {
    /// Camera calibration
    pub calibration: StereoCalibration,
    /// Baseline midpoint and orientation in the robot frame
    pub mount: Pose3D,
}

impl Default for StereoHead {
    fn default() -> Self {
        Self {
            calibration: StereoCalibration::default(),
            mount: Pose3D::new(0.0, 0.0, 400.0, 0.0, 0.0, 0.0),
        }
    }
}

impl StereoHead {
    /// Camera pose in the world for a robot pose.
    pub fn camera_pose(&self, robot_pose: &Pose3D) -> Pose3D {
        robot_pose.compose(&self.mount)
    }
}

/// One stereo correspondence.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct StereoFeature {
    /// Pixel column in the left image
    pub column: f32,
    /// Pixel row in the left image
    pub row: f32,
    /// Disparity (pixels)
    pub disparity: f32,
    /// Matcher confidence flag
    pub valid: bool,
}

impl StereoFeature {
    /// Create a valid feature.
    pub fn new(column: f32, row: f32, disparity: f32) -> Self {
        Self {
            column,
            row,
            disparity,
            valid: true,
        }
    }

    /// Usable for triangulation.
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.valid
            && self.disparity.is_finite()
            && self.disparity > 0.0
            && self.column.is_finite()
            && self.row.is_finite()
    }
}

/// Features captured by one stereo head in one update cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StereoFrame {
    /// Index of the capturing head
    pub head: usize,
    /// Correspondences, in capture order
    pub features: Vec<StereoFeature>,
    /// Colour of each feature (may be shorter than `features`)
    pub colours: Vec<[u8; 3]>,
}

impl StereoFrame {
    /// Frame from features and their colours.
    pub fn new(head: usize, features: Vec<StereoFeature>, colours: Vec<[u8; 3]>) -> Self {
        Self {
            head,
            features,
            colours,
        }
    }

    /// True when the frame carries no usable feature.
    pub fn is_empty(&self) -> bool {
        !self.features.iter().any(StereoFeature::is_usable)
    }
}
