//! Stereo sensor configuration section.

use serde::{Deserialize, Serialize};

use crate::core::{Pose3D, deg_to_rad};
use crate::sensor::{SensorModelConfig, StereoCalibration, StereoHead};

use super::defaults;

/// Stereo configuration section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSection {
    /// Stereo heads on the robot
    #[serde(default = "default_heads")]
    pub heads: Vec<HeadSettings>,

    /// Sensor model settings shared by all heads
    #[serde(default)]
    pub model: ModelSettings,
}

fn default_heads() -> Vec<HeadSettings> {
    vec![HeadSettings::default()]
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            heads: default_heads(),
            model: ModelSettings::default(),
        }
    }
}

impl SensorSection {
    /// Convert to runtime stereo heads
    pub fn to_heads(&self) -> Vec<StereoHead> {
        self.heads.iter().map(HeadSettings::to_head).collect()
    }
}

/// One stereo head: calibration and mounting on the robot.
///
/// Angles are given in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadSettings {
    /// Camera separation (mm)
    #[serde(default = "defaults::baseline_mm")]
    pub baseline_mm: f32,

    /// Horizontal field of view (degrees)
    #[serde(default = "defaults::fov_degrees")]
    pub fov_degrees: f32,

    /// Image width (pixels)
    #[serde(default = "defaults::image_width")]
    pub image_width: usize,

    /// Image height (pixels)
    #[serde(default = "defaults::image_height")]
    pub image_height: usize,

    /// Mount offset right of the robot centre (mm)
    #[serde(default)]
    pub offset_x_mm: f32,

    /// Mount offset ahead of the robot centre (mm)
    #[serde(default)]
    pub offset_y_mm: f32,

    /// Mount height above the ground (mm)
    #[serde(default = "defaults::mount_height_mm")]
    pub offset_z_mm: f32,

    /// Mount pan (degrees)
    #[serde(default)]
    pub pan_degrees: f32,

    /// Mount tilt (degrees, positive looks up)
    #[serde(default)]
    pub tilt_degrees: f32,

    /// Mount roll (degrees)
    #[serde(default)]
    pub roll_degrees: f32,
}

impl Default for HeadSettings {
    fn default() -> Self {
        Self {
            baseline_mm: defaults::baseline_mm(),
            fov_degrees: defaults::fov_degrees(),
            image_width: defaults::image_width(),
            image_height: defaults::image_height(),
            offset_x_mm: 0.0,
            offset_y_mm: 0.0,
            offset_z_mm: defaults::mount_height_mm(),
            pan_degrees: 0.0,
            tilt_degrees: 0.0,
            roll_degrees: 0.0,
        }
    }
}

impl HeadSettings {
    /// Convert to a runtime stereo head
    pub fn to_head(&self) -> StereoHead {
        StereoHead {
            calibration: StereoCalibration {
                baseline_mm: self.baseline_mm,
                fov_degrees: self.fov_degrees,
                image_width: self.image_width,
                image_height: self.image_height,
            },
            mount: Pose3D::new(
                self.offset_x_mm,
                self.offset_y_mm,
                self.offset_z_mm,
                deg_to_rad(self.pan_degrees),
                deg_to_rad(self.tilt_degrees),
                deg_to_rad(self.roll_degrees),
            ),
        }
    }
}

/// Sensor model settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Disparity noise (pixels)
    #[serde(default = "defaults::disparity_error_pixels")]
    pub disparity_error_pixels: f32,

    /// Occupancy probability at close range
    #[serde(default = "defaults::peak_probability")]
    pub peak_probability: f32,

    /// Minimum feature range (mm)
    #[serde(default = "defaults::min_range_mm")]
    pub min_range_mm: f32,

    /// Maximum feature range (mm)
    #[serde(default = "defaults::max_mapping_range_mm")]
    pub max_range_mm: f32,

    /// Ray model range bin (mm)
    #[serde(default = "defaults::range_bin_mm")]
    pub range_bin_mm: f32,

    /// Ray model disparity limit (pixels)
    #[serde(default = "defaults::max_disparity")]
    pub max_disparity: u32,

    /// Ray model column grouping
    #[serde(default = "defaults::column_group")]
    pub column_group: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            disparity_error_pixels: defaults::disparity_error_pixels(),
            peak_probability: defaults::peak_probability(),
            min_range_mm: defaults::min_range_mm(),
            max_range_mm: defaults::max_mapping_range_mm(),
            range_bin_mm: defaults::range_bin_mm(),
            max_disparity: defaults::max_disparity(),
            column_group: defaults::column_group(),
        }
    }
}

impl ModelSettings {
    /// Convert to SensorModelConfig
    pub fn to_sensor_model_config(&self) -> SensorModelConfig {
        SensorModelConfig {
            disparity_error_pixels: self.disparity_error_pixels,
            peak_probability: self.peak_probability,
            min_range_mm: self.min_range_mm,
            max_range_mm: self.max_range_mm,
            range_bin_mm: self.range_bin_mm,
            max_disparity: self.max_disparity,
            column_group: self.column_group,
        }
    }
}
