//! Stereo features to world-frame evidence rays.

use serde::{Deserialize, Serialize};

use crate::core::{Pose3D, WorldPoint};

use super::ray_model::RayModelLookup;
use super::stereo::{StereoCalibration, StereoFeature};

/// Colour used when a feature has no colour sample.
pub const DEFAULT_COLOUR: [u8; 3] = [128, 128, 128];

/// World-frame evidence from one disparity feature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvidenceRay {
    /// Observer position (baseline midpoint)
    pub start: WorldPoint,
    /// Triangulated point
    pub end: WorldPoint,
    /// Occupancy probability at the ray end
    pub probability: f32,
    /// Colour of the feature
    pub colour: [u8; 3],
    /// Half-width of the range uncertainty band (mm)
    pub uncertainty_mm: f32,
}

impl EvidenceRay {
    /// Length of the ray (mm).
    #[inline]
    pub fn length(&self) -> f32 {
        self.start.distance(&self.end)
    }
}

/// Configuration for the stereo sensor model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorModelConfig {
    /// Standard deviation of the disparity measurement (pixels).
    /// Typical: 0.3-1.0
    pub disparity_error_pixels: f32,

    /// Occupancy probability of a close, sharp observation.
    pub peak_probability: f32,

    /// Features closer than this are ignored (mm).
    pub min_range_mm: f32,

    /// Features further than this are ignored (mm).
    pub max_range_mm: f32,

    /// Range bin size of the ray model lookup (mm).
    pub range_bin_mm: f32,

    /// Largest disparity covered by the ray model lookup (pixels).
    pub max_disparity: u32,

    /// Image columns sharing one ray model entry.
    pub column_group: u32,
}

impl Default for SensorModelConfig {
    fn default() -> Self {
        Self {
            disparity_error_pixels: 0.5,
            peak_probability: 0.8,
            min_range_mm: 100.0,
            max_range_mm: 4000.0,
            range_bin_mm: 20.0,
            max_disparity: 64,
            column_group: 8,
        }
    }
}

impl SensorModelConfig {
    /// Sharper, more confident sensor (well-textured scenes).
    pub fn high_quality() -> Self {
        Self {
            disparity_error_pixels: 0.3,
            peak_probability: 0.85,
            ..Default::default()
        }
    }

    /// Noisy sensor (low texture, low resolution).
    pub fn noisy() -> Self {
        Self {
            disparity_error_pixels: 1.0,
            peak_probability: 0.7,
            ..Default::default()
        }
    }
}

/// Converts stereo features into evidence rays.
#[derive(Debug, Clone, Default)]
pub struct StereoSensorModel {
    config: SensorModelConfig,
    lookup: Option<RayModelLookup>,
}

impl StereoSensorModel {
    /// Sensor model with analytic range uncertainty.
    pub fn new(config: SensorModelConfig) -> Self {
        Self {
            config,
            lookup: None,
        }
    }

    /// Sensor model that takes range uncertainty from a precomputed lookup
    /// whenever the lookup matches the calibration in use.
    pub fn with_lookup(config: SensorModelConfig, lookup: RayModelLookup) -> Self {
        Self {
            config,
            lookup: Some(lookup),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SensorModelConfig {
        &self.config
    }

    /// Precomputed ray model, if any.
    pub fn lookup(&self) -> Option<&RayModelLookup> {
        self.lookup.as_ref()
    }

    /// Occupancy probability of an observation at `range_mm`.
    ///
    /// Falls off linearly with range, never below a tenth of the peak
    /// evidence.
    pub fn occupancy_probability(&self, range_mm: f32) -> f32 {
        let falloff = (1.0 - range_mm / self.config.max_range_mm).clamp(0.1, 1.0);
        0.5 + (self.config.peak_probability - 0.5) * falloff
    }

    /// Half-width of the range uncertainty band (3σ) for a feature.
    pub fn range_uncertainty(
        &self,
        calibration: &StereoCalibration,
        feature: &StereoFeature,
        depth_mm: f32,
        range_mm: f32,
    ) -> f32 {
        if let Some(lookup) = &self.lookup
            && lookup.calibration() == calibration
            && let Some(dist) = lookup.distribution(feature.column, feature.disparity)
        {
            return 3.0 * dist.std_dev_mm(lookup.bin_mm());
        }

        // σ_Z = Z² / (f·B) · σ_d, scaled from depth to range along the ray
        let fb = calibration.focal_length_pixels() * calibration.baseline_mm;
        let sigma_depth = depth_mm * depth_mm / fb * self.config.disparity_error_pixels;
        let scale = if depth_mm > 0.0 { range_mm / depth_mm } else { 1.0 };
        3.0 * sigma_depth * scale
    }

    /// One evidence ray per usable feature.
    ///
    /// The camera-frame point is triangulated from the feature (x right,
    /// y along the optical axis, z up), rotated by the observer pose and,
    /// when `translate` is set, offset by its position. Features flagged
    /// invalid, with non-positive disparity or outside the configured range
    /// are skipped. `colours[i]` colours feature `i`.
    pub fn create_observation(
        &self,
        observer_pose: &Pose3D,
        calibration: &StereoCalibration,
        features: &[StereoFeature],
        colours: &[[u8; 3]],
        translate: bool,
    ) -> Vec<EvidenceRay> {
        if !calibration.is_valid() {
            return Vec::new();
        }

        let focal = calibration.focal_length_pixels();
        let (cx, cy) = calibration.principal_point();
        let rotation = observer_pose.rotation();
        let origin = if translate {
            observer_pose.position()
        } else {
            WorldPoint::ZERO
        };

        let mut rays = Vec::with_capacity(features.len());
        for (i, feature) in features.iter().enumerate() {
            if !feature.is_usable() {
                continue;
            }
            let Some(depth) = calibration.depth(feature.disparity) else {
                continue;
            };

            let local = WorldPoint::new(
                (feature.column - cx) * depth / focal,
                depth,
                -(feature.row - cy) * depth / focal,
            );
            let range = local.length();
            if range < self.config.min_range_mm || range > self.config.max_range_mm {
                continue;
            }

            let end = origin + rotation.rotate(&local);
            if !end.is_finite() {
                continue;
            }

            rays.push(EvidenceRay {
                start: origin,
                end,
                probability: self.occupancy_probability(range),
                colour: colours.get(i).copied().unwrap_or(DEFAULT_COLOUR),
                uncertainty_mm: self.range_uncertainty(calibration, feature, depth, range),
            });
        }
        rays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn calibration() -> StereoCalibration {
        StereoCalibration {
            baseline_mm: 100.0,
            fov_degrees: 90.0,
            image_width: 320,
            image_height: 240,
        }
    }

    #[test]
    fn test_centre_feature_lies_on_optical_axis() {
        let model = StereoSensorModel::default();
        let pose = Pose3D::at(100.0, 200.0, 300.0, 0.0);
        // f = 160 px, B = 100 mm, d = 16 → 1000 mm
        let features = [StereoFeature::new(160.0, 120.0, 16.0)];
        let rays = model.create_observation(&pose, &calibration(), &features, &[[1, 2, 3]], true);

        assert_eq!(rays.len(), 1);
        let ray = rays[0];
        assert_relative_eq!(ray.start.x, 100.0);
        assert_relative_eq!(ray.end.x, 100.0, epsilon = 1e-3);
        assert_relative_eq!(ray.end.y, 1200.0, epsilon = 1e-2);
        assert_relative_eq!(ray.end.z, 300.0, epsilon = 1e-3);
        assert_eq!(ray.colour, [1, 2, 3]);
        assert!(ray.probability > 0.5 && ray.probability <= 0.8);
    }

    #[test]
    fn test_rotation_without_translation() {
        let model = StereoSensorModel::default();
        let pose = Pose3D::at(5000.0, 5000.0, 0.0, FRAC_PI_2);
        let features = [StereoFeature::new(160.0, 120.0, 16.0)];
        let rays = model.create_observation(&pose, &calibration(), &features, &[], false);

        assert_eq!(rays[0].start, WorldPoint::ZERO);
        assert_relative_eq!(rays[0].end.x, 1000.0, epsilon = 1e-2);
        assert_relative_eq!(rays[0].end.y, 0.0, epsilon = 1e-2);
        assert_eq!(rays[0].colour, DEFAULT_COLOUR);
    }

    #[test]
    fn test_image_axes() {
        let model = StereoSensorModel::default();
        let pose = Pose3D::identity();
        // Right of centre and above centre
        let features = [StereoFeature::new(240.0, 40.0, 16.0)];
        let rays = model.create_observation(&pose, &calibration(), &features, &[], true);
        assert!(rays[0].end.x > 0.0);
        assert!(rays[0].end.z > 0.0);
    }

    #[test]
    fn test_invalid_features_skipped() {
        let model = StereoSensorModel::default();
        let mut invalid = StereoFeature::new(100.0, 100.0, 10.0);
        invalid.valid = false;
        let features = [
            invalid,
            StereoFeature::new(100.0, 100.0, 0.0),
            StereoFeature::new(100.0, 100.0, -3.0),
            StereoFeature::new(100.0, 100.0, 10.0),
        ];
        let rays =
            model.create_observation(&Pose3D::identity(), &calibration(), &features, &[], true);
        assert_eq!(rays.len(), 1);
        assert!(model.create_observation(&Pose3D::identity(), &calibration(), &[], &[], true).is_empty());
    }

    #[test]
    fn test_uncertainty_grows_with_range() {
        let model = StereoSensorModel::default();
        let features = [
            StereoFeature::new(160.0, 120.0, 32.0),
            StereoFeature::new(160.0, 120.0, 8.0),
        ];
        let rays =
            model.create_observation(&Pose3D::identity(), &calibration(), &features, &[], true);
        assert_eq!(rays.len(), 2);
        assert!(rays[1].uncertainty_mm > rays[0].uncertainty_mm);
        assert!(rays[1].probability < rays[0].probability);
    }
}
