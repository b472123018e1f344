//! Synthetic stereo sensor.
//!
//! Renders what a stereo head would see from a map lineage and converts the
//! range image back to disparity features. Used to drive the filter in
//! simulation and tests without camera hardware.

use crate::core::{Lineage, NoiseGenerator, Pose3D};
use crate::grid::{DistributedGrid, RangeImage, pixel_direction};

use super::observation::DEFAULT_COLOUR;
use super::stereo::{StereoCalibration, StereoFeature, StereoHead};

/// Colour reported for ground-plane hits.
pub const GROUND_COLOUR: [u8; 3] = [90, 90, 90];

/// Convert a probed range image to disparity features.
///
/// Samples without a detection produce no feature.
pub fn range_image_to_features(
    image: &RangeImage,
    calibration: &StereoCalibration,
) -> Vec<StereoFeature> {
    let mut features = Vec::with_capacity(image.detections());
    for row in 0..image.rows {
        for col in 0..image.cols {
            let Some(range) = image.get(col, row) else {
                continue;
            };
            let (column, pixel_row) = image.pixel(col, row);
            let dir = pixel_direction(
                column,
                pixel_row,
                image.image_width,
                image.image_height,
                image.focal_length_pixels,
            );
            let depth = range / dir.length();
            if let Some(disparity) = calibration.disparity(depth) {
                features.push(StereoFeature::new(column, pixel_row, disparity));
            }
        }
    }
    features
}

/// Render the view of `lineage` from `camera_pose` and convert it to
/// disparity features, sampling every `step` pixels.
pub fn synthesize_features(
    grid: &DistributedGrid,
    lineage: &Lineage,
    camera_pose: &Pose3D,
    calibration: &StereoCalibration,
    step: usize,
) -> Vec<StereoFeature> {
    let image = grid.probe_view(
        camera_pose,
        calibration.fov_degrees,
        calibration.image_width,
        calibration.image_height,
        step,
        grid.config().max_mapping_range_mm,
        lineage,
    );
    range_image_to_features(&image, calibration)
}

/// Simulated stereo head with disparity noise.
#[derive(Clone, Debug)]
pub struct SyntheticStereo {
    noise: NoiseGenerator,
    disparity_noise_px: f32,
    step: usize,
}

impl SyntheticStereo {
    /// Create a simulator. A `seed` of 0 is non-deterministic.
    pub fn new(seed: u64, disparity_noise_px: f32, step: usize) -> Self {
        Self {
            noise: NoiseGenerator::new(seed),
            disparity_noise_px,
            step: step.max(1),
        }
    }

    /// Capture features and colours for a head mounted on a robot at
    /// `robot_pose`, seen through `lineage`.
    pub fn capture(
        &mut self,
        grid: &DistributedGrid,
        lineage: &Lineage,
        robot_pose: &Pose3D,
        head: &StereoHead,
    ) -> (Vec<StereoFeature>, Vec<[u8; 3]>) {
        let camera = head.camera_pose(robot_pose);
        let mut features =
            synthesize_features(grid, lineage, &camera, &head.calibration, self.step);

        let focal = head.calibration.focal_length_pixels();
        let rotation = camera.rotation();
        let origin = camera.position();
        let mut colours = Vec::with_capacity(features.len());
        for feature in features.iter_mut() {
            // Colour of the hit cell, looked up before noise is applied
            let colour = head
                .calibration
                .depth(feature.disparity)
                .map(|depth| {
                    let local = pixel_direction(
                        feature.column,
                        feature.row,
                        head.calibration.image_width,
                        head.calibration.image_height,
                        focal,
                    ) * depth;
                    origin + rotation.rotate(&local)
                })
                .map(|hit| {
                    if hit.z < grid.config().cell_size_mm * 0.5 {
                        return GROUND_COLOUR;
                    }
                    let coord = grid.config().world_to_grid(&hit);
                    grid.config()
                        .cell_index(&coord)
                        .and_then(|cell| grid.resolve(cell, lineage))
                        .map(|node| node.colour)
                        .unwrap_or(DEFAULT_COLOUR)
                })
                .unwrap_or(DEFAULT_COLOUR);
            colours.push(colour);

            feature.disparity += self.noise.gaussian(self.disparity_noise_px);
            if feature.disparity <= 0.0 {
                feature.valid = false;
            }
        }
        (features, colours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorldPoint;
    use crate::grid::MapConfig;
    use approx::assert_relative_eq;

    fn calibration() -> StereoCalibration {
        StereoCalibration {
            baseline_mm: 100.0,
            fov_degrees: 60.0,
            image_width: 64,
            image_height: 48,
        }
    }

    #[test]
    fn test_features_from_wall() {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let lineage = Lineage::committed_only();
        grid.insert_wall(
            &WorldPoint::new(-1000.0, 1010.0, 0.0),
            &WorldPoint::new(1000.0, 1010.0, 0.0),
            600.0,
            &lineage,
        );

        let camera = Pose3D::at(0.0, 0.0, 300.0, 0.0);
        let features = synthesize_features(&grid, &lineage, &camera, &calibration(), 4);
        assert!(!features.is_empty());

        // Centre pixel looks straight at the wall
        let centre = features
            .iter()
            .find(|f| f.column == 32.0 && f.row == 24.0)
            .unwrap();
        let depth = calibration().depth(centre.disparity).unwrap();
        assert!((depth - 1010.0).abs() < 30.0, "depth {}", depth);
    }

    #[test]
    fn test_empty_map_has_only_ground() {
        let grid = DistributedGrid::new(MapConfig::fine());
        let camera = Pose3D::at(0.0, 0.0, 300.0, 0.0);
        let features =
            synthesize_features(&grid, &Lineage::committed_only(), &camera, &calibration(), 4);
        // Only rows below the horizon see the floor
        assert!(features.iter().all(|f| f.row > 24.0));
    }

    #[test]
    fn test_capture_colours_and_noise() {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let lineage = Lineage::committed_only();
        grid.insert_wall(
            &WorldPoint::new(-1000.0, 1010.0, 0.0),
            &WorldPoint::new(1000.0, 1010.0, 0.0),
            600.0,
            &lineage,
        );
        let head = StereoHead {
            calibration: calibration(),
            mount: Pose3D::new(0.0, 0.0, 300.0, 0.0, 0.0, 0.0),
        };

        let mut exact = SyntheticStereo::new(1, 0.0, 4);
        let mut noisy = SyntheticStereo::new(1, 0.5, 4);
        let (clean, colours) = exact.capture(&grid, &lineage, &Pose3D::identity(), &head);
        let (jittered, _) = noisy.capture(&grid, &lineage, &Pose3D::identity(), &head);

        assert_eq!(clean.len(), colours.len());
        assert_eq!(clean.len(), jittered.len());
        assert!(colours.contains(&crate::grid::WALL_COLOUR));
        let differs = clean
            .iter()
            .zip(&jittered)
            .any(|(a, b)| (a.disparity - b.disparity).abs() > 1e-3);
        assert!(differs);
        assert_relative_eq!(clean[0].column, jittered[0].column);
    }
}
