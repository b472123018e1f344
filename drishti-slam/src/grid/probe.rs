//! Range probing through a hypothesis's view of the map.
//!
//! Probes answer "how far would a sensor at this pose see along this ray":
//! the building block for scoring hypotheses and for synthetic views.

use crate::core::math::ray_plane_intersection;
use crate::core::{Lineage, Pose3D, WorldPoint, deg_to_rad};

use super::DistributedGrid;
use super::raycaster::VoxelTraversal;

/// Sub-sampled grid of probed ranges from a camera pose.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeImage {
    /// Samples per row
    pub cols: usize,
    /// Sample rows
    pub rows: usize,
    /// Pixel step between samples
    pub step: usize,
    /// Source image width (pixels)
    pub image_width: usize,
    /// Source image height (pixels)
    pub image_height: usize,
    /// Focal length used for the sample directions (pixels)
    pub focal_length_pixels: f32,
    /// Range along each sample ray (mm), row-major, `None` = no detection
    pub ranges: Vec<Option<f32>>,
}

impl RangeImage {
    /// Range at a sample position.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.ranges[row * self.cols + col]
    }

    /// Pixel coordinates of a sample.
    pub fn pixel(&self, col: usize, row: usize) -> (f32, f32) {
        ((col * self.step) as f32, (row * self.step) as f32)
    }

    /// Number of samples with a detection.
    pub fn detections(&self) -> usize {
        self.ranges.iter().filter(|r| r.is_some()).count()
    }
}

/// Unnormalized camera-frame direction through a pixel.
///
/// x right, y forward (optical axis), z up; y component is always 1 so the
/// depth of a point at range `r` along it is `r / |dir|`.
#[inline]
pub fn pixel_direction(
    column: f32,
    row: f32,
    image_width: usize,
    image_height: usize,
    focal_length_pixels: f32,
) -> WorldPoint {
    let cx = image_width as f32 / 2.0;
    let cy = image_height as f32 / 2.0;
    WorldPoint::new(
        (column - cx) / focal_length_pixels,
        1.0,
        -(row - cy) / focal_length_pixels,
    )
}

impl DistributedGrid {
    /// Distance to the first cell along the ray whose occupancy probability
    /// exceeds the detection threshold, as seen by `lineage`.
    ///
    /// The distance is measured to the midpoint of the ray's passage through
    /// that cell. Returns `None` when nothing is detected within
    /// `max_mapping_range_mm` or inside the grid. With `use_ground_plane`, a
    /// downward ray that detects nothing reports its intersection with z = 0
    /// when that lies within range.
    pub fn probe_range(
        &self,
        origin: &WorldPoint,
        direction: &WorldPoint,
        lineage: &Lineage,
        use_ground_plane: bool,
    ) -> Option<f32> {
        let max_range = self.config().max_mapping_range_mm;
        self.probe_range_limited(origin, direction, lineage, use_ground_plane, max_range)
    }

    /// [`probe_range`](Self::probe_range) with an explicit range limit,
    /// itself capped at `max_mapping_range_mm`.
    pub fn probe_range_limited(
        &self,
        origin: &WorldPoint,
        direction: &WorldPoint,
        lineage: &Lineage,
        use_ground_plane: bool,
        max_range: f32,
    ) -> Option<f32> {
        let direction = direction.normalize()?;
        let config = self.config();
        let max_range = max_range.min(config.max_mapping_range_mm);
        let threshold = config.detection_threshold;

        for step in VoxelTraversal::new(config, origin, &direction, max_range) {
            let Some(cell) = config.cell_index(&step.coord) else {
                continue;
            };
            if let Some(node) = self.resolve(cell, lineage)
                && node.probability() > threshold
            {
                return Some(step.t_mid());
            }
        }

        if use_ground_plane {
            return ray_plane_intersection(origin, &direction, 0.0).filter(|t| *t <= max_range);
        }
        None
    }

    /// Probe a sub-sampled synthetic view from a camera pose.
    ///
    /// Produces `ceil(width / step) × ceil(height / step)` samples, one
    /// ground-plane-aware probe per sampled pixel.
    #[allow(clippy::too_many_arguments)]
    pub fn probe_view(
        &self,
        camera_pose: &Pose3D,
        fov_degrees: f32,
        width: usize,
        height: usize,
        step: usize,
        max_range: f32,
        lineage: &Lineage,
    ) -> RangeImage {
        let step = step.max(1);
        let cols = width.div_ceil(step);
        let rows = height.div_ceil(step);
        let half_fov = deg_to_rad(fov_degrees) / 2.0;
        let focal = if half_fov > 0.0 && half_fov.tan() > 0.0 {
            (width as f32 / 2.0) / half_fov.tan()
        } else {
            width as f32
        };

        let origin = camera_pose.position();
        let rotation = camera_pose.rotation();
        let mut ranges = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let local = pixel_direction(
                    (col * step) as f32,
                    (row * step) as f32,
                    width,
                    height,
                    focal,
                );
                let world = rotation.rotate(&local);
                ranges.push(self.probe_range_limited(&origin, &world, lineage, true, max_range));
            }
        }

        RangeImage {
            cols,
            rows,
            step,
            image_width: width,
            image_height: height,
            focal_length_pixels: focal,
            ranges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MapConfig;
    use approx::assert_relative_eq;

    #[test]
    fn test_probe_empty_grid_is_none() {
        let grid = DistributedGrid::new(MapConfig::fine());
        let lineage = Lineage::committed_only();
        let origin = WorldPoint::new(0.0, 0.0, 200.0);
        let dir = WorldPoint::new(1.0, 0.0, 0.0);
        assert!(grid.probe_range(&origin, &dir, &lineage, false).is_none());
        assert!(grid.probe_range(&origin, &dir, &lineage, true).is_none());
    }

    #[test]
    fn test_probe_zero_direction() {
        let grid = DistributedGrid::new(MapConfig::fine());
        let origin = WorldPoint::new(0.0, 0.0, 200.0);
        assert!(
            grid.probe_range(&origin, &WorldPoint::ZERO, &Lineage::committed_only(), true)
                .is_none()
        );
    }

    #[test]
    fn test_ground_plane_hit() {
        let grid = DistributedGrid::new(MapConfig::fine());
        let origin = WorldPoint::new(0.0, 0.0, 400.0);
        let dir = WorldPoint::new(0.0, 1.0, -1.0);
        let range = grid
            .probe_range(&origin, &dir, &Lineage::committed_only(), true)
            .unwrap();
        assert_relative_eq!(range, 400.0 * 2f32.sqrt(), epsilon = 1e-2);
    }

    #[test]
    fn test_ground_plane_beyond_range() {
        let config = MapConfig {
            max_mapping_range_mm: 500.0,
            ..MapConfig::fine()
        };
        let grid = DistributedGrid::new(config);
        let origin = WorldPoint::new(0.0, 0.0, 400.0);
        let shallow = WorldPoint::new(0.0, 1.0, -0.1);
        assert!(
            grid.probe_range(&origin, &shallow, &Lineage::committed_only(), true)
                .is_none()
        );
    }

    #[test]
    fn test_probe_view_dimensions() {
        let grid = DistributedGrid::new(MapConfig::fine());
        let pose = Pose3D::new(0.0, 0.0, 400.0, 0.0, -0.5, 0.0);
        let view = grid.probe_view(&pose, 60.0, 64, 48, 5, 3000.0, &Lineage::committed_only());
        assert_eq!(view.cols, 13);
        assert_eq!(view.rows, 10);
        assert_eq!(view.ranges.len(), 130);
        // Camera tilted at the floor sees the ground plane
        assert!(view.detections() > 0);
    }

    #[test]
    fn test_pixel_direction_centre() {
        let d = pixel_direction(32.0, 24.0, 64, 48, 50.0);
        assert_relative_eq!(d.x, 0.0);
        assert_relative_eq!(d.y, 1.0);
        assert_relative_eq!(d.z, 0.0);
        let up = pixel_direction(32.0, 0.0, 64, 48, 50.0);
        assert!(up.z > 0.0);
    }
}
