//! Test utilities for DrishtiSLAM integration tests.
//!
//! Synthetic worlds built from committed wall segments, and a scorer that
//! ignores the observation.

#![allow(dead_code)]

use drishti_slam::filter::{Hypothesis, HypothesisScorer};
use drishti_slam::{DistributedGrid, Lineage, MapConfig, WorldPoint};

/// Half extents of the standard test room (mm).
pub const ROOM_HALF_X: f32 = 600.0;
pub const ROOM_HALF_Y: f32 = 1000.0;

/// Wall height of the standard test room (mm).
pub const WALL_HEIGHT: f32 = 700.0;

/// Initialize logging once; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Small fine-grained map (±2000mm, 800mm tall, 20mm cells).
pub fn fine_grid() -> DistributedGrid {
    DistributedGrid::new(MapConfig::fine())
}

/// Insert a committed wall segment.
pub fn add_wall(grid: &mut DistributedGrid, from: (f32, f32), to: (f32, f32), height: f32) -> usize {
    grid.insert_wall(
        &WorldPoint::new(from.0, from.1, 0.0),
        &WorldPoint::new(to.0, to.1, 0.0),
        height,
        &Lineage::committed_only(),
    )
}

/// Rectangular room centred on the origin with walls at x = ±`half_x` and
/// y = ±`half_y`.
pub fn rectangular_room(half_x: f32, half_y: f32, height: f32) -> DistributedGrid {
    let mut grid = fine_grid();
    let corners = [
        (-half_x, -half_y),
        (half_x, -half_y),
        (half_x, half_y),
        (-half_x, half_y),
    ];
    for i in 0..4 {
        add_wall(&mut grid, corners[i], corners[(i + 1) % 4], height);
    }
    grid
}

/// The standard test room: 1200mm × 2000mm, 700mm tall.
pub fn standard_room() -> DistributedGrid {
    rectangular_room(ROOM_HALF_X, ROOM_HALF_Y, WALL_HEIGHT)
}

/// Scorer that rates every hypothesis equally.
pub struct UniformScorer;

impl HypothesisScorer for UniformScorer {
    fn log_likelihood(&self, _hypothesis: &Hypothesis<'_>) -> f32 {
        0.0
    }
}
