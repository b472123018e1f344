//! Configuration types for the distributed occupancy grid.

use serde::{Deserialize, Serialize};

use crate::core::{GridCoord, WorldPoint, logit};

/// Map configuration.
///
/// The grid is a cube of `dimension_cells × dimension_cells` horizontal cells
/// centred on (`centre_x_mm`, `centre_y_mm`), and `dimension_cells_vertical`
/// layers starting at the ground plane (z = 0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Horizontal size in cells (both x and y)
    pub dimension_cells: usize,

    /// Vertical size in cells
    pub dimension_cells_vertical: usize,

    /// Cell edge length (mm)
    pub cell_size_mm: f32,

    /// World x of the grid centre (mm)
    pub centre_x_mm: f32,

    /// World y of the grid centre (mm)
    pub centre_y_mm: f32,

    /// Only map cells within this radius of the robot take part in scoring (mm)
    pub localisation_radius_mm: f32,

    /// Rays longer than this are not inserted, probes stop here (mm)
    pub max_mapping_range_mm: f32,

    /// Scale applied to vacancy evidence, in 0..1.
    /// Lower values trust occupied evidence more than vacant evidence.
    pub vacancy_weighting: f32,

    /// Occupancy probability above which a probe reports a hit
    pub detection_threshold: f32,

    /// Lower clamp for accumulated log-odds
    pub log_odds_min: f32,

    /// Upper clamp for accumulated log-odds
    pub log_odds_max: f32,

    /// Entries in the range-uncertainty Gaussian table
    pub uncertainty_table_size: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            dimension_cells: 256,       // 7.68m at 30mm
            dimension_cells_vertical: 64, // 1.92m
            cell_size_mm: 30.0,
            centre_x_mm: 0.0,
            centre_y_mm: 0.0,
            localisation_radius_mm: 3000.0,
            max_mapping_range_mm: 4000.0,
            vacancy_weighting: 0.5,
            detection_threshold: 0.6,
            log_odds_min: -4.0,
            log_odds_max: 4.0,
            uncertainty_table_size: 8,
        }
    }
}

impl MapConfig {
    /// Configuration for a room of the given footprint and height (mm).
    pub fn for_room(size_mm: f32, height_mm: f32, cell_size_mm: f32) -> Self {
        Self {
            dimension_cells: (size_mm / cell_size_mm).ceil() as usize,
            dimension_cells_vertical: (height_mm / cell_size_mm).ceil() as usize,
            cell_size_mm,
            ..Default::default()
        }
    }

    /// Fine cells for small test environments.
    pub fn fine() -> Self {
        Self {
            dimension_cells: 200,
            dimension_cells_vertical: 40,
            cell_size_mm: 20.0,
            ..Default::default()
        }
    }

    /// World position of the minimum corner of cell (0, 0, 0).
    pub fn origin(&self) -> WorldPoint {
        let half = self.dimension_cells as f32 * self.cell_size_mm / 2.0;
        WorldPoint::new(self.centre_x_mm - half, self.centre_y_mm - half, 0.0)
    }

    /// Grid dimensions as (x, y, z) cell counts.
    pub fn dimensions(&self) -> [i32; 3] {
        [
            self.dimension_cells as i32,
            self.dimension_cells as i32,
            self.dimension_cells_vertical as i32,
        ]
    }

    /// Total number of cells, saturating at `u64::MAX`.
    pub fn total_cells(&self) -> u64 {
        let n = self.dimension_cells as u64;
        n.saturating_mul(n)
            .saturating_mul(self.dimension_cells_vertical as u64)
    }

    /// True if every cell has a distinct `u32` index.
    pub fn is_indexable(&self) -> bool {
        self.total_cells() <= u32::MAX as u64 + 1
    }

    /// Cell containing a world point (may be out of bounds).
    #[inline]
    pub fn world_to_grid(&self, point: &WorldPoint) -> GridCoord {
        let origin = self.origin();
        GridCoord::new(
            ((point.x - origin.x) / self.cell_size_mm).floor() as i32,
            ((point.y - origin.y) / self.cell_size_mm).floor() as i32,
            ((point.z - origin.z) / self.cell_size_mm).floor() as i32,
        )
    }

    /// World position of a cell centre.
    #[inline]
    pub fn grid_to_world(&self, coord: &GridCoord) -> WorldPoint {
        let origin = self.origin();
        let half = self.cell_size_mm * 0.5;
        WorldPoint::new(
            origin.x + coord.x as f32 * self.cell_size_mm + half,
            origin.y + coord.y as f32 * self.cell_size_mm + half,
            origin.z + coord.z as f32 * self.cell_size_mm + half,
        )
    }

    /// True if the cell lies inside the grid.
    #[inline]
    pub fn contains(&self, coord: &GridCoord) -> bool {
        let [dx, dy, dz] = self.dimensions();
        coord.x >= 0 && coord.x < dx && coord.y >= 0 && coord.y < dy && coord.z >= 0 && coord.z < dz
    }

    /// Linear index of an in-bounds cell.
    #[inline]
    pub fn cell_index(&self, coord: &GridCoord) -> Option<u32> {
        if !self.contains(coord) {
            return None;
        }
        let n = self.dimension_cells;
        let idx = (coord.z as u64 * n as u64 + coord.y as u64) * n as u64 + coord.x as u64;
        u32::try_from(idx).ok()
    }

    /// Inverse of [`cell_index`](Self::cell_index).
    #[inline]
    pub fn index_to_coord(&self, index: u32) -> GridCoord {
        let n = self.dimension_cells;
        let idx = index as usize;
        GridCoord::new(
            (idx % n) as i32,
            ((idx / n) % n) as i32,
            (idx / (n * n)) as i32,
        )
    }

    /// Log-odds added by one vacancy observation of a ray with end
    /// probability `probability`.
    #[inline]
    pub fn vacancy_delta(&self, probability: f32) -> f32 {
        self.vacancy_weighting.clamp(0.0, 1.0) * logit(1.0 - probability)
    }

    /// Log-odds added by one occupancy observation, weighted by the
    /// normalized uncertainty table value `weight` (0..1).
    #[inline]
    pub fn occupancy_delta(&self, probability: f32, weight: f32) -> f32 {
        logit(0.5 + (probability - 0.5) * weight.clamp(0.0, 1.0))
    }

    /// Clamp accumulated log-odds to the configured range.
    #[inline]
    pub fn clamp_log_odds(&self, log_odds: f32) -> f32 {
        log_odds.clamp(self.log_odds_min, self.log_odds_max)
    }
}
