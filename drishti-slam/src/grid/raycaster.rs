//! Ray traversal through the 3D grid.
//!
//! Two algorithms are used:
//!
//! ### Voxel traversal (Amanatides & Woo)
//!
//! Visits every cell a continuous ray passes through, in order, together
//! with the distances at which the ray enters and leaves the cell. Used for
//! evidence rays and range probes where per-cell distance matters.
//!
//! ```text
//! origin ●──┬────┬────┬────┬──▶
//!           t0   t1   t2   t3
//! ```
//!
//! ### Bresenham line
//!
//! Integer-only 2D line used to rasterize wall segments layer by layer:
//!
//! ```text
//! From (0,0) to (7,3):
//!
//!     3 │        ●
//!     2 │     ●●
//!     1 │  ●●
//!     0 ●●
//!       └──────────
//!        0 1 2 3 4 5 6 7
//! ```

use crate::core::{GridCoord, WorldPoint};

use super::MapConfig;

/// One cell visited by a [`VoxelTraversal`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelStep {
    /// Cell coordinate
    pub coord: GridCoord,
    /// Distance along the ray where the cell is entered (mm)
    pub t_enter: f32,
    /// Distance along the ray where the cell is left (mm)
    pub t_exit: f32,
}

impl VoxelStep {
    /// Distance to the midpoint of the ray's passage through the cell.
    #[inline]
    pub fn t_mid(&self) -> f32 {
        0.5 * (self.t_enter + self.t_exit)
    }
}

/// Amanatides-Woo voxel traversal clipped to the grid bounds.
pub struct VoxelTraversal {
    coord: GridCoord,
    step: [i32; 3],
    t_max: [f32; 3],
    t_delta: [f32; 3],
    t_enter: f32,
    t_end: f32,
    dims: [i32; 3],
    done: bool,
}

impl VoxelTraversal {
    /// Traverse from `origin` along the unit vector `direction` for at most
    /// `max_distance` mm.
    ///
    /// Origins outside the grid are supported: traversal starts where the
    /// ray enters the grid volume.
    pub fn new(
        config: &MapConfig,
        origin: &WorldPoint,
        direction: &WorldPoint,
        max_distance: f32,
    ) -> Self {
        let grid_origin = config.origin();
        let cell = config.cell_size_mm;
        let dims = config.dimensions();

        let o = [origin.x, origin.y, origin.z];
        let d = [direction.x, direction.y, direction.z];
        let lo = [grid_origin.x, grid_origin.y, grid_origin.z];

        let mut empty = Self {
            coord: GridCoord::default(),
            step: [0; 3],
            t_max: [f32::INFINITY; 3],
            t_delta: [f32::INFINITY; 3],
            t_enter: 0.0,
            t_end: 0.0,
            dims,
            done: true,
        };

        if !origin.is_finite() || !direction.is_finite() || max_distance.is_nan() || max_distance <= 0.0
        {
            return empty;
        }

        // Slab clipping against the grid box
        let mut t0 = 0.0f32;
        let mut t1 = max_distance;
        for axis in 0..3 {
            let hi = lo[axis] + dims[axis] as f32 * cell;
            if d[axis].abs() < 1e-9 {
                if o[axis] < lo[axis] || o[axis] >= hi {
                    return empty;
                }
                continue;
            }
            let inv = 1.0 / d[axis];
            let (mut ta, mut tb) = ((lo[axis] - o[axis]) * inv, (hi - o[axis]) * inv);
            if ta > tb {
                std::mem::swap(&mut ta, &mut tb);
            }
            t0 = t0.max(ta);
            t1 = t1.min(tb);
        }
        if t0 >= t1 {
            return empty;
        }

        // Starting cell, nudged inside so boundary origins pick the right cell
        let nudge = (cell * 1e-4).min((t1 - t0) * 0.5);
        let start = [
            o[0] + d[0] * (t0 + nudge),
            o[1] + d[1] * (t0 + nudge),
            o[2] + d[2] * (t0 + nudge),
        ];
        let mut c = [0i32; 3];
        let mut step = [0i32; 3];
        let mut t_max = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];
        for axis in 0..3 {
            c[axis] = (((start[axis] - lo[axis]) / cell).floor() as i32).clamp(0, dims[axis] - 1);
            if d[axis] > 1e-9 {
                step[axis] = 1;
                t_delta[axis] = cell / d[axis];
                let boundary = lo[axis] + (c[axis] + 1) as f32 * cell;
                t_max[axis] = (boundary - o[axis]) / d[axis];
            } else if d[axis] < -1e-9 {
                step[axis] = -1;
                t_delta[axis] = -cell / d[axis];
                let boundary = lo[axis] + c[axis] as f32 * cell;
                t_max[axis] = (boundary - o[axis]) / d[axis];
            }
        }

        empty.coord = GridCoord::new(c[0], c[1], c[2]);
        empty.step = step;
        empty.t_max = t_max;
        empty.t_delta = t_delta;
        empty.t_enter = t0;
        empty.t_end = t1;
        empty.done = false;
        empty
    }
}

impl Iterator for VoxelTraversal {
    type Item = VoxelStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.t_enter >= self.t_end {
            return None;
        }

        // Axis whose boundary is crossed first
        let axis = if self.t_max[0] <= self.t_max[1] && self.t_max[0] <= self.t_max[2] {
            0
        } else if self.t_max[1] <= self.t_max[2] {
            1
        } else {
            2
        };

        let t_exit = self.t_max[axis].min(self.t_end);
        let result = VoxelStep {
            coord: self.coord,
            t_enter: self.t_enter,
            t_exit,
        };

        // Advance to the next cell
        self.t_enter = t_exit;
        self.t_max[axis] += self.t_delta[axis];
        match axis {
            0 => self.coord.x += self.step[0],
            1 => self.coord.y += self.step[1],
            _ => self.coord.z += self.step[2],
        }
        let c = [self.coord.x, self.coord.y, self.coord.z];
        if (0..3).any(|a| c[a] < 0 || c[a] >= self.dims[a]) {
            self.done = true;
        }

        Some(result)
    }
}

/// Bresenham's line algorithm iterator over (x, y) at a fixed layer.
pub struct BresenhamLine {
    x: i32,
    y: i32,
    z: i32,
    dx: i32,
    dy: i32,
    x_inc: i32,
    y_inc: i32,
    error: i32,
    steep: bool,
    end_x: i32,
    end_y: i32,
    done: bool,
}

impl BresenhamLine {
    /// Line between the (x, y) of two cells, emitted at `start.z`.
    pub fn new(start: GridCoord, end: GridCoord) -> Self {
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        let steep = dy > dx;

        let (x, y, end_x, end_y, dx, dy) = if steep {
            (start.y, start.x, end.y, end.x, dy, dx)
        } else {
            (start.x, start.y, end.x, end.y, dx, dy)
        };

        Self {
            x,
            y,
            z: start.z,
            dx,
            dy,
            x_inc: if end_x > x { 1 } else { -1 },
            y_inc: if end_y > y { 1 } else { -1 },
            error: dx / 2,
            steep,
            end_x,
            end_y,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = GridCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = if self.steep {
            GridCoord::new(self.y, self.x, self.z)
        } else {
            GridCoord::new(self.x, self.y, self.z)
        };

        if self.x == self.end_x && self.y == self.end_y {
            self.done = true;
            return Some(result);
        }

        self.error -= self.dy;
        if self.error < 0 {
            self.y += self.y_inc;
            self.error += self.dx;
        }
        self.x += self.x_inc;

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> MapConfig {
        MapConfig {
            dimension_cells: 10,
            dimension_cells_vertical: 4,
            cell_size_mm: 100.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_bresenham_steep() {
        let cells: Vec<_> =
            BresenhamLine::new(GridCoord::new(0, 0, 2), GridCoord::new(2, 5, 2)).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], GridCoord::new(0, 0, 2));
        assert_eq!(cells[5], GridCoord::new(2, 5, 2));
        assert!(cells.iter().all(|c| c.z == 2));
    }

    #[test]
    fn test_bresenham_single_cell() {
        let cells: Vec<_> =
            BresenhamLine::new(GridCoord::new(3, 3, 0), GridCoord::new(3, 3, 0)).collect();
        assert_eq!(cells, vec![GridCoord::new(3, 3, 0)]);
    }

    #[test]
    fn test_traversal_along_x() {
        // Grid spans -500..500 in x/y, 0..400 in z
        let config = config();
        let origin = WorldPoint::new(-450.0, 50.0, 150.0);
        let dir = WorldPoint::new(1.0, 0.0, 0.0);
        let steps: Vec<_> = VoxelTraversal::new(&config, &origin, &dir, 10_000.0).collect();

        assert_eq!(steps.len(), 10);
        assert_eq!(steps[0].coord, GridCoord::new(0, 5, 1));
        assert_relative_eq!(steps[0].t_enter, 0.0);
        assert_relative_eq!(steps[0].t_exit, 50.0, epsilon = 1e-3);
        assert_relative_eq!(steps[1].t_mid(), 100.0, epsilon = 1e-3);
        assert_eq!(steps[9].coord, GridCoord::new(9, 5, 1));
    }

    #[test]
    fn test_traversal_enters_from_outside() {
        let config = config();
        let origin = WorldPoint::new(-1000.0, 50.0, 150.0);
        let dir = WorldPoint::new(1.0, 0.0, 0.0);
        let first = VoxelTraversal::new(&config, &origin, &dir, 10_000.0).next().unwrap();
        assert_eq!(first.coord.x, 0);
        assert_relative_eq!(first.t_enter, 500.0, epsilon = 1e-3);
    }

    #[test]
    fn test_traversal_respects_max_distance() {
        let config = config();
        let origin = WorldPoint::new(0.0, 0.0, 50.0);
        let dir = WorldPoint::new(0.0, 1.0, 0.0);
        let steps: Vec<_> = VoxelTraversal::new(&config, &origin, &dir, 250.0).collect();
        assert_eq!(steps.len(), 3);
        assert_relative_eq!(steps[2].t_exit, 250.0, epsilon = 1e-3);
    }

    #[test]
    fn test_traversal_diagonal_is_connected() {
        let config = config();
        let origin = WorldPoint::new(-420.0, -380.0, 20.0);
        let dir = WorldPoint::new(1.0, 0.8, 0.3).normalize().unwrap();
        let steps: Vec<_> = VoxelTraversal::new(&config, &origin, &dir, 10_000.0).collect();
        assert!(steps.len() > 3);
        for pair in steps.windows(2) {
            let d = pair[1].coord - pair[0].coord;
            assert_eq!(d.x.abs() + d.y.abs() + d.z.abs(), 1);
            assert_relative_eq!(pair[0].t_exit, pair[1].t_enter);
        }
    }

    #[test]
    fn test_traversal_misses_grid() {
        let config = config();
        let origin = WorldPoint::new(-1000.0, 50.0, 150.0);
        let dir = WorldPoint::new(-1.0, 0.0, 0.0);
        assert_eq!(VoxelTraversal::new(&config, &origin, &dir, 10_000.0).count(), 0);
    }
}
