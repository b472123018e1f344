//! Top-down diagnostic rendering.

use std::collections::HashMap;

use crate::core::Lineage;

use super::DistributedGrid;

/// Colour of columns with no evidence.
pub const UNKNOWN_GREY: u8 = 128;

#[derive(Default, Clone, Copy)]
struct Column {
    /// Highest occupied layer and its colour
    top: Option<(i32, [u8; 3])>,
    vacant: bool,
}

impl DistributedGrid {
    /// Render the map seen by `lineage` from above as a flat RGB buffer of
    /// `width × height × 3` bytes.
    ///
    /// Unknown columns are grey, vacant columns white, occupied columns take
    /// the evidence colour of their highest occupied cell, darker for lower
    /// cells. Row 0 is the maximum y edge of the grid.
    pub fn render(&self, lineage: &Lineage, width: usize, height: usize) -> Vec<u8> {
        let mut image = vec![UNKNOWN_GREY; width * height * 3];
        if width == 0 || height == 0 {
            return image;
        }

        let config = self.config();
        let threshold = config.detection_threshold;
        let layers = config.dimension_cells_vertical.max(1) as f32;

        let mut columns: HashMap<(i32, i32), Column> = HashMap::new();
        self.for_each_observed(lineage, |coord, node| {
            let column = columns.entry((coord.x, coord.y)).or_default();
            let p = node.probability();
            if p > threshold {
                if column.top.is_none_or(|(z, _)| coord.z > z) {
                    column.top = Some((coord.z, node.colour));
                }
            } else if p < 0.5 {
                column.vacant = true;
            }
        });

        let n = config.dimension_cells as f32;
        for py in 0..height {
            let gy = ((height - 1 - py) as f32 * n / height as f32) as i32;
            for px in 0..width {
                let gx = (px as f32 * n / width as f32) as i32;
                let Some(column) = columns.get(&(gx, gy)) else {
                    continue;
                };
                let rgb = match column.top {
                    Some((z, colour)) => {
                        let shade = 0.5 + 0.5 * (z as f32 + 1.0) / layers;
                        colour.map(|c| (c as f32 * shade.min(1.0)) as u8)
                    }
                    None if column.vacant => [255, 255, 255],
                    None => continue,
                };
                let i = (py * width + px) * 3;
                image[i..i + 3].copy_from_slice(&rgb);
            }
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GridCoord, WorldPoint};
    use crate::grid::MapConfig;
    use crate::sensor::EvidenceRay;

    #[test]
    fn test_render_size_and_unknown() {
        let grid = DistributedGrid::new(MapConfig::fine());
        let image = grid.render(&Lineage::committed_only(), 40, 30);
        assert_eq!(image.len(), 40 * 30 * 3);
        assert!(image.iter().all(|&b| b == UNKNOWN_GREY));
    }

    #[test]
    fn test_render_wall_and_vacancy() {
        let config = MapConfig::fine();
        let mut grid = DistributedGrid::new(config.clone());
        let lineage = Lineage::committed_only();
        let ray = EvidenceRay {
            start: WorldPoint::new(0.0, 0.0, 300.0),
            end: WorldPoint::new(0.0, 1010.0, 300.0),
            probability: 0.9,
            colour: [250, 0, 0],
            uncertainty_mm: 20.0,
        };
        grid.insert_ray(&ray, &lineage);

        // One pixel per cell
        let size = config.dimension_cells;
        let image = grid.render(&lineage, size, size);
        let pixel = |c: GridCoord| {
            let py = size - 1 - c.y as usize;
            let i = (py * size + c.x as usize) * 3;
            [image[i], image[i + 1], image[i + 2]]
        };

        let wall = config.world_to_grid(&ray.end);
        let free = config.world_to_grid(&WorldPoint::new(0.0, 500.0, 300.0));
        assert!(pixel(wall)[0] > 0 && pixel(wall)[1] == 0);
        assert_eq!(pixel(free), [255, 255, 255]);
        assert_eq!(pixel(GridCoord::new(5, 5, 0)), [UNKNOWN_GREY; 3]);
    }
}
