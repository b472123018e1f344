//! Map configuration section.

use serde::{Deserialize, Serialize};

use crate::grid::MapConfig;

use super::defaults;

/// Map configuration section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSection {
    /// Horizontal size (cells)
    #[serde(default = "defaults::dimension_cells")]
    pub dimension_cells: usize,

    /// Vertical size (cells)
    #[serde(default = "defaults::dimension_cells_vertical")]
    pub dimension_cells_vertical: usize,

    /// Cell edge length (mm)
    #[serde(default = "defaults::cell_size_mm")]
    pub cell_size_mm: f32,

    /// Grid centre X (mm)
    #[serde(default)]
    pub centre_x_mm: f32,

    /// Grid centre Y (mm)
    #[serde(default)]
    pub centre_y_mm: f32,

    /// Scoring radius around the robot (mm)
    #[serde(default = "defaults::localisation_radius_mm")]
    pub localisation_radius_mm: f32,

    /// Longest ray inserted or probed (mm)
    #[serde(default = "defaults::max_mapping_range_mm")]
    pub max_mapping_range_mm: f32,

    /// Scale of vacancy evidence (0..1)
    #[serde(default = "defaults::vacancy_weighting")]
    pub vacancy_weighting: f32,

    /// Probe hit threshold (probability)
    #[serde(default = "defaults::detection_threshold")]
    pub detection_threshold: f32,

    /// Lower log-odds clamp
    #[serde(default = "defaults::log_odds_min")]
    pub log_odds_min: f32,

    /// Upper log-odds clamp
    #[serde(default = "defaults::log_odds_max")]
    pub log_odds_max: f32,

    /// Entries in the positional uncertainty table
    #[serde(default = "defaults::uncertainty_table_size")]
    pub uncertainty_table_size: usize,
}

impl Default for MapSection {
    fn default() -> Self {
        Self::from(&MapConfig::default())
    }
}

impl From<&MapConfig> for MapSection {
    fn from(config: &MapConfig) -> Self {
        Self {
            dimension_cells: config.dimension_cells,
            dimension_cells_vertical: config.dimension_cells_vertical,
            cell_size_mm: config.cell_size_mm,
            centre_x_mm: config.centre_x_mm,
            centre_y_mm: config.centre_y_mm,
            localisation_radius_mm: config.localisation_radius_mm,
            max_mapping_range_mm: config.max_mapping_range_mm,
            vacancy_weighting: config.vacancy_weighting,
            detection_threshold: config.detection_threshold,
            log_odds_min: config.log_odds_min,
            log_odds_max: config.log_odds_max,
            uncertainty_table_size: config.uncertainty_table_size,
        }
    }
}

impl MapSection {
    /// Convert to MapConfig
    pub fn to_map_config(&self) -> MapConfig {
        MapConfig {
            dimension_cells: self.dimension_cells,
            dimension_cells_vertical: self.dimension_cells_vertical,
            cell_size_mm: self.cell_size_mm,
            centre_x_mm: self.centre_x_mm,
            centre_y_mm: self.centre_y_mm,
            localisation_radius_mm: self.localisation_radius_mm,
            max_mapping_range_mm: self.max_mapping_range_mm,
            vacancy_weighting: self.vacancy_weighting.clamp(0.0, 1.0),
            detection_threshold: self.detection_threshold,
            log_odds_min: self.log_odds_min,
            log_odds_max: self.log_odds_max,
            uncertainty_table_size: self.uncertainty_table_size,
        }
    }

    /// Check values that would make the grid unusable.
    pub fn validate(&self) -> Result<(), String> {
        if self.dimension_cells == 0 || self.dimension_cells_vertical == 0 {
            return Err("map dimensions must be positive".to_string());
        }
        if self.cell_size_mm.is_nan() || self.cell_size_mm <= 0.0 {
            return Err(format!("cell_size_mm {} must be positive", self.cell_size_mm));
        }
        let grid = self.to_map_config();
        if !grid.is_indexable() {
            return Err(format!(
                "map of {} cells exceeds the u32 cell index range",
                grid.total_cells()
            ));
        }
        if self.log_odds_min >= self.log_odds_max {
            return Err("log_odds_min must be below log_odds_max".to_string());
        }
        Ok(())
    }
}
