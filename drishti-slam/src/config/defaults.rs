//! Default value functions for serde deserialization.

pub fn dimension_cells() -> usize {
    256
}

pub fn dimension_cells_vertical() -> usize {
    64
}

pub fn cell_size_mm() -> f32 {
    30.0
}

pub fn localisation_radius_mm() -> f32 {
    3000.0
}

pub fn max_mapping_range_mm() -> f32 {
    4000.0
}

pub fn vacancy_weighting() -> f32 {
    0.5
}

pub fn detection_threshold() -> f32 {
    0.6
}

pub fn log_odds_min() -> f32 {
    -4.0
}

pub fn log_odds_max() -> f32 {
    4.0
}

pub fn uncertainty_table_size() -> usize {
    8
}

pub fn baseline_mm() -> f32 {
    100.0
}

pub fn fov_degrees() -> f32 {
    65.0
}

pub fn image_width() -> usize {
    320
}

pub fn image_height() -> usize {
    240
}

pub fn mount_height_mm() -> f32 {
    400.0
}

pub fn disparity_error_pixels() -> f32 {
    0.5
}

pub fn peak_probability() -> f32 {
    0.8
}

pub fn min_range_mm() -> f32 {
    100.0
}

pub fn range_bin_mm() -> f32 {
    20.0
}

pub fn max_disparity() -> u32 {
    64
}

pub fn column_group() -> u32 {
    8
}

pub fn num_particles() -> usize {
    100
}

pub fn collapse_threshold() -> f64 {
    0.1
}

pub fn collapse_cycles() -> usize {
    3
}

pub fn reseed_fraction() -> f32 {
    0.5
}

pub fn reseed_spread_mm() -> f32 {
    50.0
}

pub fn reseed_spread_rad() -> f32 {
    0.05
}

pub fn ray_model_dir() -> String {
    "./calibration".to_string()
}

pub fn output_dir() -> String {
    "./output".to_string()
}

pub fn render_size() -> usize {
    512
}
