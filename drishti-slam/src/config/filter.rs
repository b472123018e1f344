//! Particle filter configuration section.

use serde::{Deserialize, Serialize};

use crate::filter::MotionModelConfig;

use super::defaults;

/// Particle filter configuration section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSection {
    /// Population size
    #[serde(default = "defaults::num_particles")]
    pub num_particles: usize,

    /// Random seed (0 = OS entropy)
    #[serde(default)]
    pub seed: u64,

    /// Neff / N below which a resample counts as collapsed
    #[serde(default = "defaults::collapse_threshold")]
    pub collapse_threshold: f64,

    /// Collapsed resamples in a row before reseeding
    #[serde(default = "defaults::collapse_cycles")]
    pub collapse_cycles: usize,

    /// Share of the population replaced on reseed
    #[serde(default = "defaults::reseed_fraction")]
    pub reseed_fraction: f32,

    /// Reseed position noise (mm)
    #[serde(default = "defaults::reseed_spread_mm")]
    pub reseed_spread_mm: f32,

    /// Reseed pan noise (rad)
    #[serde(default = "defaults::reseed_spread_rad")]
    pub reseed_spread_rad: f32,

    /// Motion model noise
    #[serde(default)]
    pub motion: MotionModelConfig,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            num_particles: defaults::num_particles(),
            seed: 0,
            collapse_threshold: defaults::collapse_threshold(),
            collapse_cycles: defaults::collapse_cycles(),
            reseed_fraction: defaults::reseed_fraction(),
            reseed_spread_mm: defaults::reseed_spread_mm(),
            reseed_spread_rad: defaults::reseed_spread_rad(),
            motion: MotionModelConfig::default(),
        }
    }
}
