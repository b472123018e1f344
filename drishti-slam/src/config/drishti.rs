//! Main DrishtiConfig and conversion methods.

use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::filter::ParticleFilterConfig;
use crate::grid::MapConfig;
use crate::sensor::{SensorModelConfig, StereoHead};

use super::error::ConfigLoadError;
use super::filter::FilterSection;
use super::map::MapSection;
use super::persistence::PersistenceSection;
use super::sensor::SensorSection;

/// Full DrishtiSLAM configuration loaded from YAML
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct DrishtiConfig {
    /// Map settings
    #[serde(default)]
    pub map: MapSection,

    /// Stereo heads and sensor model
    #[serde(default)]
    pub sensor: SensorSection,

    /// Particle filter settings
    #[serde(default)]
    pub filter: FilterSection,

    /// Artifact and output locations
    #[serde(default)]
    pub persistence: PersistenceSection,
}

impl DrishtiConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Load from `path`, falling back to defaults with a warning when the
    /// file is missing or malformed
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "[Config] {} unusable ({}), using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))?;
        config.map.validate().map_err(ConfigLoadError::Invalid)?;
        Ok(config)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        serde_yaml::to_string(self).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Convert to MapConfig for DistributedGrid
    pub fn to_map_config(&self) -> MapConfig {
        self.map.to_map_config()
    }

    /// Get the stereo sensor model config
    pub fn sensor_model_config(&self) -> SensorModelConfig {
        self.sensor.model.to_sensor_model_config()
    }

    /// Get the stereo heads
    pub fn heads(&self) -> Vec<StereoHead> {
        self.sensor.to_heads()
    }

    /// Convert to ParticleFilterConfig
    pub fn to_filter_config(&self) -> ParticleFilterConfig {
        let f = &self.filter;
        ParticleFilterConfig {
            num_particles: f.num_particles,
            seed: f.seed,
            collapse_threshold: f.collapse_threshold,
            collapse_cycles: f.collapse_cycles,
            reseed_fraction: f.reseed_fraction,
            reseed_spread_mm: f.reseed_spread_mm,
            reseed_spread_rad: f.reseed_spread_rad,
            motion: f.motion,
            sensor: self.sensor_model_config(),
            heads: self.heads(),
        }
    }
}
