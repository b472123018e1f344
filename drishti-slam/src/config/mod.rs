//! Unified configuration loading for DrishtiSLAM.
//!
//! Loads all configuration from a single YAML file with sensible defaults.
//! Every field is optional.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drishti_slam::config::DrishtiConfig;
//!
//! let config = DrishtiConfig::load_or_default(Path::new("configs/drishti.yaml"));
//!
//! // Convert to runtime configs
//! let grid = DistributedGrid::new(config.to_map_config());
//! let filter = ParticleFilter::new(config.to_filter_config(), start_pose);
//! ```
//!
//! ## Configuration Sections
//!
//! | Section | Description |
//! |---------|-------------|
//! | [`MapSection`] | Grid dimensions, cell size, evidence weighting |
//! | [`SensorSection`] | Stereo heads and sensor model |
//! | [`FilterSection`] | Population, reseeding, motion noise |
//! | [`PersistenceSection`] | Ray model and output directories |
//!
//! ## Example YAML
//!
//! ```yaml
//! map:
//!   dimension_cells: 256
//!   cell_size_mm: 30.0
//!   vacancy_weighting: 0.5
//!
//! sensor:
//!   heads:
//!     - baseline_mm: 100.0
//!       fov_degrees: 65.0
//!       offset_z_mm: 400.0
//!       tilt_degrees: -10.0
//!
//! filter:
//!   num_particles: 100
//!   motion:
//!     alpha1: 0.01
//! ```

mod defaults;
mod drishti;
mod error;
mod filter;
mod map;
mod persistence;
mod sensor;

// Re-export main types
pub use drishti::DrishtiConfig;
pub use error::ConfigLoadError;

// Re-export section types
pub use filter::FilterSection;
pub use map::MapSection;
pub use persistence::PersistenceSection;
pub use sensor::{HeadSettings, ModelSettings, SensorSection};
