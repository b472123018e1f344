//! # DrishtiSLAM
//!
//! Distributed particle SLAM over a versioned 3D occupancy grid built from
//! stereo disparity.
//!
//! ## Overview
//!
//! Many trajectory hypotheses share one map. Each hypothesis writes its
//! evidence as ancestry nodes tagged with its path id and reads the map
//! through its [`Lineage`]: its own writes, then its ancestors', then the
//! committed layer. No hypothesis ever copies the map.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     filter/                         │  ← Particle filter
//! │     (path tree, motion model, scoring, resample)    │
//! └─────────────────────────────────────────────────────┘
//!            │ evidence rays            │ probes
//! ┌──────────────────────┐   ┌──────────────────────────┐
//! │       sensor/        │──▶│          grid/           │  ← Distributed map
//! │ (stereo, ray model)  │   │ (ancestry, probe, render)│
//! └──────────────────────┘   └──────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │      (pose, arena, lineage, Gaussian tables)        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drishti_slam::{DistributedGrid, MapConfig, ParticleFilter, ParticleFilterConfig};
//! use drishti_slam::filter::{MotionInput, Odometry, RangeResidualScorer};
//!
//! let mut grid = DistributedGrid::new(MapConfig::default());
//! let mut filter = ParticleFilter::new(ParticleFilterConfig::default(), Pose3D::identity());
//! let scorer = RangeResidualScorer::new(Default::default(), 3000.0);
//!
//! filter.predict(&MotionInput::Odometry(Odometry::forward(100.0, 0.5)))?;
//! filter.fuse(&mut grid, &frames)?;
//! filter.score(&grid, &scorer)?;
//! let best = filter.resample(&mut grid)?;
//! ```
//!
//! ## Coordinate System
//!
//! - Units: millimetres and radians
//! - +Y forward at pan 0, +Z up, ground plane at z = 0
//! - Positive pan turns toward +X, positive tilt looks up

#![warn(missing_docs)]

// Core types
pub mod core;

// Distributed occupancy grid
pub mod grid;

// Stereo sensor model
pub mod sensor;

// Particle filter
pub mod filter;

// Unified configuration
pub mod config;

// Persistence (save/load/export)
pub mod io;

// Crate-level error
pub mod error;

// Re-export commonly used types
pub use crate::core::{GridCoord, Lineage, NoiseGenerator, PathId, Pose3D, WorldPoint};

pub use crate::grid::{DistributedGrid, GridStats, MapConfig, RangeImage};

pub use sensor::{
    EvidenceRay, RayModelLookup, SensorModelConfig, StereoCalibration, StereoFeature, StereoFrame,
    StereoHead, StereoSensorModel,
};

pub use filter::{
    BestHypothesis, CyclePhase, FilterError, FilterState, HypothesisScorer, MotionInput, Odometry,
    ParticleFilter, ParticleFilterConfig,
};

pub use config::{ConfigLoadError, DrishtiConfig};

pub use error::{Error, Result};
