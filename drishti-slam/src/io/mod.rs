//! Artifact persistence and export.
//!
//! - **Ray model format**: versioned little-endian binary for
//!   [`RayModelLookup`](crate::sensor::RayModelLookup) tables
//! - **PPM export**: top-down map renderings
//!
//! ## Saving and Loading Ray Models
//!
//! ```rust,ignore
//! use drishti_slam::io::{save_ray_model, load_ray_model};
//! use std::path::Path;
//!
//! save_ray_model(&lookup, Path::new("head0.dray"))?;
//! let lookup = load_ray_model(Path::new("head0.dray"))?;
//! ```
//!
//! ## Rendering
//!
//! ```rust,ignore
//! let rgb = grid.render(&lineage, 512, 512);
//! export_ppm(&rgb, 512, 512, Path::new("map.ppm"))?;
//! ```

pub mod ppm;
pub mod ray_model_format;

pub use ppm::{export_ppm, write_ppm};
pub use ray_model_format::{
    IoError, load_ray_model, read_ray_model, save_ray_model, write_ray_model,
};
