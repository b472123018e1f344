//! Core types for the DrishtiSLAM library.
//!
//! All coordinates are in millimetres, all angles in radians:
//! - **X-axis**: right of the robot at pan 0
//! - **Y-axis**: forward at pan 0
//! - **Z-axis**: up, with the ground plane at z = 0
//!
//! ## Type Categories
//!
//! ### Coordinates
//! - [`GridCoord`]: Integer cell indices for the 3D grid
//! - [`WorldPoint`]: Floating-point world coordinates (also used as vectors)
//!
//! ### Orientation
//! - [`Pose3D`]: Position plus pan, tilt and roll
//! - [`Rotation3`]: Rotation as the images of the local axes
//!
//! ### Probability
//! - [`create_gaussian_lookup`] / [`create_half_gaussian_lookup`]: range
//!   uncertainty tables
//! - [`NoiseGenerator`]: seeded Gaussian sampler
//!
//! ### Ancestry
//! - [`Arena`] / [`Handle`]: generational storage for map nodes and paths
//! - [`PathId`] / [`Lineage`]: identity and map view of one hypothesis

mod arena;
mod lineage;
pub mod math;
mod point;
mod pose;
mod probability;

pub use arena::{Arena, Handle};
pub use lineage::{Lineage, PathId};
pub use math::{angle_diff, deg_to_rad, log_odds_to_probability, logit, normalize_angle};
pub use point::{GridCoord, WorldPoint};
pub use pose::{Pose3D, Rotation3};
pub use probability::{NoiseGenerator, create_gaussian_lookup, create_half_gaussian_lookup};
