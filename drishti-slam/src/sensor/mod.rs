//! Stereo sensor model.
//!
//! Turns calibrated stereo disparity features into world-frame
//! [`EvidenceRay`]s for the distributed grid.
//!
//! ## Pipeline
//!
//! ```text
//! StereoFeature (column, row, disparity)
//!        │  triangulate: depth = f·B / d
//!        ▼
//! camera-frame point ──▶ rotate (+ translate) by observer pose
//!        │
//!        ▼
//! EvidenceRay { start, end, probability, colour, uncertainty }
//! ```
//!
//! - [`stereo`]: disparity/distance conversion, calibration, head mounting
//! - [`StereoSensorModel`]: feature → evidence ray conversion
//! - [`RayModelLookup`]: precomputed (column, disparity) → range distribution
//! - [`simulation`]: synthetic features rendered from a map

mod observation;
mod ray_model;
pub mod simulation;
pub mod stereo;

pub use observation::{DEFAULT_COLOUR, EvidenceRay, SensorModelConfig, StereoSensorModel};
pub use ray_model::{RangeDistribution, RayModelLookup};
pub use simulation::{SyntheticStereo, synthesize_features};
pub use stereo::{
    StereoCalibration, StereoFeature, StereoFrame, StereoHead, disparity_to_distance,
    distance_to_disparity,
};
