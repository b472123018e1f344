//! Particle filter over trajectory hypotheses.
//!
//! Each particle carries a trajectory hypothesis and, through its
//! [`Lineage`](crate::core::Lineage), its own version of the distributed
//! map. One cycle:
//!
//! 1. [`ParticleFilter::predict`]: spawn a child path node per particle
//! 2. [`ParticleFilter::fuse`]: insert stereo evidence authored by the child
//! 3. [`ParticleFilter::score`]: judge each particle against its parent's map
//! 4. [`ParticleFilter::resample`]: select survivors, prune dead paths,
//!    commit the shared trunk
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drishti_slam::filter::{MotionInput, Odometry, ParticleFilter, RangeResidualScorer};
//!
//! let mut filter = ParticleFilter::new(config, start_pose);
//! let scorer = RangeResidualScorer::new(Default::default(), 3000.0);
//!
//! filter.predict(&MotionInput::Odometry(Odometry::forward(100.0, 0.5)))?;
//! filter.fuse(&mut grid, &frames)?;
//! filter.score(&grid, &scorer)?;
//! let best = filter.resample(&mut grid)?;
//! ```

mod error;
mod motion_model;
mod particle_filter;
mod path;
mod scoring;

pub use error::{FilterError, Result};
pub use motion_model::{MotionInput, MotionModel, MotionModelConfig, Odometry};
pub use particle_filter::{
    BestHypothesis, CyclePhase, FilterState, Particle, ParticleFilter, ParticleFilterConfig,
};
pub use path::{PathNode, PathTree};
pub use scoring::{
    Hypothesis, HypothesisScorer, RangeResidualScorer, RangeScorerConfig, ReferencePoseScorer,
};
