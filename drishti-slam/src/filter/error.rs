//! Particle filter errors.

use thiserror::Error;

use super::particle_filter::CyclePhase;

/// Phase-order violations in the predict / fuse / score / resample cycle.
///
/// All variants are recoverable: the filter state is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Resampling attempted before every particle was scored.
    #[error("Incomplete scoring: {scored} of {total} particles scored")]
    IncompleteScoring {
        /// Particles with a score this cycle
        scored: usize,
        /// Population size
        total: usize,
    },

    /// Operation called in the wrong phase.
    #[error("{operation} not allowed in phase {phase:?}")]
    InvalidPhase {
        /// Operation attempted
        operation: &'static str,
        /// Phase the filter was in
        phase: CyclePhase,
    },

    /// Particle index out of range.
    #[error("Unknown particle {index} (population {total})")]
    UnknownParticle {
        /// Requested index
        index: usize,
        /// Population size
        total: usize,
    },

    /// Score is NaN or infinite.
    #[error("Non-finite score for particle {index}")]
    InvalidScore {
        /// Particle index
        index: usize,
    },
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
