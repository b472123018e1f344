//! Distributed 3D occupancy grid.
//!
//! One grid is shared by every trajectory hypothesis. Evidence is stored as
//! per-hypothesis entries so divergent map states coexist without copies;
//! each hypothesis reads through its [`Lineage`](crate::core::Lineage).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 EvidenceRay / wall segment               │
//! └─────────────────────────────┬────────────────────────────┘
//!                               ▼
//!               ┌───────────────────────────────┐
//!               │ raycaster (voxel / Bresenham) │
//!               └───────────────┬───────────────┘
//!                               ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ DistributedGrid                                          │
//! │   per-cell history: [(path id, node)]   committed layer  │
//! │   Arena<AncestryNode>                                    │
//! └─────────────┬──────────────────────────────┬─────────────┘
//!               ▼                              ▼
//!        probe_range / probe_view          render
//! ```
//!
//! ## Log-Odds Model
//!
//! ```text
//! occupied:  L += logit(0.5 + (p - 0.5) * w)     w = uncertainty weight
//! vacant:    L += vacancy_weighting * logit(1 - p)
//! L clamped to [log_odds_min, log_odds_max]
//! ```

mod config;
mod distributed;
mod probe;
pub mod raycaster;
mod render;

pub use config::MapConfig;
pub use distributed::{AncestryNode, DistributedGrid, GridStats, WALL_COLOUR, WALL_PROBABILITY};
pub use probe::{RangeImage, pixel_direction};
pub use render::UNKNOWN_GREY;
