//! Objective functions and per-point transform search.
//!
//! The search extremizes a dissimilarity objective over rigid-body and
//! strain degrees of freedom with a coarse-to-fine pattern search across a
//! volume pyramid. All objectives use a lower-is-better convention.

mod objective;
mod search;
mod transform;

pub use objective::{ObjectiveKind, score};
pub use search::{DofSchedule, SearchConfig, SearchOutcome, SearchStatus, search_point};
pub use transform::{DofCount, TransformParams};
