//! Core domain types: grid geometry and location estimates.

pub mod estimate;
pub mod grid;

pub use estimate::{HistoryEntry, LocationEstimate, RankedEstimates};
pub use grid::{GridCell, GridSpec};
