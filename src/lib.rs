//! # wifi-locate
//!
//! Real-time indoor localization from WiFi received-signal-strength readings.
//!
//! A device submits a vector of RSSI measurements (one per known access
//! point); the server normalizes the vector, scores it against a pre-trained
//! location classifier, selects the top-K most probable grid cells, smooths
//! the position estimate over time with a per-axis Kalman filter, and pushes
//! every distinct estimate to connected observers over a change-driven
//! stream. A bounded ring of recent fixes is periodically persisted to CSV.
//!
//! ## Architecture
//!
//! ```text
//! raw RSSI ──► SignalNormalizer ──► LocationClassifier ──► top-K
//!                                                            │
//!                      ┌─────────────────────────────────────┤
//!                      ▼                                     ▼
//!               TemporalEstimator                     PositionRegister
//!               (smoothed cell)                    (raw top-K + version)
//!                      │                                     │
//!                      ▼                                     ▼
//!                RoutePlanner                        SSE observers /
//!                                                    history snapshot
//! ```
//!
//! The raw classification ("what was classified") and the smoothed position
//! ("what we believe the true position is") are kept as two distinct values:
//! the register broadcasts the raw top-K, while route planning reads the
//! smoothed cell.

pub mod api;
pub mod config;
pub mod domain;
pub mod history;
pub mod pipeline;
pub mod snapshot;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use domain::{
    estimate::{HistoryEntry, LocationEstimate, RankedEstimates},
    grid::{GridCell, GridSpec},
};
pub use history::HistoryRing;
pub use pipeline::{
    classifier::{CentroidClassifier, LocationClassifier},
    normalizer::SignalNormalizer,
    route::{plan, Direction},
    smoothing::{SmoothingConfig, TemporalEstimator},
    LocatePipeline,
};
pub use state::{PositionRegister, StateSnapshot};

use thiserror::Error;

/// Common result type for localization operations.
pub type Result<T> = std::result::Result<T, LocateError>;

/// Unified error type for the localization pipeline.
///
/// Every per-request failure is one of these variants; they are recovered at
/// the request boundary and never corrupt the shared register or the history
/// ring. Startup failures use [`ConfigError`] instead and abort the process.
#[derive(Debug, Error)]
pub enum LocateError {
    /// Input signal vector has the wrong dimensionality.
    #[error("expected a signal vector of length {expected}, received {received}")]
    Shape { expected: usize, received: usize },

    /// Classifier contract violated (wrong feature dimensionality or a
    /// malformed probability distribution). Fatal to the request, not the
    /// process.
    #[error("classifier contract violated: {0}")]
    Inference(String),

    /// A location label could not be mapped to a grid cell.
    #[error("cannot decode location label {label:?}: {reason}")]
    Decode { label: String, reason: String },

    /// A route was requested against a cell outside the known grid.
    #[error("location {label:?} lies outside the {rows}x{cols} grid")]
    InvalidLocation { label: String, rows: i32, cols: i32 },

    /// A route was requested before any classification has occurred.
    #[error("no location estimate available yet")]
    NoEstimate,
}
