//! Location estimates produced by the classification pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One classified location with its confidence.
///
/// Immutable once constructed; a new reading produces a new instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEstimate {
    /// Grid-cell label, e.g. `"C13"`.
    pub label: String,
    /// Classifier probability in `[0, 1]`.
    pub probability: f64,
    /// When the reading was classified.
    pub timestamp: DateTime<Utc>,
}

impl LocationEstimate {
    /// Create an estimate stamped with the current time.
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
            timestamp: Utc::now(),
        }
    }
}

/// The K most probable locations for one reading, strictly descending by
/// probability with ties resolved in ascending label order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedEstimates {
    entries: Vec<LocationEstimate>,
}

impl RankedEstimates {
    /// Wrap an already-ordered list of estimates.
    ///
    /// Callers are responsible for the ordering invariant; the top-K
    /// selector is the only production constructor.
    pub fn from_ordered(entries: Vec<LocationEstimate>) -> Self {
        Self { entries }
    }

    /// The most probable estimate, if any.
    pub fn top(&self) -> Option<&LocationEstimate> {
        self.entries.first()
    }

    /// All entries, most probable first.
    pub fn entries(&self) -> &[LocationEstimate] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no reading has produced any estimate.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single persisted fix: when, where, and how confident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the fix was recorded.
    pub timestamp: DateTime<Utc>,
    /// Top-1 label at that time.
    pub label: String,
    /// Top-1 probability at that time.
    pub probability: f64,
}

impl From<&LocationEstimate> for HistoryEntry {
    fn from(estimate: &LocationEstimate) -> Self {
        Self {
            timestamp: estimate.timestamp,
            label: estimate.label.clone(),
            probability: estimate.probability,
        }
    }
}
