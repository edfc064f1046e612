//! Bounded ring of recent fixes.

use std::collections::VecDeque;

use crate::domain::estimate::HistoryEntry;

/// A sliding window over the most recent fixes, newest first.
///
/// Insertion is O(1) amortized; once the ring is full the oldest entry is
/// dropped. Entries are never mutated in place, and [`HistoryRing::snapshot`]
/// hands out an owned copy so callers can never observe a partial write.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRing {
    /// Ring holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a fix at the front, evicting the oldest once full.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Owned copy of the window, newest first.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fix has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
