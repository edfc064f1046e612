//! The process-wide position register and its change-driven broadcast.
//!
//! One [`PositionRegister`] is created at startup and shared (via `Arc`)
//! with every request task, every streaming observer, and the snapshot task.
//! All writes and reads go through a single lock held only long enough to
//! copy data in or out; observers are woken through a `tokio::sync::watch`
//! channel rather than polling.
//!
//! The watch channel gives exactly the required delivery semantics: each
//! observer sees versions in increasing order, is woken only when the
//! version advances, and a stalled observer skips intermediate versions and
//! picks up the latest. Change detection rides the version counter, never
//! payload equality; two distinct readings can legitimately produce an
//! identical label/probability pair.

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::domain::estimate::{HistoryEntry, RankedEstimates};
use crate::domain::grid::GridCell;
use crate::history::HistoryRing;
use crate::pipeline::smoothing::TemporalEstimator;

/// One published state of the register: the raw top-K of the latest accepted
/// reading plus the monotonically increasing version that produced it.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    /// 0 until the first reading is accepted, then +1 per accepted reading.
    pub version: u64,
    /// Raw (unsmoothed) ranked estimates of the latest reading.
    pub estimates: RankedEstimates,
}

struct Inner {
    version: u64,
    latest: RankedEstimates,
    estimator: TemporalEstimator,
    history: HistoryRing,
}

/// Shared "latest estimate" register.
pub struct PositionRegister {
    inner: Mutex<Inner>,
    tx: watch::Sender<StateSnapshot>,
}

impl PositionRegister {
    /// Create a register at version 0 with empty estimates.
    pub fn new(estimator: TemporalEstimator, history_capacity: usize) -> Self {
        let (tx, _) = watch::channel(StateSnapshot::default());
        Self {
            inner: Mutex::new(Inner {
                version: 0,
                latest: RankedEstimates::default(),
                estimator,
                history: HistoryRing::new(history_capacity),
            }),
            tx,
        }
    }

    /// Publish an accepted reading: advance the version, record the top-1 in
    /// the history ring, fold it into the smoothing filter, and wake all
    /// observers.
    ///
    /// Returns the new version. The lock is held only for the in-memory
    /// update and the (non-blocking) watch send; the send happens under the
    /// lock so that notification order always matches version order.
    pub fn publish(&self, ranked: RankedEstimates) -> u64 {
        let mut inner = self.inner.lock();
        inner.version += 1;

        if let Some(top) = ranked.top() {
            inner.history.push(HistoryEntry::from(top));
            let (label, probability) = (top.label.clone(), top.probability);
            if let Err(err) = inner.estimator.observe(&label, probability) {
                // Vocabulary labels are validated against the grid at
                // startup, so this indicates a misbehaving classifier; the
                // raw estimates are still published.
                tracing::warn!(%label, %err, "top-1 label rejected by smoothing filter");
            }
        }

        let version = inner.version;
        inner.latest = ranked.clone();
        self.tx.send_replace(StateSnapshot {
            version,
            estimates: ranked,
        });
        version
    }

    /// Copy of the latest published state.
    pub fn latest(&self) -> StateSnapshot {
        let inner = self.inner.lock();
        StateSnapshot {
            version: inner.version,
            estimates: inner.latest.clone(),
        }
    }

    /// Current version counter.
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    /// Smoothed position snapped to a grid cell, for route planning.
    ///
    /// `None` until the first reading has been accepted.
    pub fn smoothed_cell(&self) -> Option<GridCell> {
        self.inner.lock().estimator.cell()
    }

    /// Smoothed continuous (row, col) position.
    pub fn smoothed_position(&self) -> Option<(f64, f64)> {
        self.inner.lock().estimator.position()
    }

    /// Copy of the history ring, newest first.
    pub fn history_snapshot(&self) -> Vec<HistoryEntry> {
        self.inner.lock().history.snapshot()
    }

    /// Register an observer.
    ///
    /// The receiver's `changed()` future resolves once per version advance
    /// past the observer's last-seen state; dropping the receiver
    /// deregisters the observer immediately without blocking the writer.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.tx.subscribe()
    }

    /// Number of currently attached observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
