//! Periodic persistence of the history ring to a CSV file.
//!
//! The file is rewritten in full each period (it is a window, not a log):
//! a header row followed by at most `history_capacity` fixes, newest first.
//! The write goes to a temporary file that is renamed into place, so readers
//! see either the previous complete file or the new one, never a torn write.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::domain::estimate::HistoryEntry;
use crate::state::PositionRegister;

/// Write one complete snapshot file.
pub fn write_snapshot(path: &Path, entries: &[HistoryEntry]) -> csv::Result<()> {
    let tmp = path.with_extension("csv.tmp");

    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(["timestamp", "location", "probability"])?;
    for entry in entries {
        writer.write_record([
            entry.timestamp.to_rfc3339(),
            entry.label.clone(),
            format!("{:.6}", entry.probability),
        ])?;
    }
    writer.flush()?;
    drop(writer);

    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Background task: every `period`, copy the ring and rewrite the file.
///
/// The register lock is held only for the copy; the file I/O runs on the
/// blocking pool. Write failures are logged and the task keeps going; a
/// transient disk problem must not take down the estimation pipeline.
pub async fn run_snapshot_task(
    register: Arc<PositionRegister>,
    path: PathBuf,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let entries = register.history_snapshot();
        if entries.is_empty() {
            continue;
        }

        let target = path.clone();
        match tokio::task::spawn_blocking(move || write_snapshot(&target, &entries)).await {
            Ok(Ok(())) => tracing::trace!(path = %path.display(), "history snapshot written"),
            Ok(Err(err)) => {
                tracing::warn!(path = %path.display(), %err, "history snapshot failed")
            }
            Err(err) => tracing::warn!(%err, "history snapshot task panicked"),
        }
    }
}
