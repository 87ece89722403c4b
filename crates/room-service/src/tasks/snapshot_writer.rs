//! Snapshot writer background task.
//!
//! Room creation must never wait on disk. The registry publishes a copy of
//! its records to this task, which writes it to the configured
//! `SnapshotStore`.
//!
//! # Semantics
//!
//! - Latest wins: the handle holds a single pending slot (a `watch` channel).
//!   Publishing replaces whatever is pending, so the writer always writes the
//!   newest snapshot and never an older one after it.
//! - Coalescing: snapshots published while a save is in flight collapse into
//!   one follow-up save.
//! - Publishing never blocks. A crash before the pending snapshot is written
//!   loses the rooms created since the last save.
//!
//! # Graceful Shutdown
//!
//! When the cancellation token fires the task writes the pending snapshot,
//! if any, and exits.

use crate::observability::metrics;
use crate::repositories::{RoomSnapshot, SnapshotStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Handle for publishing snapshots to the writer.
#[derive(Clone, Debug)]
pub struct SnapshotWriterHandle {
    sender: Arc<watch::Sender<Option<RoomSnapshot>>>,
}

impl SnapshotWriterHandle {
    /// Spawn the writer task.
    ///
    /// The returned join handle completes after the token is cancelled and any
    /// pending snapshot has been flushed, or once every handle has been
    /// dropped.
    pub fn spawn(
        store: Arc<dyn SnapshotStore>,
        cancel_token: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (handle, receiver) = Self::channel();
        let task = tokio::spawn(run_snapshot_writer(store, receiver, cancel_token));
        (handle, task)
    }

    fn channel() -> (Self, watch::Receiver<Option<RoomSnapshot>>) {
        let (sender, receiver) = watch::channel(None);
        (
            Self {
                sender: Arc::new(sender),
            },
            receiver,
        )
    }

    /// Publish a snapshot, replacing any snapshot not yet written.
    ///
    /// Callers must publish in mutation order. Returns `false` if the writer
    /// has stopped.
    pub fn request_save(&self, snapshot: RoomSnapshot) -> bool {
        if self.sender.send(Some(snapshot)).is_err() {
            warn!(
                target: "rooms.snapshot",
                "Snapshot writer stopped, dropping snapshot"
            );
            metrics::record_snapshot_operation("save", "dropped");
            return false;
        }
        true
    }
}

#[instrument(skip_all, name = "rooms.task.snapshot_writer")]
async fn run_snapshot_writer(
    store: Arc<dyn SnapshotStore>,
    mut receiver: watch::Receiver<Option<RoomSnapshot>>,
    cancel_token: CancellationToken,
) {
    info!(target: "rooms.snapshot", "Starting snapshot writer task");

    loop {
        tokio::select! {
            // A pending snapshot is always taken before cancel is observed,
            // so shutdown writes it first.
            biased;

            changed = receiver.changed() => {
                if changed.is_err() {
                    debug!(target: "rooms.snapshot", "All snapshot handles dropped");
                    break;
                }
                let pending = receiver.borrow_and_update().clone();
                if let Some(snapshot) = pending {
                    write_snapshot(store.as_ref(), &snapshot).await;
                }
            }
            () = cancel_token.cancelled() => {
                info!(
                    target: "rooms.snapshot",
                    "Snapshot writer received shutdown signal, no snapshot pending"
                );
                break;
            }
        }
    }

    info!(target: "rooms.snapshot", "Snapshot writer task stopped");
}

async fn write_snapshot(store: &dyn SnapshotStore, snapshot: &RoomSnapshot) {
    match store.save(snapshot).await {
        Ok(()) => {
            debug!(
                target: "rooms.snapshot",
                rooms = snapshot.len(),
                "Snapshot saved"
            );
            metrics::record_snapshot_operation("save", "success");
        }
        Err(e) => {
            // In-memory registry stays authoritative; the next job retries
            error!(
                target: "rooms.snapshot",
                error = %e,
                rooms = snapshot.len(),
                "Failed to save snapshot"
            );
            metrics::record_snapshot_operation("save", "error");
        }
    }
}

/// Load the snapshot the registry starts from.
///
/// Failures are logged and yield an empty snapshot so startup never fails on
/// a bad file. A missing file is not a failure.
#[instrument(skip_all, name = "rooms.task.load_snapshot")]
pub async fn load_initial_snapshot(store: &dyn SnapshotStore) -> RoomSnapshot {
    match store.load().await {
        Ok(snapshot) => {
            info!(
                target: "rooms.snapshot",
                rooms = snapshot.len(),
                "Loaded room snapshot"
            );
            metrics::record_snapshot_operation("load", "success");
            snapshot
        }
        Err(e) => {
            error!(
                target: "rooms.snapshot",
                error = %e,
                "Failed to load room snapshot, starting with an empty registry"
            );
            metrics::record_snapshot_operation("load", "error");
            RoomSnapshot::new()
        }
    }
}
