//! Debounced background autosave.

use super::Snapshot;
use crate::db::SaveStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

/// Writes the latest snapshot to the autosave slot after a quiet period.
///
/// Scheduling a new snapshot supersedes any that has not been written yet;
/// writes are serialized and a superseded snapshot is never written after a
/// newer one. Failures are logged and never reported to the caller.
#[derive(Debug)]
pub struct AutoSaver {
    store: SaveStore,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    write_lock: Arc<Mutex<()>>,
    pending: Option<JoinHandle<()>>,
}

impl AutoSaver {
    /// Creates an autosaver writing to `store`.
    pub fn new(store: SaveStore, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            write_lock: Arc::new(Mutex::new(())),
            pending: None,
        }
    }

    /// Store the autosave slot lives in.
    pub fn store(&self) -> &SaveStore {
        &self.store
    }

    /// Schedules `snapshot` to be written once the debounce period elapses.
    pub fn schedule(&mut self, snapshot: Snapshot) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let write_lock = Arc::clone(&self.write_lock);
        let store = self.store.clone();
        let debounce = self.debounce;
        let span = info_span!("autosave", generation, nodes = snapshot.nodes.len());

        self.pending = Some(tokio::spawn(
            async move {
                tokio::time::sleep(debounce).await;
                let written = tokio::task::spawn_blocking(move || {
                    let _guard = write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    if latest.load(Ordering::SeqCst) != generation {
                        return Ok(false);
                    }
                    store.save_autosave(&snapshot).map(|()| true)
                })
                .await;
                match written {
                    Ok(Ok(true)) => debug!("Autosave complete"),
                    Ok(Ok(false)) => debug!("Autosave superseded"),
                    Ok(Err(e)) => warn!(error = %e, "Autosave failed"),
                    Err(e) => warn!(error = %e, "Autosave task failed"),
                }
            }
            .instrument(span),
        ));
    }

    /// Waits for the scheduled write, if any, to finish.
    pub async fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            if let Err(e) = pending.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Autosave task failed");
                }
            }
        }
    }
}
