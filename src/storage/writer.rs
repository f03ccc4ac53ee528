//! Background persistence with write coalescing.
//!
//! Mutations only tell the worker that state changed and return immediately.
//! The worker waits for a quiet period (the debounce window), then takes one
//! snapshot through its source and writes it. Under sustained activity the
//! quiet period may never come, so a pending change is also written once it
//! has waited `max_wait`. Write failures are logged and dropped; the next
//! change schedules another attempt.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::PersistenceConfig;
use crate::error::{Result, TrackerError};
use crate::storage::{PersistedState, StateStore};

/// Produces the state to write. Called on the writer thread.
pub type SnapshotSource = Box<dyn Fn() -> PersistedState + Send>;

enum Command {
    Changed,
    Flush(Sender<()>),
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
struct Timing {
    debounce: Duration,
    max_wait: Duration,
}

/// Owns the background writer thread.
pub struct PersistenceWorker {
    sender: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl PersistenceWorker {
    /// Spawn a worker that writes snapshots from `source` to `store`.
    pub fn spawn(
        store: Arc<dyn StateStore>,
        source: SnapshotSource,
        config: &PersistenceConfig,
    ) -> Result<Self> {
        let timing = Timing {
            debounce: config.debounce(),
            max_wait: config.max_wait(),
        };
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("mastery-persist".to_string())
            .spawn(move || run(receiver, store, source, timing))
            .map_err(|e| TrackerError::worker(format!("failed to spawn writer: {}", e)))?;

        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    /// Note that state changed and needs writing.
    pub fn mark_dirty(&self) {
        if self.sender.send(Command::Changed).is_err() {
            tracing::warn!("persistence worker has stopped; state change not saved");
        }
    }

    /// Block until every pending change has been written (or has failed).
    pub fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.sender
            .send(Command::Flush(ack_tx))
            .map_err(|_| TrackerError::worker("worker has stopped"))?;
        ack_rx
            .recv()
            .map_err(|_| TrackerError::worker("worker exited before acknowledging flush"))
    }
}

impl Drop for PersistenceWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("persistence worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for PersistenceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceWorker")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

fn run(
    receiver: Receiver<Command>,
    store: Arc<dyn StateStore>,
    source: SnapshotSource,
    timing: Timing,
) {
    let save = || write(&*store, &source());

    loop {
        // Wait for the first change
        match receiver.recv() {
            Ok(Command::Changed) => {}
            Ok(Command::Flush(ack)) => {
                let _ = ack.send(());
                continue;
            }
            Ok(Command::Shutdown) | Err(_) => return,
        }

        // Coalesce until the quiet period elapses or the change has waited too long
        let deadline = Instant::now() + timing.max_wait;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::trace!("max wait reached; writing under sustained changes");
                save();
                break;
            }

            match receiver.recv_timeout(timing.debounce.min(remaining)) {
                Ok(Command::Changed) => tracing::trace!("coalescing state write"),
                Ok(Command::Flush(ack)) => {
                    save();
                    let _ = ack.send(());
                    break;
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                    save();
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {
                    save();
                    break;
                }
            }
        }
    }
}

fn write(store: &dyn StateStore, state: &PersistedState) {
    match state.save_to(store) {
        Ok(()) => tracing::debug!(
            events = state.events.len(),
            records = state.records.len(),
            "persisted tracker state"
        ),
        Err(e) => tracing::warn!("failed to persist tracker state: {} (keeping in-memory state)", e),
    }
}
