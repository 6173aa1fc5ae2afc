//! Write coordinator for shortcuts files.
//!
//! Writes to the same path are debounced: each request restarts a quiet
//! window and replaces the pending state, so a burst of edits results in a
//! single write of the last state. Before writing, the coordinator checks
//! whether Steam is running; Steam rewrites the file itself on exit, so a
//! write is only made with the user's explicit confirmation.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use steamsync_steam::{Controller, ShortcutRecord, save_shortcuts_vdf};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncError;

/// Default quiet window before a pending write fires.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_secs(2);

/// Reports whether the Steam process is running.
pub trait ProcessProbe: Send + Sync {
    fn is_running(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

impl ProcessProbe for Controller {
    fn is_running(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(Controller::is_running(self))
    }
}

/// Asks the user whether to write while Steam is running.
pub trait WriteConfirmation: Send + Sync {
    fn confirm_write<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// Final state of a write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was replaced.
    Written,
    /// A later request for the same path replaced this one.
    Superseded,
    /// Cancelled explicitly or by dropping the coordinator.
    Cancelled,
    /// Steam was running and the write was refused.
    Declined,
}

/// Handle to a scheduled write.
#[derive(Debug)]
pub struct WriteTicket {
    rx: oneshot::Receiver<Result<WriteOutcome, SyncError>>,
}

impl WriteTicket {
    /// Waits for the write to resolve.
    pub async fn outcome(self) -> Result<WriteOutcome, SyncError> {
        self.rx.await.map_err(|_| SyncError::WriteAborted)?
    }
}

struct Pending {
    generation: u64,
    stop: oneshot::Sender<WriteOutcome>,
}

#[derive(Default)]
struct Scheduler {
    pending: HashMap<PathBuf, Pending>,
    /// Serializes the guard check and the write per path.
    locks: HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>,
}

impl Scheduler {
    fn lock_for(&mut self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.entry(path.to_path_buf()).or_default().clone()
    }
}

/// Debounced, guarded writer for shortcuts files.
///
/// Must be used inside a Tokio runtime. Dropping the coordinator cancels
/// every pending write.
pub struct WriteCoordinator {
    quiet: Duration,
    probe: Arc<dyn ProcessProbe>,
    confirm: Option<Arc<dyn WriteConfirmation>>,
    scheduler: Arc<Mutex<Scheduler>>,
    generation: AtomicU64,
    shutdown: CancellationToken,
}

impl WriteCoordinator {
    /// Creates a coordinator.
    ///
    /// Without a `confirm` handler, writes are withheld whenever Steam runs.
    pub fn new(
        quiet: Duration,
        probe: Arc<dyn ProcessProbe>,
        confirm: Option<Arc<dyn WriteConfirmation>>,
    ) -> Self {
        Self {
            quiet,
            probe,
            confirm,
            scheduler: Arc::new(Mutex::new(Scheduler::default())),
            generation: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// Schedules `records` to be written to `path` once the quiet window
    /// passes without another request for the same path.
    pub fn schedule(&self, path: impl Into<PathBuf>, records: Vec<ShortcutRecord>) -> WriteTicket {
        let path = path.into();
        let deadline = Instant::now() + self.quiet;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let (previous, lock) = {
            let mut sched = lock_scheduler(&self.scheduler);
            let previous = sched.pending.insert(
                path.clone(),
                Pending {
                    generation,
                    stop: stop_tx,
                },
            );
            (previous, sched.lock_for(&path))
        };
        if let Some(prev) = previous {
            debug!(path = %path.display(), "superseding pending write");
            let _ = prev.stop.send(WriteOutcome::Superseded);
        }

        let task = WriteTask {
            path,
            records,
            probe: Arc::clone(&self.probe),
            confirm: self.confirm.clone(),
            lock,
        };
        let scheduler = Arc::clone(&self.scheduler);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                reason = stop_rx => Ok(reason.unwrap_or(WriteOutcome::Cancelled)),
                _ = shutdown.cancelled() => Ok(WriteOutcome::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    let still_current = {
                        let mut sched = lock_scheduler(&scheduler);
                        let current = sched
                            .pending
                            .get(&task.path)
                            .is_some_and(|p| p.generation == generation);
                        if current {
                            sched.pending.remove(&task.path);
                        }
                        current
                    };
                    if still_current {
                        task.run().await
                    } else {
                        Ok(WriteOutcome::Superseded)
                    }
                }
            };
            let _ = done_tx.send(outcome);
        });

        WriteTicket { rx: done_rx }
    }

    /// Writes immediately, replacing any pending write for the path.
    /// The busy guard still applies.
    pub async fn write_now(
        &self,
        path: impl Into<PathBuf>,
        records: Vec<ShortcutRecord>,
    ) -> Result<WriteOutcome, SyncError> {
        let path = path.into();
        let (previous, lock) = {
            let mut sched = lock_scheduler(&self.scheduler);
            (sched.pending.remove(&path), sched.lock_for(&path))
        };
        if let Some(prev) = previous {
            let _ = prev.stop.send(WriteOutcome::Superseded);
        }

        WriteTask {
            path,
            records,
            probe: Arc::clone(&self.probe),
            confirm: self.confirm.clone(),
            lock,
        }
        .run()
        .await
    }

    /// Cancels the pending write for a path. Returns `false` if none was pending.
    pub fn cancel(&self, path: &Path) -> bool {
        let previous = lock_scheduler(&self.scheduler).pending.remove(path);
        match previous {
            Some(prev) => {
                let _ = prev.stop.send(WriteOutcome::Cancelled);
                debug!(path = %path.display(), "cancelled pending write");
                true
            }
            None => false,
        }
    }

    /// Returns `true` if a write for the path is waiting for its quiet window.
    pub fn has_pending(&self, path: &Path) -> bool {
        lock_scheduler(&self.scheduler).pending.contains_key(path)
    }
}

impl Drop for WriteCoordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct WriteTask {
    path: PathBuf,
    records: Vec<ShortcutRecord>,
    probe: Arc<dyn ProcessProbe>,
    confirm: Option<Arc<dyn WriteConfirmation>>,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl WriteTask {
    async fn run(self) -> Result<WriteOutcome, SyncError> {
        let _guard = self.lock.lock().await;

        if self.probe.is_running().await {
            let approved = match &self.confirm {
                Some(confirm) => confirm.confirm_write(&self.path).await,
                None => false,
            };
            if !approved {
                warn!(path = %self.path.display(), "Steam is running, write withheld");
                return Ok(WriteOutcome::Declined);
            }
            info!(path = %self.path.display(), "writing while Steam is running (confirmed)");
        }

        save_shortcuts_vdf(&self.path, &self.records)?;
        Ok(WriteOutcome::Written)
    }
}

fn lock_scheduler(scheduler: &Mutex<Scheduler>) -> std::sync::MutexGuard<'_, Scheduler> {
    scheduler.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
