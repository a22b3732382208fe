//! Async reload orchestrator.
//!
//! Polls the usage-report file in a tokio task and sends a [`DatasetUpdate`]
//! through an `mpsc` channel whenever a new copy has been loaded (or a reload
//! failed), so the TUI event loop can consume updates without any shared
//! mutable state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use usage_core::models::UsageRecord;

use crate::data_manager::DataManager;

// ── Public types ──────────────────────────────────────────────────────────────

/// A dataset snapshot forwarded to the TUI layer.
#[derive(Debug, Clone)]
pub struct DatasetUpdate {
    /// Latest successfully loaded records; empty if nothing ever loaded.
    pub records: Arc<Vec<UsageRecord>>,
    /// Load generation the records belong to.
    pub generation: u64,
    /// Error from the most recent load attempt, if it failed.
    pub error: Option<String>,
}

// ── ReloadOrchestrator ────────────────────────────────────────────────────────

/// Background file watcher.
///
/// Call [`ReloadOrchestrator::start`] to spin up the polling loop in a
/// dedicated tokio task and receive a channel endpoint for updates.
pub struct ReloadOrchestrator {
    /// How often the file metadata is checked.
    poll_interval: Duration,
    manager: DataManager,
}

impl ReloadOrchestrator {
    /// Create an orchestrator polling every `refresh_secs` seconds.
    ///
    /// `manager` may already hold loaded records; they are sent as the first
    /// update without re-reading the file.
    pub fn new(refresh_secs: u64, manager: DataManager) -> Self {
        Self::with_poll_interval(Duration::from_secs(refresh_secs), manager)
    }

    pub fn with_poll_interval(poll_interval: Duration, manager: DataManager) -> Self {
        Self {
            poll_interval,
            manager,
        }
    }

    /// Start the polling loop.
    ///
    /// Returns the receiving end of the update channel and a
    /// [`ReloadHandle`] that aborts the loop.
    pub fn start(self) -> (mpsc::Receiver<DatasetUpdate>, ReloadHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.reload_loop(tx).await;
        });

        (rx, ReloadHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Sends the current dataset immediately, then checks the file on every
    /// tick. Exits when the receiver is dropped.
    async fn reload_loop(mut self, tx: mpsc::Sender<DatasetUpdate>) {
        self.manager.load(false);
        if !send_update(&self.manager, &tx).await {
            return;
        }

        let mut interval = time::interval(self.poll_interval);
        // The first tick fires immediately; the initial load already happened.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("reload channel closed; exiting loop");
                break;
            }

            if !self.manager.has_changed() {
                continue;
            }

            let generation = self.manager.generation();
            let previous_error = self.manager.last_error().map(str::to_string);
            self.manager.load(false);

            let reloaded = self.manager.generation() != generation;
            let new_error = self.manager.last_error().is_some()
                && self.manager.last_error() != previous_error.as_deref();
            if (reloaded || new_error) && !send_update(&self.manager, &tx).await {
                break;
            }
        }
    }
}

/// Send the manager's current state. Returns `false` once the receiver is gone.
async fn send_update(manager: &DataManager, tx: &mpsc::Sender<DatasetUpdate>) -> bool {
    let update = DatasetUpdate {
        records: manager.records().unwrap_or_default(),
        generation: manager.generation(),
        error: manager.last_error().map(str::to_string),
    };
    tracing::debug!(
        generation = update.generation,
        records = update.records.len(),
        "sending dataset update"
    );

    if let Err(e) = tx.send(update).await {
        tracing::warn!(error = %e, "failed to send dataset update; receiver dropped");
        return false;
    }
    true
}

// ── ReloadHandle ──────────────────────────────────────────────────────────────

/// A handle to the background reload task.
///
/// Call [`ReloadHandle::abort`] to stop the loop.
pub struct ReloadHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl ReloadHandle {
    /// Immediately abort the reload loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
