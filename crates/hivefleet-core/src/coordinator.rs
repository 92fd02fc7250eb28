// ── Per-worker update coordinator ──
//
// Owns the polling loop and the cached snapshot of one worker. Every
// state change is pushed through a `watch` channel; polls and commands
// for the same worker are serialized through one async mutex.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hivefleet_api::WorkerCommand;

use crate::config::CoordinatorConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{WorkerKey, WorkerSnapshot};
use crate::source::HiveApi;

// ── State ────────────────────────────────────────────────────────────

/// Where the coordinator is in its poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
}

/// The most recent failed poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateFailure {
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Everything a consumer can observe about one coordinator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinatorState {
    /// `None` until the first successful poll.
    pub snapshot: Option<Arc<WorkerSnapshot>>,
    pub phase: PollPhase,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<UpdateFailure>,
    /// Outcome of the most recent poll.
    pub last_update_success: bool,
}

// ── Coordinator ──────────────────────────────────────────────────────

/// Polls one worker on a fixed interval and caches its latest snapshot.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. A poll that fails or
/// times out never touches the cached snapshot; it is recorded in
/// [`CoordinatorState::last_failure`] and logged at `error`.
#[derive(Clone)]
pub struct WorkerCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    key: WorkerKey,
    name: String,
    api: Arc<dyn HiveApi>,
    config: CoordinatorConfig,
    state: watch::Sender<CoordinatorState>,
    /// Serializes polls and commands for this worker.
    io_lock: Mutex<()>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for WorkerCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerCoordinator")
            .field("key", &self.inner.key)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl WorkerCoordinator {
    /// Create a coordinator. Does NOT poll -- call
    /// [`refresh_now()`](Self::refresh_now) for the first snapshot and
    /// [`start()`](Self::start) for the background loop.
    pub fn new(key: WorkerKey, api: Arc<dyn HiveApi>, config: CoordinatorConfig) -> Self {
        let (state, _) = watch::channel(CoordinatorState::default());

        Self {
            inner: Arc::new(CoordinatorInner {
                key,
                name: key.coordinator_name(),
                api,
                config,
                state,
                io_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn key(&self) -> WorkerKey {
        self.inner.key
    }

    /// `"{farm_id}_{worker_id}"`, used in logs and errors.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Run exactly one poll, bounded by `update_timeout`. The bound covers
    /// waiting for an in-flight command as well as the fetch itself.
    ///
    /// On success the snapshot is replaced and pushed to subscribers.
    /// On failure the snapshot is kept, the failure is recorded and
    /// pushed, and `CoreError::UpdateFailed` is returned.
    pub async fn refresh_now(&self) -> Result<Arc<WorkerSnapshot>, CoreError> {
        let timeout = self.inner.config.update_timeout;
        let attempt = async {
            let guard = self.inner.io_lock.lock().await;
            self.inner.state.send_if_modified(|state| {
                state.phase = PollPhase::Polling;
                false
            });
            (guard, self.fetch().await)
        };

        // The guard is held until the outcome is published.
        let (_guard, result) = match tokio::time::timeout(timeout, attempt).await {
            Ok((guard, fetched)) => (Some(guard), fetched),
            Err(_) => (
                None,
                Err(CoreError::Timeout {
                    timeout_secs: timeout.as_secs(),
                }),
            ),
        };

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let now = Utc::now();
                self.inner.state.send_modify(|state| {
                    state.snapshot = Some(Arc::clone(&snapshot));
                    state.phase = PollPhase::Idle;
                    state.last_success = Some(now);
                    state.last_update_success = true;
                });
                debug!(
                    coordinator = %self.inner.name,
                    gpus_online = snapshot.gpus_online,
                    gpus_offline = snapshot.gpus_offline,
                    online = snapshot.online,
                    "worker updated"
                );
                Ok(snapshot)
            }
            Err(source) => {
                error!(coordinator = %self.inner.name, error = %source, "worker update failed");
                let failure = UpdateFailure {
                    reason: source.to_string(),
                    at: Utc::now(),
                };
                self.inner.state.send_modify(|state| {
                    state.phase = PollPhase::Idle;
                    state.last_failure = Some(failure);
                    state.last_update_success = false;
                });
                Err(CoreError::UpdateFailed {
                    name: self.inner.name.clone(),
                    source: Box::new(source),
                })
            }
        }
    }

    async fn fetch(&self) -> Result<WorkerSnapshot, CoreError> {
        let key = self.inner.key;
        let record = self
            .inner
            .api
            .fetch_worker(key.farm_id, key.worker_id)
            .await?;
        convert::snapshot_for(key, record)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send a command to this worker.
    ///
    /// Waits for any in-flight poll to finish first. The snapshot is not
    /// touched; the next poll reflects the command's effect.
    pub async fn send_command(&self, command: WorkerCommand) -> Result<(), CoreError> {
        let _guard = self.inner.io_lock.lock().await;
        let key = self.inner.key;
        info!(coordinator = %self.inner.name, command = command.name(), "sending command");

        self.inner
            .api
            .send_command(key.farm_id, key.worker_id, command)
            .await
            .map_err(CoreError::from)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the background update loop. Calling it again while the loop
    /// is running is a no-op.
    pub async fn start(&self) {
        let mut task = self.inner.task.lock().await;
        if task.is_some() || self.inner.cancel.is_cancelled() {
            return;
        }
        debug!(
            coordinator = %self.inner.name,
            interval_secs = self.inner.config.update_interval.as_secs(),
            "starting update loop"
        );
        *task = Some(tokio::spawn(update_task(
            self.clone(),
            self.inner.cancel.clone(),
        )));
    }

    /// Stop the background loop and wait for it to exit. A coordinator
    /// cannot be restarted after shutdown.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(coordinator = %self.inner.name, error = %e, "update task ended abnormally");
            }
        }
        debug!(coordinator = %self.inner.name, "coordinator shut down");
    }

    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled()
            && self
                .inner
                .task
                .try_lock()
                .is_ok_and(|task| task.as_ref().is_some_and(|h| !h.is_finished()))
    }

    // ── State observation ────────────────────────────────────────────

    /// Current state (cheap: the snapshot is behind an `Arc`).
    pub fn state(&self) -> CoordinatorState {
        self.inner.state.borrow().clone()
    }

    /// Latest successful snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<WorkerSnapshot>> {
        self.inner.state.borrow().snapshot.clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    /// State changes as a `Stream`, starting with the current state.
    pub fn updates(&self) -> WatchStream<CoordinatorState> {
        WatchStream::new(self.subscribe())
    }
}

// ── Background task ──────────────────────────────────────────────────

async fn update_task(coordinator: WorkerCoordinator, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(coordinator.inner.config.update_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are recorded and logged by refresh_now.
                if coordinator.refresh_now().await.is_err() {
                    debug!(coordinator = %coordinator.inner.name, "poll failed, waiting for next tick");
                }
            }
        }
    }

    debug!(coordinator = %coordinator.inner.name, "update loop stopped");
}
