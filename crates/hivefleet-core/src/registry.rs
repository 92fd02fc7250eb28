// ── Fleet registry ──
//
// Owns every worker coordinator for one HiveOS account. Created by the
// caller and passed where needed; tearing it down stops every loop.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::config::{CoordinatorConfig, FleetConfig, SetupPolicy};
use crate::coordinator::WorkerCoordinator;
use crate::device::WorkerSwitch;
use crate::error::CoreError;
use crate::model::{Farm, WorkerKey, WorkerSnapshot};
use crate::source::HiveApi;

/// Outcome of [`FleetRegistry::setup`].
#[derive(Debug, Default)]
pub struct SetupReport {
    /// Workers whose first poll succeeded and that are now running.
    pub loaded: Vec<WorkerKey>,
    /// Workers excluded because their first poll failed.
    pub skipped: Vec<(WorkerKey, CoreError)>,
}

/// All coordinators for one account, keyed by `(farm_id, worker_id)`.
pub struct FleetRegistry {
    api: Arc<dyn HiveApi>,
    config: CoordinatorConfig,
    coordinators: DashMap<WorkerKey, WorkerCoordinator>,
}

impl std::fmt::Debug for FleetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetRegistry")
            .field("config", &self.config)
            .field("workers", &self.coordinators.len())
            .finish_non_exhaustive()
    }
}

impl FleetRegistry {
    pub fn new(api: Arc<dyn HiveApi>, config: CoordinatorConfig) -> Self {
        Self {
            api,
            config,
            coordinators: DashMap::new(),
        }
    }

    /// Build a registry backed by a real API client.
    pub fn from_config(config: &FleetConfig) -> Result<Self, CoreError> {
        let client = config.client()?;
        Ok(Self::new(Arc::new(client), config.coordinator))
    }

    pub fn api(&self) -> &Arc<dyn HiveApi> {
        &self.api
    }

    // ── Discovery ────────────────────────────────────────────────────

    pub async fn farms(&self) -> Result<Vec<Farm>, CoreError> {
        let farms = self.api.list_farms().await?;
        Ok(farms.into_iter().map(Farm::from).collect())
    }

    /// Current state of every worker in a farm, without starting coordinators.
    pub async fn list_workers(&self, farm_id: u64) -> Result<Vec<WorkerSnapshot>, CoreError> {
        let workers = self.api.list_workers(farm_id).await?;
        Ok(workers.into_iter().map(WorkerSnapshot::from).collect())
    }

    /// List every worker of every farm visible to the token.
    pub async fn discover(&self) -> Result<Vec<WorkerKey>, CoreError> {
        let farms = self.api.list_farms().await?;
        let mut keys = Vec::new();
        for farm in farms {
            let workers = self.api.list_workers(farm.id).await?;
            debug!(farm_id = farm.id, workers = workers.len(), "discovered workers");
            keys.extend(workers.into_iter().map(|w| WorkerKey::new(farm.id, w.id)));
        }
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    // ── Setup ────────────────────────────────────────────────────────

    /// Create a coordinator per key and run all first polls concurrently.
    ///
    /// With `FailFast`, any failed first poll aborts setup and nothing is
    /// registered. With `SkipFailed`, failed workers are left out and
    /// reported. Registered coordinators start their background loops.
    /// Duplicate and already registered keys are polled at most once.
    pub async fn setup(
        &self,
        keys: &[WorkerKey],
        policy: SetupPolicy,
    ) -> Result<SetupReport, CoreError> {
        let unique: BTreeSet<WorkerKey> = keys
            .iter()
            .copied()
            .filter(|key| !self.coordinators.contains_key(key))
            .collect();
        let candidates: Vec<WorkerCoordinator> = unique
            .into_iter()
            .map(|key| WorkerCoordinator::new(key, Arc::clone(&self.api), self.config))
            .collect();

        let results = join_all(candidates.iter().map(|c| c.refresh_now())).await;

        let mut report = SetupReport::default();
        let mut healthy = Vec::new();
        for (coordinator, result) in candidates.into_iter().zip(results) {
            match result {
                Ok(_) => healthy.push(coordinator),
                Err(e) if policy == SetupPolicy::FailFast => {
                    warn!(worker = %coordinator.key(), "first poll failed, aborting setup");
                    return Err(e);
                }
                Err(e) => {
                    warn!(worker = %coordinator.key(), error = %e, "first poll failed, skipping worker");
                    report.skipped.push((coordinator.key(), e));
                }
            }
        }

        for coordinator in healthy {
            let key = coordinator.key();
            self.register(coordinator).await;
            report.loaded.push(key);
        }

        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            %policy,
            "fleet setup complete"
        );
        Ok(report)
    }

    /// Discover every worker and set them all up.
    pub async fn setup_all(&self, policy: SetupPolicy) -> Result<SetupReport, CoreError> {
        let keys = self.discover().await?;
        self.setup(&keys, policy).await
    }

    /// Add one worker: first poll, then start its loop. Returns the
    /// existing coordinator if the worker is already registered.
    pub async fn add(&self, key: WorkerKey) -> Result<WorkerCoordinator, CoreError> {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }
        let coordinator = WorkerCoordinator::new(key, Arc::clone(&self.api), self.config);
        coordinator.refresh_now().await?;
        Ok(self.register(coordinator).await)
    }

    /// Insert a polled coordinator and start its loop, unless another
    /// one won the slot in the meantime. The loser is shut down and the
    /// registered coordinator is returned.
    async fn register(&self, coordinator: WorkerCoordinator) -> WorkerCoordinator {
        let existing = match self.coordinators.entry(coordinator.key()) {
            Entry::Occupied(slot) => Some(slot.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(coordinator.clone());
                None
            }
        };

        if let Some(existing) = existing {
            debug!(worker = %coordinator.key(), "worker already registered, dropping duplicate");
            coordinator.shutdown().await;
            return existing;
        }
        // Started after insertion, so a concurrent unload either sees it
        // or has already cancelled it.
        coordinator.start().await;
        coordinator
    }

    /// Poll one worker once and return a switch for it, without
    /// registering it or starting a background loop.
    pub async fn probe(&self, key: WorkerKey) -> Result<WorkerSwitch, CoreError> {
        let coordinator = WorkerCoordinator::new(key, Arc::clone(&self.api), self.config);
        coordinator.refresh_now().await?;
        Ok(WorkerSwitch::new(coordinator))
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn get(&self, key: WorkerKey) -> Option<WorkerCoordinator> {
        self.coordinators.get(&key).map(|c| c.value().clone())
    }

    pub fn switch(&self, key: WorkerKey) -> Option<WorkerSwitch> {
        self.get(key).map(WorkerSwitch::new)
    }

    /// One switch per registered worker, ordered by key.
    pub fn switches(&self) -> Vec<WorkerSwitch> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.switch(key))
            .collect()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<WorkerKey> {
        let mut keys: Vec<WorkerKey> = self.coordinators.iter().map(|e| *e.key()).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinators.is_empty()
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// Unregister a worker and stop its loop. Returns `false` if unknown.
    pub async fn remove(&self, key: WorkerKey) -> bool {
        let Some((_, coordinator)) = self.coordinators.remove(&key) else {
            return false;
        };
        coordinator.shutdown().await;
        true
    }

    /// Stop every coordinator and empty the registry.
    pub async fn unload(&self) {
        let keys = self.keys();
        let removed: Vec<WorkerCoordinator> = keys
            .iter()
            .filter_map(|key| self.coordinators.remove(key).map(|(_, c)| c))
            .collect();
        join_all(removed.iter().map(|c| c.shutdown())).await;
        debug!(workers = removed.len(), "fleet registry unloaded");
    }
}
