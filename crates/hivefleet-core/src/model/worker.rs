// ── Worker domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one worker coordinator: `(farm_id, worker_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerKey {
    pub farm_id: u64,
    pub worker_id: u64,
}

impl WorkerKey {
    pub fn new(farm_id: u64, worker_id: u64) -> Self {
        Self { farm_id, worker_id }
    }

    /// Coordinator name used in logs and errors: `"{farm_id}_{worker_id}"`.
    pub fn coordinator_name(&self) -> String {
        format!("{}_{}", self.farm_id, self.worker_id)
    }
}

impl fmt::Display for WorkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.farm_id, self.worker_id)
    }
}

/// The last-observed remote state of one worker.
///
/// Built fresh on every successful poll and replaced wholesale; never
/// mutated in place. Shared as `Arc<WorkerSnapshot>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    /// Worker id. Immutable for the lifetime of a coordinator.
    pub unique_id: u64,
    pub name: String,
    pub farm_id: u64,
    /// Hive OS version running on the rig.
    pub version: String,
    pub gpus_online: u32,
    pub gpus_offline: u32,
    pub online: bool,
    pub needs_upgrade: bool,
}

impl WorkerSnapshot {
    pub fn key(&self) -> WorkerKey {
        WorkerKey::new(self.farm_id, self.unique_id)
    }

    /// Mining is considered "on" while at least one GPU is online.
    pub fn is_on(&self) -> bool {
        self.gpus_online > 0
    }

    /// Reachable and reporting at least one GPU, in any state.
    pub fn is_available(&self) -> bool {
        self.online && self.total_gpus() > 0
    }

    pub fn total_gpus(&self) -> u32 {
        self.gpus_online.saturating_add(self.gpus_offline)
    }
}

/// Identity descriptor exposed to hosts that group entities by device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, worker_id)` pair, rendered as `"hiveos:{worker_id}"`.
    pub identifier: String,
    pub name: String,
    pub sw_version: String,
}

/// Read-only attributes attached to a worker switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerAttributes {
    pub farm_id: u64,
    pub worker_id: u64,
    pub version: String,
}
