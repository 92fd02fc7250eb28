// Wire types for the HiveOS API (v2).
//
// These structs are the single validation point for response bodies:
// anything that fails to deserialize here surfaces as
// `Error::Deserialization` instead of leaking partial data upward.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A farm: a named group of workers under one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub workers_count: Option<u32>,
}

/// A worker (mining rig) as returned by the worker endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: u64,
    pub name: String,
    pub farm_id: u64,
    /// Absent for workers that never reported to the cloud.
    #[serde(default)]
    pub stats: Option<WorkerStats>,
    pub versions: WorkerVersions,
    pub needs_upgrade: bool,
}

/// Live statistics block of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    #[serde(default)]
    pub gpus_online: u32,
    #[serde(default)]
    pub gpus_offline: u32,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerVersions {
    /// Hive OS client version.
    pub hive: String,
}

/// Account profile of the token owner. Only used to validate credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// ── Commands ────────────────────────────────────────────────────────

/// Action carried by the `miner` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinerAction {
    Start,
    Stop,
    Restart,
}

impl MinerAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

/// Commands accepted by `POST farms/{farm_id}/workers/{worker_id}/command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    Miner(MinerAction),
    Shutdown,
    Upgrade,
    Reboot,
}

impl WorkerCommand {
    /// Value of the `command` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Miner(_) => "miner",
            Self::Shutdown => "shutdown",
            Self::Upgrade => "upgrade",
            Self::Reboot => "reboot",
        }
    }

    /// Value of the optional `data` field.
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::Miner(action) => Some(json!({ "action": action.as_str() })),
            Self::Shutdown | Self::Upgrade | Self::Reboot => None,
        }
    }
}

/// Request body shape: `{"command": <name>, "data": <optional object>}`.
#[derive(Debug, Serialize)]
pub(crate) struct CommandBody<'a> {
    pub command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a Value>,
}

/// Strip the `{"data": ...}` envelope when present.
pub(crate) fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    }
}
