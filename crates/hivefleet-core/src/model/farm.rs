// ── Farm domain type ──

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub id: u64,
    pub name: String,
    /// Number of workers in the farm (if the API reported it).
    pub worker_count: Option<u32>,
}
