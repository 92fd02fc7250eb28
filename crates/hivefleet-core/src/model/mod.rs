// ── Fleet domain model ──
//
// Canonical, fully-populated types built from validated API records.
// Consumers (switches, CLI) depend on these, never on wire types.

pub mod farm;
pub mod worker;

// ── Re-exports ──────────────────────────────────────────────────────

pub use farm::Farm;
pub use worker::{DeviceInfo, WorkerAttributes, WorkerKey, WorkerSnapshot};
