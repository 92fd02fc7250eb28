//! Polling and state-reconciliation layer between `hivefleet-api` and the CLI.
//!
//! This crate owns the domain model and the per-worker update machinery
//! for a HiveOS account:
//!
//! - **[`WorkerCoordinator`]**: polls one worker on a fixed interval
//!   (bounded by a per-poll timeout), caches the latest
//!   [`WorkerSnapshot`] and pushes every state change through a
//!   `tokio::sync::watch` channel. Failed polls keep the previous snapshot
//!   and are recorded instead of propagated.
//!
//! - **[`WorkerSwitch`]**: a [`ToggleEntity`] that renders a coordinator's
//!   snapshot as on/off and relays miner, shutdown, upgrade and reboot
//!   commands. Never predicts state locally.
//!
//! - **[`FleetRegistry`]**: explicit owner of every coordinator for one
//!   account. Discovers workers, runs the first polls under a
//!   [`SetupPolicy`], and tears everything down on unload.
//!
//! - **Domain model** ([`model`]): [`WorkerSnapshot`], [`WorkerKey`],
//!   [`Farm`], built from validated API records in [`convert`].

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod model;
pub mod registry;
pub mod source;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    CoordinatorConfig, DEFAULT_UPDATE_INTERVAL, DEFAULT_UPDATE_TIMEOUT, FleetConfig, SetupPolicy,
    TlsVerification,
};
pub use coordinator::{CoordinatorState, PollPhase, UpdateFailure, WorkerCoordinator};
pub use device::{CommandOutcome, SkipReason, ToggleEntity, WorkerSwitch};
pub use error::CoreError;
pub use registry::{FleetRegistry, SetupReport};
pub use source::HiveApi;

pub use model::{DeviceInfo, Farm, WorkerAttributes, WorkerKey, WorkerSnapshot};

// Command types are part of the public surface of coordinators.
pub use hivefleet_api::{MinerAction, WorkerCommand};
