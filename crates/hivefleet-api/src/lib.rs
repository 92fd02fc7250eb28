// hivefleet-api: Async Rust client for the HiveOS farm management API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::AccessToken;
pub use client::{DEFAULT_BASE_URL, HiveClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{
    AccountProfile, Farm, MinerAction, WorkerCommand, WorkerRecord, WorkerStats, WorkerVersions,
};
