//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `ConfigError` and `SetupError` into user-facing
//! errors with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use hivefleet_config::ConfigError;
use hivefleet_config::setup::SetupError;
use hivefleet_core::{CoreError, WorkerKey};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the HiveOS API at {url}")]
    #[diagnostic(
        code(hivefleet::connection_failed),
        help(
            "Check network access to the API.\n\
             Reason: {reason}\n\
             Self-hosted with a private certificate? Try --insecure (-k) or set ca_cert."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(hivefleet::timeout),
        help("Increase the timeout with --timeout or the profile's `timeout` key.")
    )]
    Timeout { seconds: u64 },

    #[error("The HiveOS API did not answer in time")]
    #[diagnostic(
        code(hivefleet::timeout),
        help("Increase the timeout with --timeout or the profile's `timeout` key.")
    )]
    RequestTimeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(hivefleet::auth_failed),
        help(
            "The access token was rejected or has expired.\n\
             Create a new one in HiveOS under Account > Sessions, then run:\n\
             hivefleet config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No access token configured for profile '{profile}'")]
    #[diagnostic(
        code(hivefleet::no_credentials),
        help(
            "Configure one with: hivefleet config init\n\
             Or pass --token / set HIVEFLEET_TOKEN."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(hivefleet::not_found),
        help("Run: hivefleet {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(hivefleet::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected API response: {message}")]
    #[diagnostic(
        code(hivefleet::data_contract),
        help("The API returned data this version does not understand. Re-run with -vv for details.")
    )]
    DataContract { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hivefleet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(hivefleet::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: hivefleet config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(hivefleet::no_config),
        help(
            "Create one with: hivefleet config init\n\
             Expected at: {path}\n\
             Or pass --token (and optionally --api-url) directly."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(hivefleet::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(hivefleet::keyring),
        help("Store the token in the profile's `access_token_env` variable instead.")
    )]
    Keyring { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(hivefleet::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(hivefleet::render))]
    Render(String),

    #[error("{0}")]
    #[diagnostic(code(hivefleet::internal))]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } | Self::RequestTimeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Like `From<CoreError>`, but names the worker when the API has no
    /// record of it.
    pub fn for_worker(key: WorkerKey, err: CoreError) -> Self {
        match err.root() {
            CoreError::Api { status: 404, .. } => Self::NotFound {
                resource_type: "worker".into(),
                identifier: key.to_string(),
                list_command: format!("workers list --farm {}", key.farm_id),
            },
            _ => err.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        // A failed first poll wraps the cause; report the cause.
        let err = match err {
            CoreError::UpdateFailed { source, .. } => *source,
            other => other,
        };

        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed {
                url: "HiveOS API".into(),
                reason,
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::TransportTimeout => CliError::RequestTimeout,

            CoreError::Api { status: 404, body } => CliError::NotFound {
                resource_type: "resource".into(),
                identifier: body,
                list_command: "farms list".into(),
            },

            CoreError::Api { status, body } => CliError::ApiError {
                status,
                message: body,
            },

            CoreError::DataContract { message } => CliError::DataContract { message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::UpdateFailed { name, source } => {
                CliError::Internal(format!("update of {name} failed: {source}"))
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Serialization(e) => CliError::Render(e.to_string()),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

// ── SetupError → CliError mapping ────────────────────────────────────

impl From<SetupError> for CliError {
    fn from(err: SetupError) -> Self {
        if err.is_invalid_auth() {
            return CliError::AuthFailed {
                profile: "current".into(),
            };
        }
        match err {
            SetupError::InvalidField { field, reason } => CliError::Validation {
                field: field.into(),
                reason: reason.into(),
            },
            SetupError::CannotConnect { url, message } => CliError::ConnectionFailed {
                url,
                reason: message,
            },
            SetupError::Unknown(message) => CliError::Internal(message),
        }
    }
}
