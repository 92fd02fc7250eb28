// ── Core error types ──
//
// User-facing errors from hivefleet-core. The `From<hivefleet_api::Error>`
// impl translates transport-layer errors into domain variants; the
// coordinator wraps any poll failure in `UpdateFailed`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach HiveOS API: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// A poll cycle exceeded `update_timeout`.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The HTTP client gave up before the API answered.
    #[error("HiveOS API did not answer within the transport timeout")]
    TransportTimeout,

    // ── API errors ───────────────────────────────────────────────────
    #[error("HiveOS API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The API answered with data that breaks an expected invariant.
    #[error("Unexpected data from HiveOS API: {message}")]
    DataContract { message: String },

    // ── Coordinator ──────────────────────────────────────────────────
    /// A poll cycle failed. The cached snapshot was left untouched.
    #[error("Update failed for {name}: {source}")]
    UpdateFailed {
        name: String,
        #[source]
        source: Box<CoreError>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// The innermost cause, unwrapping `UpdateFailed`.
    pub fn root(&self) -> &CoreError {
        match self {
            Self::UpdateFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hivefleet_api::Error> for CoreError {
    fn from(err: hivefleet_api::Error) -> Self {
        match err {
            hivefleet_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            hivefleet_api::Error::Api { status, body } => CoreError::Api { status, body },
            hivefleet_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::TransportTimeout
                } else if let Some(status) = e.status() {
                    CoreError::Api {
                        status: status.as_u16(),
                        body: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                }
            }
            hivefleet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            hivefleet_api::Error::Tls(reason) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {reason}"),
            },
            hivefleet_api::Error::Deserialization { message, body: _ } => {
                CoreError::DataContract { message }
            }
        }
    }
}
