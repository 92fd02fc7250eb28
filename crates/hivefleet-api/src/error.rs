use thiserror::Error;

/// Top-level error type for the `hivefleet-api` crate.
///
/// Covers every failure mode of the HiveOS REST surface: credential
/// rejection, non-success responses, transport, and schema mismatches.
/// `hivefleet-core` maps these into its own error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The access token was rejected (HTTP 401) or could not be encoded.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── API ─────────────────────────────────────────────────────────
    /// Any other non-success response, with the raw body for diagnostics.
    #[error("HiveOS API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The response did not match the expected schema.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
