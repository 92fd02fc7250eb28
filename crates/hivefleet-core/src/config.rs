// ── Runtime fleet configuration ──
//
// These types describe *how* to reach the HiveOS API and how often to
// poll. They carry credential data and tuning, but never touch disk.
// The CLI constructs a `FleetConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use hivefleet_api::{HiveClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// Default period between background polls.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);

/// Default upper bound on a single poll.
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). The hosted API has a public certificate.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-hosted API behind a self-signed cert).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// What to do when some workers fail their first poll during setup.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SetupPolicy {
    /// Register the healthy workers, report the failed ones.
    #[default]
    SkipFailed,
    /// Any failed first poll aborts setup; nothing is registered.
    FailFast,
}

/// Polling cadence for a single worker coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub update_interval: Duration,
    pub update_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            update_timeout: DEFAULT_UPDATE_TIMEOUT,
        }
    }
}

/// Everything needed to talk to one HiveOS account.
///
/// Built by the CLI from a config profile; core never reads config files.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// API base URL (e.g., `https://api2.hiveos.farm/api/v2`).
    pub api_url: Url,
    /// Personal access token, sent as a bearer token.
    pub token: SecretString,
    pub tls: TlsVerification,
    /// HTTP request timeout (connect + response).
    pub timeout: Duration,
    pub coordinator: CoordinatorConfig,
    pub setup_policy: SetupPolicy,
}

impl FleetConfig {
    /// A config with default tuning for the given endpoint and token.
    pub fn new(api_url: Url, token: SecretString) -> Self {
        Self {
            api_url,
            token,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            coordinator: CoordinatorConfig::default(),
            setup_policy: SetupPolicy::default(),
        }
    }

    /// Build an authenticated API client from this config.
    pub fn client(&self) -> Result<HiveClient, CoreError> {
        let transport = TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            ..TransportConfig::default()
        };
        Ok(HiveClient::new(
            self.api_url.as_str(),
            &self.token,
            &transport,
        )?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn setup_policy_parses_kebab_case() {
        assert_eq!(
            "fail-fast".parse::<SetupPolicy>().unwrap(),
            SetupPolicy::FailFast
        );
        assert_eq!(SetupPolicy::SkipFailed.to_string(), "skip-failed");
        assert_eq!(SetupPolicy::default(), SetupPolicy::SkipFailed);
    }

    #[test]
    fn client_uses_configured_url() {
        let cfg = FleetConfig::new(
            Url::parse("http://127.0.0.1:9/api/v2").unwrap(),
            SecretString::from("t".to_string()),
        );
        let client = cfg.client().unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9/api/v2/");
    }
}
