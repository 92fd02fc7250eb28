//! Shared configuration for the hivefleet CLI.
//!
//! TOML profiles, access-token resolution (env + keyring + plaintext),
//! translation to `hivefleet_core::FleetConfig`, and setup validation
//! against the live API. The CLI adds flag-aware wrappers on top.

pub mod setup;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use hivefleet_api::DEFAULT_BASE_URL;
use hivefleet_core::{CoordinatorConfig, FleetConfig, SetupPolicy, TlsVerification};

pub use setup::{SetupError, validate_access_token};

/// Keyring service name under which access tokens are stored.
pub const KEYRING_SERVICE: &str = "hivefleet";

/// Prefix for environment overrides (`HIVEFLEET_DEFAULTS__TIMEOUT=5`).
pub const ENV_PREFIX: &str = "HIVEFLEET_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no access token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between background polls of each worker.
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,

    /// Upper bound on a single poll, in seconds.
    #[serde(default = "default_update_timeout")]
    pub update_timeout: u64,

    #[serde(default)]
    pub setup_policy: SetupPolicy,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            update_interval: default_update_interval(),
            update_timeout: default_update_timeout(),
            setup_policy: SetupPolicy::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_update_interval() -> u64 {
    hivefleet_core::DEFAULT_UPDATE_INTERVAL.as_secs()
}
fn default_update_timeout() -> u64 {
    hivefleet_core::DEFAULT_UPDATE_TIMEOUT.as_secs()
}
fn default_api_url() -> String {
    DEFAULT_BASE_URL.into()
}

/// A named HiveOS account profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL. Defaults to the hosted HiveOS API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Personal access token (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_policy: Option<SetupPolicy>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            access_token: None,
            access_token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            update_interval: None,
            update_timeout: None,
            setup_policy: None,
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("farm", "hivefleet", "hivefleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hivefleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `HIVEFLEET_*` env vars.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/access-token"))
}

/// Resolve an access token from the credential chain (no CLI flag step).
///
/// Order: the env var named by `access_token_env`, the system keyring,
/// then the plaintext `access_token` field.
pub fn resolve_access_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_token_chain(
        profile,
        profile_name,
        |var| std::env::var(var).ok(),
        || keyring_entry(profile_name).ok()?.get_password().ok(),
    )
}

fn resolve_token_chain(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn() -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's access_token_env → env var lookup
    if let Some(token) = profile.access_token_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(token));
    }

    // 2. System keyring
    if let Some(token) = keyring() {
        return Ok(SecretString::from(token));
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.access_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an access token in the system keyring for `profile_name`.
pub fn store_access_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── Profile → FleetConfig ───────────────────────────────────────────

/// Parse a profile's API URL.
pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// TLS strategy for a profile: `insecure` wins over `ca_cert`.
pub fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `FleetConfig` from a profile, no CLI flag overrides.
///
/// Profile values win over `[defaults]`.
pub fn profile_to_fleet_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<FleetConfig, ConfigError> {
    let token = resolve_access_token(profile, profile_name)?;
    fleet_config_with_token(profile, defaults, token)
}

/// Like [`profile_to_fleet_config`], with an already-resolved token.
pub fn fleet_config_with_token(
    profile: &Profile,
    defaults: &Defaults,
    token: SecretString,
) -> Result<FleetConfig, ConfigError> {
    let api_url = parse_api_url(&profile.api_url)?;

    let update_interval = profile.update_interval.unwrap_or(defaults.update_interval);
    if update_interval == 0 {
        return Err(ConfigError::Validation {
            field: "update_interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    Ok(FleetConfig {
        api_url,
        token,
        tls: tls_for(profile, defaults),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        coordinator: CoordinatorConfig {
            update_interval: Duration::from_secs(update_interval),
            update_timeout: Duration::from_secs(
                profile.update_timeout.unwrap_or(defaults.update_timeout),
            ),
        },
        setup_policy: profile.setup_policy.unwrap_or(defaults.setup_policy),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.default_profile_name(), "default");
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.defaults.update_interval, 60);
        assert_eq!(cfg.defaults.update_timeout, 10);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_values_override_defaults() {
        let (_dir, path) = write_config(
            r#"
default_profile = "home"

[defaults]
update_interval = 120
setup_policy = "fail-fast"

[profiles.home]
access_token = "plain-token"
update_timeout = 5
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        let profile = cfg.profile("home").unwrap();
        assert_eq!(profile.api_url, DEFAULT_BASE_URL);

        let token = resolve_token_chain(profile, "home", |_| None, || None).unwrap();
        assert_eq!(token.expose_secret(), "plain-token");

        let fleet = fleet_config_with_token(profile, &cfg.defaults, token).unwrap();
        assert_eq!(fleet.coordinator.update_interval, Duration::from_secs(120));
        assert_eq!(fleet.coordinator.update_timeout, Duration::from_secs(5));
        assert_eq!(fleet.setup_policy, SetupPolicy::FailFast);
        assert_eq!(fleet.tls, TlsVerification::SystemDefaults);
        assert_eq!(fleet.timeout, Duration::from_secs(30));
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.profile("nope"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn token_chain_prefers_env_then_keyring_then_plaintext() {
        let profile = Profile {
            access_token: Some("plain".into()),
            access_token_env: Some("HIVE_TOKEN".into()),
            ..Profile::default()
        };

        let from_env = resolve_token_chain(
            &profile,
            "p",
            |var| (var == "HIVE_TOKEN").then(|| "env".to_string()),
            || Some("ring".into()),
        )
        .unwrap();
        assert_eq!(from_env.expose_secret(), "env");

        let from_ring =
            resolve_token_chain(&profile, "p", |_| None, || Some("ring".into())).unwrap();
        assert_eq!(from_ring.expose_secret(), "ring");

        let plain = resolve_token_chain(&profile, "p", |_| None, || None).unwrap();
        assert_eq!(plain.expose_secret(), "plain");
    }

    #[test]
    fn no_token_anywhere_is_no_credentials() {
        let err = resolve_token_chain(&Profile::default(), "p", |_| None, || None).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "p"));
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let profile = Profile {
            insecure: Some(true),
            ca_cert: Some("/tmp/ca.pem".into()),
            ..Profile::default()
        };
        assert_eq!(
            tls_for(&profile, &Defaults::default()),
            TlsVerification::DangerAcceptInvalid
        );

        let profile = Profile {
            ca_cert: Some("/tmp/ca.pem".into()),
            ..Profile::default()
        };
        assert_eq!(
            tls_for(&profile, &Defaults::default()),
            TlsVerification::CustomCa("/tmp/ca.pem".into())
        );
    }

    #[test]
    fn zero_update_interval_is_rejected() {
        let profile = Profile {
            update_interval: Some(0),
            ..Profile::default()
        };
        let err = fleet_config_with_token(
            &profile,
            &Defaults::default(),
            SecretString::from("t".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "update_interval"));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                access_token_env: Some("HIVE_TOKEN".into()),
                setup_policy: Some(SetupPolicy::FailFast),
                ..Profile::default()
            },
        );

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        let profile = loaded.profile("default").unwrap();
        assert_eq!(profile.access_token_env.as_deref(), Some("HIVE_TOKEN"));
        assert_eq!(profile.setup_policy, Some(SetupPolicy::FailFast));
        assert!(profile.access_token.is_none());
    }
}
