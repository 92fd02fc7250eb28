//! CLI configuration: a thin layer over `hivefleet_config`.
//!
//! Adds flag-aware resolution on top of the shared profile types so that
//! `--api-url`, `--token`, `--insecure` and `--timeout` win over the
//! config file.

use std::time::Duration;

use secrecy::SecretString;

use hivefleet_core::{FleetConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use hivefleet_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Build a `FleetConfig` from the config file, active profile and flags.
///
/// Without a matching profile, `--token` alone is enough: everything else
/// falls back to `[defaults]` and the hosted API.
pub fn resolve_fleet_config(global: &GlobalOpts) -> Result<FleetConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.token.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    resolve_profile(&profile, &profile_name, &cfg.defaults, global)
}

/// Apply flag overrides to a profile and translate it.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<FleetConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => hivefleet_config::resolve_access_token(&profile, profile_name)?,
    };

    let config = hivefleet_config::fleet_config_with_token(&profile, defaults, token)?;
    if matches!(config.tls, TlsVerification::DangerAcceptInvalid) {
        tracing::warn!("TLS certificate verification is disabled");
    }
    Ok(config)
}

/// Override the poll interval for long-running commands.
pub fn with_interval(mut config: FleetConfig, secs: Option<u64>) -> Result<FleetConfig, CliError> {
    if let Some(secs) = secs {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        config.coordinator.update_interval = Duration::from_secs(secs);
    }
    Ok(config)
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}
