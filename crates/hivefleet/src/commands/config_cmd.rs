//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Password, Select};
use secrecy::SecretString;

use hivefleet_config::{fleet_config_with_token, store_access_token, validate_access_token};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

/// Attempts at entering a token before `config init` gives up.
const MAX_TOKEN_ATTEMPTS: usize = 3;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the plaintext token.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "insecure = {}", d.insecure);
    let _ = writeln!(out, "timeout = {}", d.timeout);
    let _ = writeln!(out, "update_interval = {}", d.update_interval);
    let _ = writeln!(out, "update_timeout = {}", d.update_timeout);
    let _ = writeln!(out, "setup_policy = \"{}\"", d.setup_policy);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if p.access_token.is_some() {
            let _ = writeln!(out, "access_token = \"{MASK}\"");
        }
        if let Some(ref env) = p.access_token_env {
            let _ = writeln!(out, "access_token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(secs) = p.update_interval {
            let _ = writeln!(out, "update_interval = {secs}");
        }
        if let Some(secs) = p.update_timeout {
            let _ = writeln!(out, "update_timeout = {secs}");
        }
        if let Some(policy) = p.setup_policy {
            let _ = writeln!(out, "setup_policy = \"{policy}\"");
        }
    }

    out
}

fn redact(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.access_token.is_some() {
            profile.access_token = Some(MASK.into());
        }
    }
}

/// Map a dialoguer failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for a token until the API accepts it.
///
/// Only a rejected token re-prompts; connection problems abort.
async fn prompt_valid_token(profile: &Profile, cfg: &Config) -> Result<String, CliError> {
    for attempt in 1..=MAX_TOKEN_ATTEMPTS {
        let token = Password::new()
            .with_prompt("Access token")
            .interact()
            .map_err(prompt_err)?;
        if token.trim().is_empty() {
            eprintln!("   ✗ token cannot be empty");
            continue;
        }

        let fleet = fleet_config_with_token(profile, &cfg.defaults, SecretString::from(token.clone()))?;
        match validate_access_token(&fleet).await {
            Ok(account) => {
                eprintln!("   ✓ token accepted for account '{}'", account.login);
                return Ok(token);
            }
            Err(e) if e.is_invalid_auth() => {
                eprintln!(
                    "   ✗ token rejected by the API ({attempt}/{MAX_TOKEN_ATTEMPTS})"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(CliError::AuthFailed {
        profile: "new profile".into(),
    })
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: config::available_profiles(cfg),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("hivefleet configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("API URL")
                .default(Profile::default().api_url)
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile {
                api_url,
                insecure: global.insecure.then_some(true),
                ..Profile::default()
            };

            let token = prompt_valid_token(&profile, &cfg).await?;

            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where to store the access token?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            if selection == 0 {
                store_access_token(&profile_name, &token)?;
                eprintln!("   ✓ access token stored in system keyring");
            } else {
                profile.access_token = Some(token);
            }

            if cfg.profiles.is_empty() {
                cfg.default_profile = Some(profile_name.clone());
            }
            cfg.profiles.insert(profile_name.clone(), profile);
            let written = config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", written.display());
            eprintln!("  Profile: {profile_name}");
            eprintln!("\n  Test it: hivefleet farms list --profile {profile_name}");
            Ok(())
        }

        // ── Validate ────────────────────────────────────────────────
        ConfigCommand::Validate => {
            let fleet = config::resolve_fleet_config(global)?;
            let account = validate_access_token(&fleet).await?;
            let out = output::render_single(
                &global.output,
                &account,
                |a| {
                    format!(
                        "✓ access token valid\n  Account: {}{}",
                        a.login,
                        a.name.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()
                    )
                },
                |a| a.login.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            redact(&mut cfg);
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |c| {
                c.default_profile_name().to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile_name();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: hivefleet config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(&cfg, profile_name));
            }

            let token = Password::new()
                .with_prompt("Access token")
                .interact()
                .map_err(prompt_err)?;
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "access_token".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            store_access_token(&profile_name, &token)?;
            eprintln!("✓ Access token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_token() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                access_token: Some("secret-token".into()),
                access_token_env: Some("HIVE_TOKEN".into()),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn redacted_view_hides_plaintext_token() {
        let text = format_config_redacted(&config_with_token());

        assert!(!text.contains("secret-token"));
        assert!(text.contains("access_token = \"****\""));
        assert!(text.contains("access_token_env = \"HIVE_TOKEN\""));
        assert!(text.contains("[profiles.home]"));
    }

    #[test]
    fn redact_masks_structured_output() {
        let mut cfg = config_with_token();

        redact(&mut cfg);

        assert_eq!(cfg.profiles["home"].access_token.as_deref(), Some(MASK));
    }
}
