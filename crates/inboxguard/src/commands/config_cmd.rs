//! Config subcommand handlers.

use std::path::Path;
use std::str::FromStr;

use dialoguer::{Input, Select};

use inboxguard_config::{Config, Profile, Secret};
use inboxguard_core::{DmarcPolicy, domain};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

const SETTABLE_KEYS: &str = "provider_url, metrics_url, zone_root, api_token, api_token_env, \
     metrics_token, metrics_token_env, manage_spf, spf_includes, spf_mechanisms, spf_all, \
     manage_dmarc, dmarc_policy, dmarc_rua, dmarc_pct, ttl, reconcile_extras, timeout_ms, \
     retries, ca_cert, insecure";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut out = cfg.clone();
    for profile in out.profiles.values_mut() {
        if profile.api_token.is_some() {
            profile.api_token = Some(MASK.into());
        }
        if profile.metrics_token.is_some() {
            profile.metrics_token = Some(MASK.into());
        }
    }
    out
}

fn save_config(cfg: &Config, path: &Path) -> Result<(), CliError> {
    inboxguard_config::save_config_to(cfg, path)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_value<T: FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}, got '{value}'"),
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// An empty value clears an optional key.
fn optional(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_owned())
}

/// Set one profile key from its string form. Dashes and underscores are
/// interchangeable in key names.
fn apply_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "provider_url" => profile.provider_url = value.trim().to_owned(),
        "metrics_url" => profile.metrics_url = optional(value),
        "zone_root" => {
            profile.zone_root = match optional(value) {
                Some(v) => Some(domain::normalize(&v)?),
                None => None,
            };
        }
        "api_token" => profile.api_token = optional(value),
        "api_token_env" => profile.api_token_env = optional(value),
        "metrics_token" => profile.metrics_token = optional(value),
        "metrics_token_env" => profile.metrics_token_env = optional(value),
        "manage_spf" => profile.manage_spf = Some(parse_value(key, value, "'true' or 'false'")?),
        "spf_includes" => profile.spf_includes = parse_list(value),
        "spf_mechanisms" => profile.spf_mechanisms = parse_list(value),
        "spf_all" => profile.spf_all = optional(value),
        "manage_dmarc" => {
            profile.manage_dmarc = Some(parse_value(key, value, "'true' or 'false'")?);
        }
        "dmarc_policy" => {
            profile.dmarc_policy = Some(parse_value::<DmarcPolicy>(
                key,
                value,
                "one of none, quarantine, reject",
            )?);
        }
        "dmarc_rua" => profile.dmarc_rua = optional(value),
        "dmarc_pct" => profile.dmarc_pct = Some(parse_value(key, value, "a number 0-100")?),
        "ttl" => profile.ttl = Some(parse_value(key, value, "a number of seconds")?),
        "reconcile_extras" => {
            profile.reconcile_extras = parse_value(key, value, "'true' or 'false'")?;
        }
        "timeout_ms" => {
            profile.timeout_ms = Some(parse_value(key, value, "a number of milliseconds")?);
        }
        "retries" => profile.retries = Some(parse_value(key, value, "a number")?),
        "ca_cert" => profile.ca_cert = optional(value).map(Into::into),
        "insecure" => profile.insecure = Some(parse_value(key, value, "'true' or 'false'")?),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            });
        }
    }
    Ok(())
}

fn require_profile<'a>(cfg: &'a Config, name: &str) -> Result<&'a Profile, CliError> {
    cfg.profiles
        .get(name)
        .ok_or_else(|| CliError::ProfileNotFound {
            name: name.into(),
            available: config::available_profiles(cfg),
        })
}

/// Ask where a token goes. Returns the value to keep in the config file,
/// `None` when it went to the keyring.
fn store_token(secret: Secret, profile_name: &str, token: String) -> Result<Option<String>, CliError> {
    let choices = &["Store in system keyring (recommended)", "Save to config file (plaintext)"];
    let selection = Select::new()
        .with_prompt("Where to store the token?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    if selection == 0 {
        inboxguard_config::store_secret(secret, profile_name, &token)?;
        eprintln!("   ✓ Token stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(token))
    }
}

// ── Init ────────────────────────────────────────────────────────────

fn init(path: &Path) -> Result<(), CliError> {
    eprintln!("inboxguard configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let mut cfg = inboxguard_config::load_config_from(path)?;

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let zone: String = Input::new()
        .with_prompt("Zone root (e.g. example.com)")
        .interact_text()
        .map_err(prompt_err)?;
    let zone_root = domain::normalize(&zone)?;

    let provider_url: String = Input::new()
        .with_prompt("DNS provider API URL")
        .default(inboxguard_config::DEFAULT_PROVIDER_URL.into())
        .interact_text()
        .map_err(prompt_err)?;

    let policies = &["quarantine", "reject", "none"];
    let policy_idx = Select::new()
        .with_prompt("DMARC policy to enforce")
        .items(policies)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let dmarc_policy = policies
        .get(policy_idx)
        .and_then(|p| DmarcPolicy::from_str(p).ok());

    let token = rpassword::prompt_password("API token (empty for read-only): ").map_err(prompt_err)?;
    let api_token = if token.is_empty() {
        None
    } else {
        store_token(Secret::ApiToken, &profile_name, token)?
    };

    let metrics_url: String = Input::new()
        .with_prompt("Metrics service URL (empty to skip)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let metrics_url = optional(&metrics_url);
    let metrics_token = if metrics_url.is_some() {
        let key = rpassword::prompt_password("Metrics key: ").map_err(prompt_err)?;
        if key.is_empty() {
            None
        } else {
            store_token(Secret::MetricsToken, &profile_name, key)?
        }
    } else {
        None
    };

    let profile = Profile {
        provider_url,
        metrics_url,
        zone_root: Some(zone_root),
        api_token,
        metrics_token,
        dmarc_policy,
        ..Profile::default()
    };
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    save_config(&cfg, path)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: inboxguard check");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);

    match args.command {
        ConfigCommand::Init => init(&path),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config(global)?);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| serde_yaml::to_string(c).unwrap_or_default(),
                |c| c.default_profile.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config(global)?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            apply_key(profile, &key, &value)?;
            profile.desired_state()?;

            save_config(&cfg, &path)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config(global)?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: inboxguard config init");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    let zone = profile.zone_root.as_deref().unwrap_or("-");
                    println!("{name}{marker}\t{zone}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config(global)?;
            require_profile(&cfg, &name)?;
            cfg.default_profile = Some(name.clone());
            save_config(&cfg, &path)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetToken { profile, metrics } => {
            let cfg = config::load_config(global)?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            require_profile(&cfg, &profile_name)?;

            let (secret, label) = if metrics {
                (Secret::MetricsToken, "Metrics key: ")
            } else {
                (Secret::ApiToken, "API token: ")
            };
            let value = rpassword::prompt_password(label).map_err(prompt_err)?;
            if value.is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            inboxguard_config::store_secret(secret, &profile_name, &value)?;
            eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_parses_typed_keys() {
        let mut p = Profile::default();
        apply_key(&mut p, "dmarc-policy", "reject").unwrap();
        apply_key(&mut p, "spf_includes", "_spf.google.com, mailgun.org").unwrap();
        apply_key(&mut p, "ttl", "600").unwrap();
        apply_key(&mut p, "zone_root", "Example.COM.").unwrap();
        assert_eq!(p.dmarc_policy, Some(DmarcPolicy::Reject));
        assert_eq!(p.spf_includes, vec!["_spf.google.com", "mailgun.org"]);
        assert_eq!(p.ttl, Some(600));
        assert_eq!(p.zone_root.as_deref(), Some("example.com"));
    }

    #[test]
    fn set_rejects_bad_values_and_keys() {
        let mut p = Profile::default();
        assert!(matches!(
            apply_key(&mut p, "dmarc_pct", "lots"),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            apply_key(&mut p, "controller", "x"),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn empty_value_clears_optional_key() {
        let mut p = Profile {
            metrics_url: Some("https://metrics.example".into()),
            ..Profile::default()
        };
        apply_key(&mut p, "metrics_url", "").unwrap();
        assert_eq!(p.metrics_url, None);
    }

    #[test]
    fn show_masks_tokens() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_token: Some("secret-token".into()),
                ..Profile::default()
            },
        );
        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["default"].api_token.as_deref(), Some(MASK));
        assert_eq!(shown.profiles["default"].metrics_token, None);
    }
}
