//! Profile selection and flag overrides on top of `inboxguard-config`.
//!
//! The config crate turns a profile into an `EngineConfig`; this module
//! picks the profile and layers `--provider-url`, `--api-token` and the
//! other global flags over it.

use std::path::PathBuf;

use secrecy::SecretString;

use inboxguard_config::{Config, Profile};
use inboxguard_core::{EngineConfig, store::FileStore};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Name of the local state file under the data directory.
const STATE_FILE: &str = "state.json";

// ── Loading ─────────────────────────────────────────────────────────

/// `--config` when given, the platform default otherwise.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(inboxguard_config::config_path)
}

pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(inboxguard_config::load_config_from(&config_path(global))?)
}

/// Persisted CLI state: selected domain and cached metric history.
pub fn state_store() -> FileStore {
    FileStore::new(inboxguard_config::data_dir().join(STATE_FILE))
}

// ── Profile resolution ───────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Apply URL / TLS / timeout flags to a profile before it is translated.
fn with_flag_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref url) = global.provider_url {
        profile.provider_url.clone_from(url);
    }
    if let Some(ref url) = global.metrics_url {
        profile.metrics_url = Some(url.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(ms) = global.timeout_ms {
        profile.timeout_ms = Some(ms);
    }
    if let Some(retries) = global.retries {
        profile.retries = Some(retries);
    }
    profile
}

/// Build the engine configuration from the config file, the active
/// profile and CLI overrides. Returns the profile name alongside.
///
/// With no matching profile, `--provider-url` alone is enough for a
/// one-off run against a default profile.
pub fn build_engine_config(global: &GlobalOpts) -> Result<(EngineConfig, String), CliError> {
    let cfg = load_config(global)?;
    let profile_name = active_profile_name(global, &cfg);

    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None if global.provider_url.is_some() => Profile::default(),
        None => {
            return Err(CliError::NoConfig {
                path: config_path(global).display().to_string(),
            });
        }
    };

    let profile = with_flag_overrides(base, global);
    let mut engine =
        inboxguard_config::profile_to_engine_config(&profile, &profile_name, &cfg.defaults)?;

    // Flag tokens win over every profile source.
    if let Some(ref token) = global.api_token {
        engine.provider.credential = Some(SecretString::from(token.clone()));
    }
    if let (Some(metrics), Some(token)) = (engine.metrics.as_mut(), global.metrics_token.as_ref()) {
        metrics.credential = Some(SecretString::from(token.clone()));
    }

    tracing::debug!(
        profile = %profile_name,
        provider = %engine.provider.base_url,
        metrics = engine.metrics.is_some(),
        write_access = engine.provider.credential.is_some(),
        "engine config resolved"
    );
    Ok((engine, profile_name))
}
