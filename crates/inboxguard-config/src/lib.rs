//! Configuration for the inboxguard CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `inboxguard_core::EngineConfig`. The CLI layers
//! flag overrides on top of what this crate produces.

use std::collections::BTreeMap;
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
use url::Url;

use inboxguard_core::{
    ClientConfig, CredentialHeader, DesiredStateConfig, DkimSelector, DmarcPolicy, EngineConfig,
    RetryPolicy, TlsMode,
};

/// Keyring service name for stored tokens.
pub const KEYRING_SERVICE: &str = "inboxguard";
/// Environment prefix for config overrides. Nested keys use `__`.
pub const ENV_PREFIX: &str = "INBOXGUARD_";
/// Cloudflare v4-style API root used when a profile names none.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.cloudflare.com/client/v4";

// Env vars read directly as credentials or CLI flags, never as config keys.
const RESERVED_ENV: [&str; 5] = ["api_token", "metrics_token", "config", "profile", "log"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The requested profile, else `default_profile`, else `"default"`.
    pub fn profile<'a>(&'a self, requested: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Consult the system keyring while resolving tokens.
    #[serde(default = "default_true")]
    pub keyring: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            keyring: true,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout_ms() -> u64 {
    12_000
}
fn default_retries() -> u32 {
    2
}
fn default_true() -> bool {
    true
}
fn default_provider_url() -> String {
    DEFAULT_PROVIDER_URL.into()
}

/// A named zone profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// DNS provider API root.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// Metrics service root. Alerts and spam checks are unavailable without it.
    pub metrics_url: Option<String>,

    /// Zone apex used when a command is given no domain.
    pub zone_root: Option<String>,

    /// Provider API token (plaintext; prefer keyring or env var).
    pub api_token: Option<String>,

    /// Environment variable holding the provider API token.
    pub api_token_env: Option<String>,

    /// Metrics API key (plaintext; prefer keyring or env var).
    pub metrics_token: Option<String>,

    /// Environment variable holding the metrics API key.
    pub metrics_token_env: Option<String>,

    pub manage_spf: Option<bool>,

    #[serde(default)]
    pub spf_includes: Vec<String>,

    #[serde(default)]
    pub spf_mechanisms: Vec<String>,

    pub spf_all: Option<String>,

    pub manage_dmarc: Option<bool>,

    pub dmarc_policy: Option<DmarcPolicy>,

    pub dmarc_rua: Option<String>,

    pub dmarc_pct: Option<u8>,

    /// DKIM selectors, written as `[[profiles.<name>.dkim]]` tables.
    #[serde(default)]
    pub dkim: Vec<DkimSelector>,

    pub ttl: Option<u32>,

    #[serde(default)]
    pub reconcile_extras: bool,

    pub timeout_ms: Option<u64>,

    pub retries: Option<u32>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification (test endpoints only).
    pub insecure: Option<bool>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            metrics_url: None,
            zone_root: None,
            api_token: None,
            api_token_env: None,
            metrics_token: None,
            metrics_token_env: None,
            manage_spf: None,
            spf_includes: Vec::new(),
            spf_mechanisms: Vec::new(),
            spf_all: None,
            manage_dmarc: None,
            dmarc_policy: None,
            dmarc_rua: None,
            dmarc_pct: None,
            dkim: Vec::new(),
            ttl: None,
            reconcile_extras: false,
            timeout_ms: None,
            retries: None,
            ca_cert: None,
            insecure: None,
        }
    }
}

impl Profile {
    /// The desired zone state this profile describes.
    pub fn desired_state(&self) -> Result<DesiredStateConfig, ConfigError> {
        let base = DesiredStateConfig::default();
        let desired = DesiredStateConfig {
            manage_spf: self.manage_spf.unwrap_or(base.manage_spf),
            spf_includes: self.spf_includes.clone(),
            spf_mechanisms: self.spf_mechanisms.clone(),
            spf_all: self.spf_all.clone().unwrap_or(base.spf_all),
            manage_dmarc: self.manage_dmarc.unwrap_or(base.manage_dmarc),
            dmarc_policy: self.dmarc_policy.unwrap_or(base.dmarc_policy),
            dmarc_rua: self.dmarc_rua.clone(),
            dmarc_pct: self.dmarc_pct,
            dkim_selectors: self.dkim.clone(),
            ttl: self.ttl.unwrap_or(base.ttl),
            reconcile_extras: self.reconcile_extras,
        };
        desired.validate().map_err(|e| ConfigError::Validation {
            field: "desired state".into(),
            reason: e.to_string(),
        })?;
        Ok(desired)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "inboxguard", "inboxguard").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("inboxguard");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for cached state (metric history, selected domain).
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("com", "inboxguard", "inboxguard").map_or_else(
        || PathBuf::from(".inboxguard"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then `INBOXGUARD_*` env vars.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&RESERVED_ENV).split("__"))
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment(path).extract()?)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Where a resolved secret came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Flag,
    Env(String),
    Keyring,
    Plaintext,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag => f.write_str("flag"),
            Self::Env(name) => write!(f, "env:{name}"),
            Self::Keyring => f.write_str("keyring"),
            Self::Plaintext => f.write_str("config file"),
        }
    }
}

/// Which secret a profile is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secret {
    /// Privileged DNS provider token.
    ApiToken,
    /// Metrics service key.
    MetricsToken,
}

impl Secret {
    fn keyring_user(self, profile_name: &str) -> String {
        match self {
            Self::ApiToken => format!("{profile_name}/api-token"),
            Self::MetricsToken => format!("{profile_name}/metrics-token"),
        }
    }

    fn fields(self, profile: &Profile) -> (Option<&str>, Option<&str>) {
        match self {
            Self::ApiToken => (profile.api_token_env.as_deref(), profile.api_token.as_deref()),
            Self::MetricsToken => (
                profile.metrics_token_env.as_deref(),
                profile.metrics_token.as_deref(),
            ),
        }
    }
}

/// Resolve a secret: profile env var, then keyring (when enabled), then
/// plaintext. `None` is not an error; read-only commands work without it.
pub fn resolve_secret(
    secret: Secret,
    profile: &Profile,
    profile_name: &str,
    use_keyring: bool,
) -> Option<(SecretString, CredentialSource)> {
    let (env_name, plaintext) = secret.fields(profile);

    // 1. Profile's *_env → env var lookup
    if let Some(env_name) = env_name {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Some((SecretString::from(val), CredentialSource::Env(env_name.into())));
            }
        }
    }

    // 2. System keyring
    if use_keyring {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &secret.keyring_user(profile_name)) {
            if let Ok(value) = entry.get_password() {
                return Some((SecretString::from(value), CredentialSource::Keyring));
            }
        }
    }

    // 3. Plaintext in config
    plaintext.map(|v| (SecretString::from(v.to_owned()), CredentialSource::Plaintext))
}

/// Store a secret in the system keyring.
pub fn store_secret(secret: Secret, profile_name: &str, value: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &secret.keyring_user(profile_name))?;
    entry.set_password(value)?;
    Ok(())
}

/// Remove a secret from the system keyring. Absent entries are fine.
pub fn delete_secret(secret: Secret, profile_name: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &secret.keyring_user(profile_name))?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── EngineConfig translation ────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    // A base without a trailing slash would drop its last segment on join.
    let normalized = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    let url: Url = normalized.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

fn client_config(profile: &Profile, defaults: &Defaults, base_url: Url) -> ClientConfig {
    let timeout = Duration::from_millis(profile.timeout_ms.unwrap_or(defaults.timeout_ms));
    let retry = RetryPolicy {
        retries: profile.retries.unwrap_or(defaults.retries),
        ..RetryPolicy::default()
    };
    let mut cfg = ClientConfig::new(base_url).with_timeout(timeout).with_retry(retry);
    cfg.tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };
    cfg
}

/// Build an `EngineConfig` from a profile, with credentials from the
/// profile's chain only. No CLI flag overrides.
pub fn profile_to_engine_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<EngineConfig, ConfigError> {
    let mut provider = client_config(
        profile,
        defaults,
        parse_url("provider_url", &profile.provider_url)?,
    );
    provider.credential = resolve_secret(Secret::ApiToken, profile, profile_name, defaults.keyring)
        .map(|(s, _)| s);

    let metrics = profile
        .metrics_url
        .as_deref()
        .map(|raw| {
            let mut cfg = client_config(profile, defaults, parse_url("metrics_url", raw)?);
            cfg.credential_header = CredentialHeader::Named("X-API-Key".into());
            cfg.credential =
                resolve_secret(Secret::MetricsToken, profile, profile_name, defaults.keyring)
                    .map(|(s, _)| s);
            Ok::<_, ConfigError>(cfg)
        })
        .transpose()?;

    Ok(EngineConfig {
        provider,
        metrics,
        desired: profile.desired_state()?,
        default_domain: profile.zone_root.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "prod"

[defaults]
output = "json"
keyring = false

[profiles.prod]
provider_url = "https://dns.example.test/v4"
metrics_url = "https://metrics.example.test"
zone_root = "example.com"
api_token_env = "IG_TEST_TOKEN"
spf_includes = ["_spf.esp.example"]
dmarc_policy = "reject"
dmarc_rua = "dmarc@example.com"
retries = 4

[[profiles.prod.dkim]]
host = "s1._domainkey"
target = "s1.dkim.esp.example"
"#;

    #[test]
    fn loads_profile_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            assert_eq!(cfg.defaults.output, "json");
            assert_eq!(cfg.defaults.timeout_ms, 12_000);
            let (name, profile) = cfg.profile(None).unwrap();
            assert_eq!(name, "prod");
            assert_eq!(profile.dmarc_policy, Some(DmarcPolicy::Reject));
            assert_eq!(profile.dkim.len(), 1);
            assert_eq!(profile.provider_url, "https://dns.example.test/v4");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("INBOXGUARD_DEFAULTS__OUTPUT", "yaml");
            jail.set_env("INBOXGUARD_PROFILES__PROD__ZONE_ROOT", "example.org");
            // Credential variables are not config keys.
            jail.set_env("INBOXGUARD_API_TOKEN", "secret");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.defaults.output, "yaml");
            assert_eq!(cfg.profiles["prod"].zone_root.as_deref(), Some("example.org"));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_| {
            let cfg = load_config_from(Path::new("nope.toml")).unwrap();
            assert_eq!(cfg, Config::default());
            assert!(matches!(
                cfg.profile(None),
                Err(ConfigError::ProfileNotFound { .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn engine_config_from_profile() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("IG_TEST_TOKEN", "tok-1");
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            let (name, profile) = cfg.profile(None).unwrap();

            let engine = profile_to_engine_config(profile, name, &cfg.defaults).unwrap();

            assert_eq!(engine.provider.base_url.as_str(), "https://dns.example.test/v4/");
            assert_eq!(
                engine.provider.credential.as_ref().unwrap().expose_secret(),
                "tok-1"
            );
            assert_eq!(engine.provider.retry.retries, 4);
            let metrics = engine.metrics.unwrap();
            assert_eq!(
                metrics.credential_header,
                CredentialHeader::Named("X-API-Key".into())
            );
            assert!(metrics.credential.is_none());
            assert_eq!(engine.desired.dmarc_policy, DmarcPolicy::Reject);
            assert_eq!(engine.default_domain.as_deref(), Some("example.com"));
            Ok(())
        });
    }

    #[test]
    fn env_token_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("IG_TOKEN_A", "from-env");
            let profile = Profile {
                api_token_env: Some("IG_TOKEN_A".into()),
                api_token: Some("from-file".into()),
                ..Profile::default()
            };
            let (secret, source) = resolve_secret(Secret::ApiToken, &profile, "p", false).unwrap();
            assert_eq!(secret.expose_secret(), "from-env");
            assert_eq!(source, CredentialSource::Env("IG_TOKEN_A".into()));
            Ok(())
        });
    }

    #[test]
    fn plaintext_is_last_resort() {
        let profile = Profile {
            api_token_env: Some("IG_TOKEN_UNSET_FOR_TEST".into()),
            api_token: Some("from-file".into()),
            ..Profile::default()
        };
        let (secret, source) = resolve_secret(Secret::ApiToken, &profile, "p", false).unwrap();
        assert_eq!(secret.expose_secret(), "from-file");
        assert_eq!(source, CredentialSource::Plaintext);

        assert!(resolve_secret(Secret::MetricsToken, &profile, "p", false).is_none());
    }

    #[test]
    fn bad_urls_rejected() {
        let profile = Profile {
            provider_url: "ftp://dns.example.test".into(),
            ..Profile::default()
        };
        let err = profile_to_engine_config(&profile, "p", &Defaults {
            keyring: false,
            ..Defaults::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "provider_url"));
    }

    #[test]
    fn invalid_desired_state_rejected() {
        let profile = Profile {
            dmarc_pct: Some(150),
            ..Profile::default()
        };
        assert!(matches!(
            profile.desired_state(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                zone_root: Some("example.com".into()),
                ..Profile::default()
            },
        );

        save_config_to(&cfg, &path).unwrap();
        let loaded: Config = Figment::new()
            .merge(Toml::file(&path))
            .extract()
            .unwrap();
        assert_eq!(loaded, cfg);
    }
}
