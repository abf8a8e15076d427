//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use inboxguard_config::ConfigError;
use inboxguard_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TRANSIENT: i32 = 8;
    pub const PRESEND_BLOCKED: i32 = 10;
    pub const PARTIAL_APPLY: i32 = 11;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}")]
    #[diagnostic(
        code(inboxguard::connection_failed),
        help("Check the URL and your network.\nReason: {reason}")
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request failed after {attempts} attempt(s): {message}")]
    #[diagnostic(
        code(inboxguard::transient),
        help("The service kept failing. Retry later, or raise --retries / --timeout-ms.")
    )]
    Transient { attempts: u32, message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(inboxguard::auth_failed),
        help(
            "Verify the API token for profile '{profile}'.\n\
             Run: inboxguard config set-token --profile {profile}"
        )
    )]
    AuthFailed { message: String, profile: String },

    #[error("{operation} needs a DNS provider API token")]
    #[diagnostic(
        code(inboxguard::no_credentials),
        help(
            "Store one with: inboxguard config set-token\n\
             Or set the INBOXGUARD_API_TOKEN environment variable."
        )
    )]
    NoCredentials { operation: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(inboxguard::not_found),
        help("Check that the zone exists at the DNS provider and the token can read it.")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(inboxguard::api_error))]
    ApiError { message: String, status: Option<u16> },

    // ── Outcomes ─────────────────────────────────────────────────────
    #[error("Send blocked: {reasons} unresolved issue(s)")]
    #[diagnostic(
        code(inboxguard::presend_blocked),
        help("Fix the checklist items, or re-run with --override and acknowledge each one.")
    )]
    PresendBlocked { reasons: usize },

    #[error("{failed} of {attempted} change(s) failed")]
    #[diagnostic(
        code(inboxguard::partial_apply),
        help("Applied changes were kept. Re-run autofix to retry the rest.")
    )]
    PartialApply { failed: usize, attempted: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(inboxguard::validation))]
    Validation { field: String, reason: String },

    #[error("No domain given")]
    #[diagnostic(
        code(inboxguard::no_domain),
        help(
            "Pass a domain, select one with: inboxguard domain use <name>\n\
             or set zone_root in your profile."
        )
    )]
    NoDomain,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(inboxguard::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: inboxguard config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(inboxguard::no_config),
        help(
            "Create one with: inboxguard config init\n\
             Expected at: {path}\n\
             Or pass --provider-url for a one-off run."
        )
    )]
    NoConfig { path: String },

    #[error("{0}")]
    #[diagnostic(
        code(inboxguard::metrics_unavailable),
        help("Set metrics_url in your profile or pass --metrics-url.")
    )]
    MetricsUnavailable(String),

    #[error(transparent)]
    #[diagnostic(code(inboxguard::config))]
    Config(Box<figment::Error>),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(inboxguard::config))]
    ConfigInvalid(String),

    #[error("Local state error: {0}")]
    #[diagnostic(code(inboxguard::storage))]
    Storage(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(inboxguard::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(inboxguard::internal))]
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
            Self::Transient { .. } => exit_code::TRANSIENT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoDomain | Self::NonInteractiveRequiresYes { .. } => {
                exit_code::USAGE
            }
            Self::PresendBlocked { .. } => exit_code::PRESEND_BLOCKED,
            Self::PartialApply { .. } => exit_code::PARTIAL_APPLY,
            _ => exit_code::GENERAL,
        }
    }

    /// Name the profile in auth help text once it is known.
    pub fn with_profile(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                message,
                profile: name.to_owned(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::MissingCredential { operation } => CliError::NoCredentials { operation },

            CoreError::AuthenticationFailed { message, .. } => CliError::AuthFailed {
                message,
                profile: "current".into(),
            },

            CoreError::Transient {
                attempts, message, ..
            } => CliError::Transient { attempts, message },

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::ZoneNotFound { zone } => CliError::NotFound {
                resource_type: "zone".into(),
                identifier: zone,
            },

            CoreError::Conflict { message } => CliError::ApiError {
                message,
                status: Some(409),
            },

            CoreError::Api {
                message, status, ..
            } => CliError::ApiError { message, status },

            CoreError::Lookup { name, message } => CliError::ConnectionFailed {
                url: format!("dns:{name}"),
                reason: message,
            },

            CoreError::Storage { message } => CliError::Storage(message),

            CoreError::Config { message } => CliError::MetricsUnavailable(message),

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::ConfigInvalid(other.to_string()),
        }
    }
}
