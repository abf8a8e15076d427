// ── Core error types ──
//
// User-facing errors from inboxguard-core. Consumers never see raw HTTP
// bodies or JSON parse failures; the `From<inboxguard_api::Error>` impl
// translates transport-layer errors into engine-level variants.
//
// A partially applied plan is NOT an error: per-change failures are data
// inside `ApplyResult`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Credential errors ────────────────────────────────────────────
    #[error("{operation} requires an API credential, but none is configured")]
    MissingCredential { operation: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String, status: Option<u16> },

    // ── Network errors ───────────────────────────────────────────────
    #[error("Request failed after {attempts} attempt(s): {message}")]
    Transient {
        attempts: u32,
        status: Option<u16>,
        message: String,
    },

    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── Provider errors ──────────────────────────────────────────────
    #[error("Zone not found: {zone}")]
    ZoneNotFound { zone: String },

    #[error("Record already exists: {message}")]
    Conflict { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// Provider-specific error code, when the body carried one.
        code: Option<i64>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Lookup / storage errors ──────────────────────────────────────
    #[error("DNS lookup for {name} failed: {message}")]
    Lookup { name: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// Network failure, timeout, or 5xx that survived the retry budget.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::ConnectionFailed { .. })
    }

    /// Missing or rejected credential.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::AuthenticationFailed { .. }
        )
    }

    /// A create collided with an existing identical record.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ZoneNotFound { .. } | Self::Api {
                status: Some(404),
                ..
            }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<inboxguard_api::Error> for CoreError {
    fn from(err: inboxguard_api::Error) -> Self {
        if err.is_conflict() {
            return CoreError::Conflict {
                message: err.to_string(),
            };
        }
        match err {
            inboxguard_api::Error::Validation { field, reason } => CoreError::ValidationFailed {
                message: format!("{field}: {reason}"),
            },
            inboxguard_api::Error::MissingCredential { operation } => {
                CoreError::MissingCredential { operation }
            }
            inboxguard_api::Error::Unauthorized { status, message } => {
                CoreError::AuthenticationFailed {
                    message,
                    status: Some(status),
                }
            }
            inboxguard_api::Error::Transient {
                attempts,
                status,
                message,
            } => CoreError::Transient {
                attempts,
                status,
                message,
            },
            inboxguard_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            inboxguard_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            inboxguard_api::Error::Api {
                status,
                message,
                code,
                ..
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            inboxguard_api::Error::Deserialization { message, .. } => {
                CoreError::Internal(format!("unexpected response shape: {message}"))
            }
        }
    }
}
