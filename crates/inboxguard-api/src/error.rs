use thiserror::Error;

/// Top-level error type for the `inboxguard-api` crate.
///
/// Mirrors the engine's failure taxonomy at the transport layer:
/// validation, authorization, transient network failure (already retried),
/// and permanent API rejection. `inboxguard-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Validation ──────────────────────────────────────────────────
    /// Malformed or empty input, rejected before any request is made.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Authentication ──────────────────────────────────────────────
    /// A privileged call was attempted without a configured credential.
    /// Raised locally; no request is sent.
    #[error("{operation} requires an API credential, but none is configured")]
    MissingCredential { operation: String },

    /// The remote API rejected the credential (HTTP 401/403).
    #[error("Authentication rejected (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Network failure, timeout, or 5xx response that persisted through
    /// every retry the policy allowed.
    #[error("Transient failure after {attempts} attempt(s): {message}")]
    Transient {
        attempts: u32,
        status: Option<u16>,
        message: String,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failure.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-retryable 4xx response, with the parsed body when available.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<i64>,
        body: Option<serde_json::Value>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Provider error codes meaning "an identical record already exists".
const RECORD_EXISTS_CODES: [i64; 2] = [81057, 81058];

impl Error {
    /// Returns `true` if this error came from exhausting the retry budget.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns `true` if the credential was absent or rejected.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::Unauthorized { .. }
        )
    }

    /// Returns `true` if a create collided with an already-existing record.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Api { status: 409, .. } => true,
            Self::Api {
                code: Some(code), ..
            } => RECORD_EXISTS_CODES.contains(code),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Transient { status, .. } => *status,
            _ => None,
        }
    }
}
