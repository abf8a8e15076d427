use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::Error;

/// Whether a call needs the privileged credential.
///
/// Marker enum (no data) -- the secret itself lives in the client.
/// `Privileged` calls fail locally with [`Error::MissingCredential`]
/// when no credential is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read-only call; the credential is attached if present.
    Read,
    /// Mutating call; the credential is mandatory.
    Privileged,
}

/// How the credential is presented to the remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialHeader {
    /// `Authorization: Bearer <token>` (DNS provider tokens).
    #[default]
    Bearer,
    /// A custom header carrying the raw key, e.g. `X-API-Key`.
    Named(String),
}

impl CredentialHeader {
    /// Attach `secret` to the request builder, marking the value sensitive.
    pub(crate) fn apply(
        &self,
        req: reqwest::RequestBuilder,
        secret: &SecretString,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let raw = match self {
            Self::Bearer => format!("Bearer {}", secret.expose_secret()),
            Self::Named(_) => secret.expose_secret().to_owned(),
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|e| Error::Validation {
            field: "credential".into(),
            reason: format!("not a valid header value: {e}"),
        })?;
        value.set_sensitive(true);

        Ok(match self {
            Self::Bearer => req.header(AUTHORIZATION, value),
            Self::Named(name) => req.header(name.as_str(), value),
        })
    }
}
