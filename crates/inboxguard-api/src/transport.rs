// Resilient transport shared by the DNS provider and metrics clients.
//
// Every outbound call goes through `ResilientClient::execute`: bounded
// retries with exponential backoff for network failures and 5xx
// responses, immediate typed errors for 4xx, and a local fast-fail when a
// privileged call has no credential configured.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::Error;
use crate::auth::{Access, CredentialHeader};

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (test endpoints only).
    DangerAcceptInvalid,
}

/// Bounded retry with exponential backoff (`base_delay * 2^attempt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` disables retrying.
    pub retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt + 1` (attempt is zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Explicit client configuration, passed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub credential: Option<SecretString>,
    pub credential_header: CredentialHeader,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub tls: TlsMode,
}

impl ClientConfig {
    /// Config with default timeout (12s), retry policy, and TLS settings.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            credential: None,
            credential_header: CredentialHeader::default(),
            timeout: Duration::from_millis(12_000),
            retry: RetryPolicy::default(),
            tls: TlsMode::default(),
        }
    }

    pub fn with_credential(mut self, credential: SecretString) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a `reqwest::Client` from this config.
    fn build_http(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .user_agent(concat!("inboxguard/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Attempt outcome ──────────────────────────────────────────────────

/// Result of a single HTTP attempt that did not succeed.
enum Failure {
    /// Network error, timeout, or 5xx: eligible for retry.
    Retryable {
        status: Option<u16>,
        message: String,
    },
    /// Anything else: surfaced immediately.
    Permanent(Error),
}

// ── Client ───────────────────────────────────────────────────────────

/// Timeout- and retry-aware HTTP client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    http: reqwest::Client,
    base_url: Url,
    credential: Option<SecretString>,
    credential_header: CredentialHeader,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ResilientClient {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let http = config.build_http()?;
        Ok(Self::with_http(http, config))
    }

    /// Wrap an existing `reqwest::Client` (tests, shared pools).
    pub fn with_http(http: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            http,
            base_url: normalize_base_url(config.base_url),
            credential: config.credential,
            credential_header: config.credential_header,
            timeout: config.timeout,
            retry: config.retry,
        }
    }

    /// Whether a privileged call could be attempted.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    // ── Typed verbs ──────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        access: Access,
    ) -> Result<T, Error> {
        let body = self
            .execute(Method::GET, path, params, None, access)
            .await?;
        decode(body)
    }

    pub async fn send<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        access: Access,
    ) -> Result<T, Error> {
        let json = serde_json::to_value(body).map_err(|e| Error::Validation {
            field: "body".into(),
            reason: e.to_string(),
        })?;
        let raw = self
            .execute(method, path, &[], Some(&json), access)
            .await?;
        decode(raw)
    }

    /// Send a request whose success body is irrelevant (e.g. DELETE).
    pub async fn send_empty(&self, method: Method, path: &str, access: Access) -> Result<(), Error> {
        self.execute(method, path, &[], None, access).await?;
        Ok(())
    }

    // ── Retry loop ───────────────────────────────────────────────────

    /// Run one logical call, retrying transient failures per the policy.
    ///
    /// Returns the raw success body. The caller only ever sees the final
    /// outcome; intermediate failures are logged at `warn`.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&serde_json::Value>,
        access: Access,
    ) -> Result<String, Error> {
        if access == Access::Privileged && self.credential.is_none() {
            return Err(Error::MissingCredential {
                operation: format!("{method} {}", path.trim_start_matches('/')),
            });
        }

        let url = self.url(path)?;
        let mut attempt: u32 = 0;

        loop {
            debug!(%method, %url, attempt, "sending request");

            match self.attempt(&method, &url, params, body).await {
                Ok(text) => return Ok(text),
                Err(Failure::Permanent(err)) => return Err(err),
                Err(Failure::Retryable { status, message }) => {
                    if attempt >= self.retry.retries {
                        return Err(Error::Transient {
                            attempts: attempt + 1,
                            status,
                            message,
                        });
                    }

                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        %method,
                        %url,
                        attempt,
                        status = status.unwrap_or_default(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %message,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &Url,
        params: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<String, Failure> {
        let mut req = self
            .http
            .request(method.clone(), url.clone())
            .timeout(self.timeout);

        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(json) = body {
            req = req.json(json);
        }
        if let Some(ref secret) = self.credential {
            req = self
                .credential_header
                .apply(req, secret)
                .map_err(Failure::Permanent)?;
        }

        let resp = req.send().await.map_err(|e| self.classify_transport(&e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.classify_transport(&e))?;

        if status.is_success() {
            Ok(text)
        } else if status.is_server_error() {
            Err(Failure::Retryable {
                status: Some(status.as_u16()),
                message: error_message(status, &text),
            })
        } else {
            Err(Failure::Permanent(client_error(status, &text)))
        }
    }

    fn classify_transport(&self, err: &reqwest::Error) -> Failure {
        if err.is_builder() {
            return Failure::Permanent(Error::Validation {
                field: "request".into(),
                reason: err.to_string(),
            });
        }
        let message = if err.is_timeout() {
            format!(
                "request timed out after {}ms",
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
            )
        } else {
            err.to_string()
        };
        Failure::Retryable {
            status: None,
            message,
        }
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

/// Ensure the base URL ends with `/` so relative joins append.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

// ── Response parsing ─────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Pull a human message out of common error body shapes:
/// `{detail}`, `{message}`, or `{errors: [{message}]}`.
fn error_message(status: StatusCode, raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| extract_message(&v))
        .unwrap_or_else(|| {
            if raw.trim().is_empty() {
                status.to_string()
            } else {
                raw.trim().to_owned()
            }
        })
}

fn extract_message(v: &serde_json::Value) -> Option<String> {
    v.get("detail")
        .or_else(|| v.get("message"))
        .and_then(serde_json::Value::as_str)
        .or_else(|| {
            v.get("errors")?
                .as_array()?
                .first()?
                .get("message")?
                .as_str()
        })
        .map(ToOwned::to_owned)
}

fn extract_code(v: &serde_json::Value) -> Option<i64> {
    v.get("errors")
        .and_then(|e| e.as_array()?.first()?.get("code")?.as_i64())
        .or_else(|| v.get("code")?.as_i64())
}

fn client_error(status: StatusCode, raw: &str) -> Error {
    let message = error_message(status, raw);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::Unauthorized {
            status: status.as_u16(),
            message,
        };
    }

    let body = serde_json::from_str::<serde_json::Value>(raw).ok();
    Error::Api {
        status: status.as_u16(),
        message,
        code: body.as_ref().and_then(extract_code),
        body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(300));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(300));
        assert_eq!(policy.delay_for(1), Duration::from_millis(600));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1200));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy {
            retries: 100,
            base_delay: Duration::from_secs(1),
        };
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = normalize_base_url("https://api.example.com/client/v4".parse().unwrap());
        assert_eq!(url.as_str(), "https://api.example.com/client/v4/");
        assert_eq!(
            url.join("zones").unwrap().as_str(),
            "https://api.example.com/client/v4/zones"
        );
    }

    #[test]
    fn message_extraction_prefers_detail() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"zone_root required","message":"ignored"}"#,
        );
        assert_eq!(msg, "zone_root required");
    }

    #[test]
    fn message_extraction_reads_provider_errors_array() {
        let raw = r#"{"success":false,"errors":[{"code":81057,"message":"Record already exists."}]}"#;
        let err = client_error(StatusCode::BAD_REQUEST, raw);
        assert!(err.is_conflict());
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Record already exists."));
    }

    #[test]
    fn unauthorized_maps_to_auth_error() {
        let err = client_error(StatusCode::UNAUTHORIZED, "");
        assert!(err.is_auth());
        assert!(!err.is_transient());
    }
}
