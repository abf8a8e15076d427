#![allow(clippy::unwrap_used)]
// Integration tests for `ResilientClient` retry and error semantics using wiremock.

use std::time::Duration;

use reqwest::Method;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inboxguard_api::{Access, ClientConfig, CredentialHeader, Error, ResilientClient, RetryPolicy};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer, retries: u32) -> ClientConfig {
    ClientConfig::new(Url::parse(&server.uri()).unwrap())
        .with_timeout(Duration::from_secs(2))
        .with_retry(RetryPolicy {
            retries,
            base_delay: Duration::from_millis(1),
        })
}

async fn setup(retries: u32) -> (MockServer, ResilientClient) {
    let server = MockServer::start().await;
    let client = ResilientClient::new(config(&server, retries)).unwrap();
    (server, client)
}

// ── Retry behaviour ─────────────────────────────────────────────────

#[tokio::test]
async fn test_server_errors_retried_exactly_retries_times() {
    let (server, client) = setup(3).await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = client.get("status", &[], Access::Read).await;

    match result {
        Err(Error::Transient {
            attempts, status, ..
        }) => {
            assert_eq!(attempts, 4);
            assert_eq!(status, Some(500));
        }
        other => panic!("expected Transient error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_is_permanent_and_never_retried() {
    let (server, client) = setup(3).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "no such thing"})))
        .expect(1)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = client.get("missing", &[], Access::Read).await;

    match result {
        Err(Error::Api {
            status,
            ref message,
            ref body,
            ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "no such thing");
            assert!(body.is_some(), "parsed body should be carried");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let (server, client) = setup(2).await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let value: serde_json::Value = client.get("flaky", &[], Access::Read).await.unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_zero_retries_fails_on_first_server_error() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = client.get("x", &[], Access::Read).await;
    assert!(
        matches!(result, Err(Error::Transient { attempts: 1, .. })),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;
    let client = ResilientClient::new(
        config(&server, 1).with_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = client.get("slow", &[], Access::Read).await;
    match result {
        Err(Error::Transient {
            attempts,
            status,
            ref message,
        }) => {
            assert_eq!(attempts, 2);
            assert_eq!(status, None);
            assert!(message.contains("timed out"), "message: {message}");
        }
        other => panic!("expected Transient timeout, got: {other:?}"),
    }
}

// ── Credentials ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_privileged_call_without_credential_never_hits_network() {
    let (server, client) = setup(2).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = client
        .send(Method::POST, "records", &json!({}), Access::Privileged)
        .await;

    assert!(
        matches!(result, Err(Error::MissingCredential { .. })),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_bearer_credential_attached() {
    let server = MockServer::start().await;
    let client = ResilientClient::new(
        config(&server, 0).with_credential(SecretString::from("tok-123".to_string())),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/records"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "r1"})))
        .expect(1)
        .mount(&server)
        .await;

    let value: serde_json::Value = client
        .send(Method::POST, "records", &json!({"name": "x"}), Access::Privileged)
        .await
        .unwrap();
    assert_eq!(value["id"], "r1");
}

#[tokio::test]
async fn test_named_header_credential_attached() {
    let server = MockServer::start().await;
    let mut cfg = config(&server, 0).with_credential(SecretString::from("k".to_string()));
    cfg.credential_header = CredentialHeader::Named("X-API-Key".into());
    let client = ResilientClient::new(cfg).unwrap();

    Mock::given(method("GET"))
        .and(header("X-API-Key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let value: serde_json::Value = client.get("anything", &[], Access::Read).await.unwrap();
    assert!(value.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_401_is_auth_error_without_retry() {
    let (server, client) = setup(3).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad token"})))
        .expect(1)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = client.get("zones", &[], Access::Read).await;
    match result {
        Err(Error::Unauthorized { status, ref message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "bad token");
        }
        other => panic!("expected Unauthorized, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body_is_deserialization_error() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = client.get("x", &[], Access::Read).await;
    match result {
        Err(Error::Deserialization { ref body, .. }) => assert!(body.contains("oops")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
