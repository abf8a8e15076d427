#![allow(clippy::unwrap_used)]
// Integration tests for `DnsProviderClient` and `MetricsClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inboxguard_api::{
    ClientConfig, DnsProviderClient, Error, MetricsClient, RecordBody, ResilientClient,
    RetryPolicy,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn transport(server: &MockServer, token: Option<&str>) -> ResilientClient {
    let mut cfg = ClientConfig::new(Url::parse(&server.uri()).unwrap()).with_retry(RetryPolicy {
        retries: 1,
        base_delay: Duration::from_millis(1),
    });
    if let Some(t) = token {
        cfg = cfg.with_credential(SecretString::from(t.to_string()));
    }
    ResilientClient::new(cfg).unwrap()
}

async fn setup(token: Option<&str>) -> (MockServer, DnsProviderClient) {
    let server = MockServer::start().await;
    let client = DnsProviderClient::new(transport(&server, token));
    (server, client)
}

fn record(id: &str, name: &str, ty: &str, content: &str) -> serde_json::Value {
    json!({ "id": id, "name": name, "type": ty, "content": content, "ttl": 300 })
}

// ── Zones ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_zone_id_lookup() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": [{ "id": "zone-1", "name": "example.com" }]
        })))
        .mount(&server)
        .await;

    assert_eq!(client.zone_id("example.com").await.unwrap(), "zone-1");
}

#[tokio::test]
async fn test_zone_missing_is_not_found() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "errors": [], "result": []
        })))
        .mount(&server)
        .await;

    let err = client.zone_id("nope.example").await.unwrap_err();
    assert!(err.is_not_found(), "got: {err:?}");
}

// ── Records ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_records_follows_pagination() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/zones/z1/dns_records"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": [record("r1", "example.com", "TXT", "v=spf1 -all")],
            "result_info": { "page": 1, "per_page": 100, "total_pages": 2, "count": 1, "total_count": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/zones/z1/dns_records"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": [record("r2", "_dmarc.example.com", "TXT", "v=DMARC1; p=none")],
            "result_info": { "page": 2, "per_page": 100, "total_pages": 2, "count": 1, "total_count": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = client.list_records("z1").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "r1");
    assert_eq!(records[1].record_type, "TXT");
    assert_eq!(records[1].name, "_dmarc.example.com");
}

#[tokio::test]
async fn test_create_record_sends_body() {
    let (server, client) = setup(Some("tok")).await;

    Mock::given(method("POST"))
        .and(path("/zones/z1/dns_records"))
        .and(body_json(json!({
            "type": "TXT",
            "name": "_dmarc.example.com",
            "content": "v=DMARC1; p=quarantine",
            "ttl": 300
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": record("new-1", "_dmarc.example.com", "TXT", "v=DMARC1; p=quarantine")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_record(
            "z1",
            &RecordBody {
                record_type: "TXT",
                name: "_dmarc.example.com",
                content: "v=DMARC1; p=quarantine",
                ttl: 300,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.id, "new-1");
}

#[tokio::test]
async fn test_create_conflict_is_flagged() {
    let (server, client) = setup(Some("tok")).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 81057, "message": "Record already exists." }],
            "result": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client
        .create_record(
            "z1",
            &RecordBody {
                record_type: "TXT",
                name: "example.com",
                content: "v=spf1 -all",
                ttl: 300,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "got: {err:?}");
}

#[tokio::test]
async fn test_update_without_token_fails_locally() {
    let (server, client) = setup(None).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .update_record(
            "z1",
            "r1",
            &RecordBody {
                record_type: "TXT",
                name: "example.com",
                content: "v=spf1 -all",
                ttl: 300,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingCredential { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_delete_record_accepts_empty_body() {
    let (server, client) = setup(Some("tok")).await;

    Mock::given(method("DELETE"))
        .and(path("/zones/z1/dns_records/r9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_record("z1", "r9").await.unwrap();
}

#[tokio::test]
async fn test_envelope_failure_on_200_is_api_error() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/zones/z1/dns_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 1003, "message": "Invalid zone identifier" }],
            "result": null
        })))
        .mount(&server)
        .await;

    let err = client.list_records("z1").await.unwrap_err();
    match err {
        Error::Api { code, message, .. } => {
            assert_eq!(code, Some(1003));
            assert_eq!(message, "Invalid zone identifier");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Metrics ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_metrics_latest() {
    let server = MockServer::start().await;
    let client = MetricsClient::new(transport(&server, None));

    Mock::given(method("GET"))
        .and(path("/postmaster/latest"))
        .and(query_param("domain", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "date": "2026-10-01", "spam_rate": 0.12, "domain_reputation": "HIGH" }
        })))
        .mount(&server)
        .await;

    let row = client.latest("example.com").await.unwrap().unwrap();
    assert_eq!(row.date.to_string(), "2026-10-01");
    assert_eq!(row.spam_rate, Some(0.12));
    assert_eq!(row.domain_reputation.as_deref(), Some("HIGH"));
}

#[tokio::test]
async fn test_metrics_window_without_domain() {
    let server = MockServer::start().await;
    let client = MetricsClient::new(transport(&server, None));

    Mock::given(method("GET"))
        .and(path("/postmaster/metrics"))
        .and(query_param("days", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "domain": "a.example", "date": "2026-10-01", "spam_rate": 0.31 },
                { "domain": "b.example", "date": "2026-10-02", "domain_reputation": "LOW" }
            ]
        })))
        .mount(&server)
        .await;

    let rows = client.window(None, 30).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].domain.as_deref(), Some("a.example"));
    assert_eq!(rows[1].spam_rate, None);
}

#[tokio::test]
async fn test_metrics_latest_empty() {
    let server = MockServer::start().await;
    let client = MetricsClient::new(transport(&server, None));

    Mock::given(method("GET"))
        .and(path("/postmaster/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": null })))
        .mount(&server)
        .await;

    assert!(client.latest("example.com").await.unwrap().is_none());
}
