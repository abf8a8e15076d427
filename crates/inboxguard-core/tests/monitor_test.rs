#![allow(clippy::unwrap_used)]
// Periodic status refresh, driven on paused time.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::{FakeMetrics, FakeProvider, ZONE, compliant_zone, desired, metric};
use inboxguard_core::monitor::refresh_status;
use inboxguard_core::{CheckSource, CoreError, Engine, MonitorConfig, Reputation, StatusMonitor};

type TestEngine = Engine<FakeProvider, FakeMetrics>;

fn test_engine() -> Arc<TestEngine> {
    let metrics = FakeMetrics {
        latest: Some(metric(12, Some(0.05), Some(Reputation::High))),
        ..FakeMetrics::default()
    };
    Arc::new(Engine::new(
        FakeProvider::new(compliant_zone()),
        Some(metrics),
        desired(),
    ))
}

fn config(interval: Duration) -> MonitorConfig {
    MonitorConfig {
        domain: ZONE.into(),
        interval,
        source: CheckSource::Provider,
    }
}

#[tokio::test]
async fn test_refresh_status_fills_every_tile() {
    let engine = test_engine();

    let status = refresh_status(engine.as_ref(), ZONE, CheckSource::Provider, None).await;

    assert_eq!(status.domain, ZONE);
    assert!(status.dns.data.unwrap().is_compliant());
    assert!(status.dkim.data.unwrap().iter().all(|d| d.ok));
    assert_eq!(status.metrics.data.unwrap().spam_rate, Some(0.05));
    assert!(status.dns.last_updated.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_failed_tile_keeps_last_good_data() {
    let engine = test_engine();
    let monitor = StatusMonitor::spawn(
        Arc::clone(&engine),
        config(Duration::from_secs(60)),
        CancellationToken::new(),
    )
    .unwrap();
    let mut rx = monitor.subscribe();

    rx.changed().await.unwrap();
    let first = rx.borrow_and_update().clone().unwrap();
    assert!(first.dns.error.is_none());
    assert!(first.dns.data.is_some());

    engine.provider().set_list_failure(true);
    rx.changed().await.unwrap();
    let second = rx.borrow_and_update().clone().unwrap();

    assert_eq!(second.dns.data, first.dns.data);
    assert_eq!(second.dns.last_updated, first.dns.last_updated);
    assert!(second.dns.error.as_deref().unwrap().contains("connection refused"));
    assert!(second.dkim.error.is_some());
    // Metrics do not depend on the provider.
    assert!(second.metrics.error.is_none());

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_paused_monitor_skips_cycles() {
    let engine = test_engine();
    let monitor = StatusMonitor::spawn(
        Arc::clone(&engine),
        config(Duration::from_secs(30)),
        CancellationToken::new(),
    )
    .unwrap();
    let mut rx = monitor.subscribe();
    rx.changed().await.unwrap();

    monitor.pause();
    assert!(monitor.is_paused());
    let lists = engine.provider().lists.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(engine.provider().lists.load(Ordering::SeqCst), lists);

    monitor.resume();
    rx.changed().await.unwrap();
    assert!(engine.provider().lists.load(Ordering::SeqCst) > lists);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_external_cancel_stops_task() {
    let cancel = CancellationToken::new();
    let monitor =
        StatusMonitor::spawn(test_engine(), config(Duration::from_secs(60)), cancel.clone()).unwrap();
    let mut rx = monitor.subscribe();
    rx.changed().await.unwrap();

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), monitor.shutdown())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_spawn_rejects_bad_input() {
    let err = StatusMonitor::spawn(test_engine(), config(Duration::ZERO), CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));

    let mut bad = config(Duration::from_secs(60));
    bad.domain = "not a domain".into();
    assert!(StatusMonitor::spawn(test_engine(), bad, CancellationToken::new()).is_err());
}
