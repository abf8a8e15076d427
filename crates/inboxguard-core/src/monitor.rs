// ── Periodic status monitor ──
//
// A cancellable background task per watched domain that refreshes a
// `QuickStatus` (DNS, DKIM and metrics tiles) at a fixed interval. Each
// task runs its cycles strictly one after another; ad-hoc calls to
// `refresh_status` are independent of it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain;
use crate::engine::Engine;
use crate::error::CoreError;
use crate::model::{ComplianceSnapshot, DkimPostcheck, SpamMetric};
use crate::provider::{DnsProvider, MetricsSource};
use crate::requests::CheckSource;

/// Default refresh period for status tiles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// One independently refreshed piece of status. A failed refresh keeps
/// the last good data and records the error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for Tile<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            last_updated: None,
        }
    }
}

impl<T: Clone> Tile<T> {
    fn next(previous: Option<&Tile<T>>, outcome: Result<Option<T>, CoreError>, now: DateTime<Utc>) -> Self {
        match outcome {
            Ok(data) => Self {
                data,
                error: None,
                last_updated: Some(now),
            },
            Err(e) => {
                let prev = previous.cloned().unwrap_or_default();
                Self {
                    error: Some(e.to_string()),
                    ..prev
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStatus {
    pub domain: String,
    pub checked_at: DateTime<Utc>,
    pub dns: Tile<ComplianceSnapshot>,
    pub dkim: Tile<Vec<DkimPostcheck>>,
    pub metrics: Tile<SpamMetric>,
}

/// Run one refresh cycle: the three tiles are fetched concurrently.
pub async fn refresh_status<P: DnsProvider, M: MetricsSource>(
    engine: &Engine<P, M>,
    domain_name: &str,
    source: CheckSource,
    previous: Option<&QuickStatus>,
) -> QuickStatus {
    let (dns, dkim, metric) = tokio::join!(
        engine.snapshot(domain_name, None, source),
        engine.dkim_status(domain_name, source),
        engine.latest_metric(domain_name)
    );
    let now = Utc::now();
    QuickStatus {
        domain: domain_name.to_owned(),
        checked_at: now,
        dns: Tile::next(previous.map(|p| &p.dns), dns.map(Some), now),
        dkim: Tile::next(previous.map(|p| &p.dkim), dkim.map(Some), now),
        metrics: Tile::next(previous.map(|p| &p.metrics), metric, now),
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub domain: String,
    pub interval: Duration,
    pub source: CheckSource,
}

/// Handle to a running monitor task.
#[derive(Debug)]
pub struct StatusMonitor {
    status: watch::Receiver<Option<QuickStatus>>,
    paused: watch::Sender<bool>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StatusMonitor {
    /// Spawn the task. The first cycle runs immediately.
    pub fn spawn<P, M>(
        engine: Arc<Engine<P, M>>,
        config: MonitorConfig,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError>
    where
        P: DnsProvider + 'static,
        M: MetricsSource + 'static,
    {
        let domain_name = domain::normalize(&config.domain)?;
        if config.interval.is_zero() {
            return Err(CoreError::ValidationFailed {
                message: "monitor interval must be positive".into(),
            });
        }

        let (status_tx, status) = watch::channel(None);
        let (paused, paused_rx) = watch::channel(false);
        let handle = tokio::spawn(monitor_task(
            engine,
            domain_name,
            config.interval,
            config.source,
            status_tx,
            paused_rx,
            cancel.clone(),
        ));

        Ok(Self {
            status,
            paused,
            cancel,
            handle,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<QuickStatus>> {
        self.status.clone()
    }

    pub fn latest(&self) -> Option<QuickStatus> {
        self.status.borrow().clone()
    }

    /// Skip cycles until [`resume`](Self::resume). A cycle already running
    /// completes.
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Cancel the task and wait for it to exit. An in-flight cycle is
    /// abandoned.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "status monitor task ended abnormally");
        }
    }
}

async fn monitor_task<P: DnsProvider, M: MetricsSource>(
    engine: Arc<Engine<P, M>>,
    domain_name: String,
    period: Duration,
    source: CheckSource,
    status: watch::Sender<Option<QuickStatus>>,
    paused: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if *paused.borrow() {
                    debug!(domain = %domain_name, "monitor paused, skipping cycle");
                    continue;
                }
                let previous = status.borrow().clone();
                let next = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    next = refresh_status(engine.as_ref(), &domain_name, source, previous.as_ref()) => next,
                };
                status.send_replace(Some(next));
            }
        }
    }
    debug!(domain = %domain_name, "status monitor stopped");
}
