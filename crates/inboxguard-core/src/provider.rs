// ── Collaborator seams ──
//
// The engine talks to the outside world only through these traits. The
// HTTP implementations wrap `inboxguard_api` clients; tests substitute
// in-memory fakes.

use std::future::Future;

use dashmap::DashMap;
use inboxguard_api::{ClientConfig, DnsProviderClient, MetricsClient, RecordBody, ResilientClient};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{DnsRecord, SpamMetric};

/// Record storage at a DNS provider, addressed by zone apex.
pub trait DnsProvider: Send + Sync {
    /// Whether a write credential is configured. Mutations are refused
    /// locally when this is `false`.
    fn can_mutate(&self) -> bool;

    fn list_records(
        &self,
        zone_root: &str,
    ) -> impl Future<Output = Result<Vec<DnsRecord>, CoreError>> + Send;

    fn create_record(
        &self,
        zone_root: &str,
        record: &DnsRecord,
    ) -> impl Future<Output = Result<DnsRecord, CoreError>> + Send;

    fn update_record(
        &self,
        zone_root: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> impl Future<Output = Result<DnsRecord, CoreError>> + Send;

    fn delete_record(
        &self,
        zone_root: &str,
        record_id: &str,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Read-only source of spam-rate and reputation data.
pub trait MetricsSource: Send + Sync {
    fn latest(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Option<SpamMetric>, CoreError>> + Send;

    /// Rows for the last `days` days, for one domain or all tracked ones.
    fn window(
        &self,
        domain: Option<&str>,
        days: u32,
    ) -> impl Future<Output = Result<Vec<SpamMetric>, CoreError>> + Send;
}

// ── HTTP provider ───────────────────────────────────────────────────

/// [`DnsProvider`] over the provider REST API. Zone ids are resolved
/// once per zone and cached.
#[derive(Debug)]
pub struct HttpDnsProvider {
    client: DnsProviderClient,
    zone_ids: DashMap<String, String>,
}

impl HttpDnsProvider {
    pub fn new(client: DnsProviderClient) -> Self {
        Self {
            client,
            zone_ids: DashMap::new(),
        }
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, CoreError> {
        Ok(Self::new(DnsProviderClient::new(ResilientClient::new(config)?)))
    }

    async fn zone_id(&self, zone_root: &str) -> Result<String, CoreError> {
        if let Some(id) = self.zone_ids.get(zone_root).map(|r| r.value().clone()) {
            return Ok(id);
        }
        match self.client.zone_id(zone_root).await {
            Ok(id) => {
                debug!(zone = zone_root, zone_id = %id, "resolved zone id");
                self.zone_ids.insert(zone_root.to_owned(), id.clone());
                Ok(id)
            }
            Err(e) if e.is_not_found() => Err(CoreError::ZoneNotFound {
                zone: zone_root.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn body(record: &DnsRecord) -> RecordBody<'_> {
    RecordBody {
        record_type: record.record_type.into(),
        name: &record.name,
        content: &record.content,
        ttl: record.ttl,
    }
}

impl DnsProvider for HttpDnsProvider {
    fn can_mutate(&self) -> bool {
        self.client.has_credential()
    }

    async fn list_records(&self, zone_root: &str) -> Result<Vec<DnsRecord>, CoreError> {
        let zone_id = self.zone_id(zone_root).await?;
        let records = self.client.list_records(&zone_id).await?;
        Ok(records.into_iter().map(DnsRecord::from).collect())
    }

    async fn create_record(&self, zone_root: &str, record: &DnsRecord) -> Result<DnsRecord, CoreError> {
        let zone_id = self.zone_id(zone_root).await?;
        let created = self.client.create_record(&zone_id, &body(record)).await?;
        Ok(created.into())
    }

    async fn update_record(
        &self,
        zone_root: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> Result<DnsRecord, CoreError> {
        let zone_id = self.zone_id(zone_root).await?;
        let updated = self
            .client
            .update_record(&zone_id, record_id, &body(record))
            .await?;
        Ok(updated.into())
    }

    async fn delete_record(&self, zone_root: &str, record_id: &str) -> Result<(), CoreError> {
        let zone_id = self.zone_id(zone_root).await?;
        self.client.delete_record(&zone_id, record_id).await?;
        Ok(())
    }
}

// ── HTTP metrics ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpMetricsSource {
    client: MetricsClient,
}

impl HttpMetricsSource {
    pub fn new(client: MetricsClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, CoreError> {
        Ok(Self::new(MetricsClient::new(ResilientClient::new(config)?)))
    }
}

impl MetricsSource for HttpMetricsSource {
    async fn latest(&self, domain: &str) -> Result<Option<SpamMetric>, CoreError> {
        Ok(self.client.latest(domain).await?.map(SpamMetric::from))
    }

    async fn window(&self, domain: Option<&str>, days: u32) -> Result<Vec<SpamMetric>, CoreError> {
        let rows = self.client.window(domain, days).await?;
        Ok(rows.into_iter().map(SpamMetric::from).collect())
    }
}
