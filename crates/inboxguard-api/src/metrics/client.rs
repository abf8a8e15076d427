// Async client for the mail-reputation metrics service.
//
// Endpoints: /postmaster/latest, /postmaster/metrics
// Auth: optional X-API-Key header

use super::types::{DataEnvelope, MetricRow};
use crate::auth::Access;
use crate::transport::ResilientClient;
use crate::Error;

/// Read-only client for spam-rate and reputation data.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    transport: ResilientClient,
}

impl MetricsClient {
    pub fn new(transport: ResilientClient) -> Self {
        Self { transport }
    }

    fn unwrap<T>(envelope: DataEnvelope<T>, endpoint: &str) -> Result<Option<T>, Error> {
        if envelope.success {
            Ok(envelope.data)
        } else {
            Err(Error::Api {
                status: 200,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("{endpoint} reported failure")),
                code: None,
                body: None,
            })
        }
    }

    /// Most recent metric row for `domain`, or `None` if the service has none.
    pub async fn latest(&self, domain: &str) -> Result<Option<MetricRow>, Error> {
        let envelope: DataEnvelope<MetricRow> = self
            .transport
            .get(
                "postmaster/latest",
                &[("domain", domain.to_owned())],
                Access::Read,
            )
            .await?;
        Self::unwrap(envelope, "postmaster/latest")
    }

    /// Rows for the last `days` days. Without `domain`, every tracked
    /// domain is included and rows carry their `domain` field.
    pub async fn window(&self, domain: Option<&str>, days: u32) -> Result<Vec<MetricRow>, Error> {
        let mut params = vec![("days", days.to_string())];
        if let Some(d) = domain {
            params.push(("domain", d.to_owned()));
        }

        let envelope: DataEnvelope<Vec<MetricRow>> = self
            .transport
            .get("postmaster/metrics", &params, Access::Read)
            .await?;
        Ok(Self::unwrap(envelope, "postmaster/metrics")?.unwrap_or_default())
    }
}
