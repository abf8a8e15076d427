// Async client for the DNS provider API.
//
// Base path: /client/v4/ (configurable)
// Auth: Authorization: Bearer <token>

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{DeletedRecord, Envelope, RecordBody, RecordResponse, ZoneResponse};
use crate::auth::Access;
use crate::transport::ResilientClient;
use crate::Error;

const PAGE_SIZE: u32 = 100;

/// Client for zone and record management.
///
/// All calls go through [`ResilientClient`]; mutations are
/// [`Access::Privileged`] and fail locally without a token.
#[derive(Debug, Clone)]
pub struct DnsProviderClient {
    transport: ResilientClient,
}

impl DnsProviderClient {
    pub fn new(transport: ResilientClient) -> Self {
        Self { transport }
    }

    /// Whether mutating calls can be attempted.
    pub fn has_credential(&self) -> bool {
        self.transport.has_credential()
    }

    // ── Envelope handling ────────────────────────────────────────────

    /// Unwrap `{success, errors, result}`; `success: false` on a 2xx is
    /// still a permanent API error.
    fn unwrap<T>(envelope: Envelope<T>) -> Result<(T, Envelope<()>), Error> {
        let rest = Envelope {
            success: envelope.success,
            errors: envelope.errors,
            result: None,
            result_info: envelope.result_info,
        };
        if !rest.success {
            let first = rest.errors.first();
            return Err(Error::Api {
                status: 200,
                message: first.map_or_else(
                    || "provider reported failure".to_owned(),
                    |e| e.message.clone(),
                ),
                code: first.map(|e| e.code),
                body: None,
            });
        }
        match envelope.result {
            Some(result) => Ok((result, rest)),
            None => Err(Error::Deserialization {
                message: "envelope has no result".into(),
                body: String::new(),
            }),
        }
    }

    async fn get_result<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<(T, Envelope<()>), Error> {
        let envelope: Envelope<T> = self.transport.get(path, params, Access::Read).await?;
        Self::unwrap(envelope)
    }

    // ── Zones ────────────────────────────────────────────────────────

    /// Resolve a zone apex (e.g. `example.com`) to the provider's zone id.
    pub async fn zone_id(&self, zone_root: &str) -> Result<String, Error> {
        let (zones, _): (Vec<ZoneResponse>, _) = self
            .get_result("zones", &[("name", zone_root.to_owned())])
            .await?;

        zones
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(zone_root))
            .map(|z| z.id)
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("zone '{zone_root}' not found"),
                code: None,
                body: None,
            })
    }

    // ── Records ──────────────────────────────────────────────────────

    /// List every record in the zone, following pagination.
    pub async fn list_records(&self, zone_id: &str) -> Result<Vec<RecordResponse>, Error> {
        let path = format!("zones/{zone_id}/dns_records");
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let (records, rest): (Vec<RecordResponse>, _) = self
                .get_result(
                    &path,
                    &[
                        ("page", page.to_string()),
                        ("per_page", PAGE_SIZE.to_string()),
                    ],
                )
                .await?;
            let received = records.len();
            all.extend(records);

            let done = match rest.result_info {
                Some(info) if info.total_pages > 0 => page >= info.total_pages,
                _ => received < usize::try_from(PAGE_SIZE).unwrap_or(usize::MAX),
            };
            if done || received == 0 {
                break;
            }
            page += 1;
        }

        debug!(zone_id, count = all.len(), "listed records");
        Ok(all)
    }

    pub async fn create_record(
        &self,
        zone_id: &str,
        record: &RecordBody<'_>,
    ) -> Result<RecordResponse, Error> {
        let envelope: Envelope<RecordResponse> = self
            .transport
            .send(
                Method::POST,
                &format!("zones/{zone_id}/dns_records"),
                record,
                Access::Privileged,
            )
            .await?;
        Ok(Self::unwrap(envelope)?.0)
    }

    pub async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordBody<'_>,
    ) -> Result<RecordResponse, Error> {
        let envelope: Envelope<RecordResponse> = self
            .transport
            .send(
                Method::PUT,
                &format!("zones/{zone_id}/dns_records/{record_id}"),
                record,
                Access::Privileged,
            )
            .await?;
        Ok(Self::unwrap(envelope)?.0)
    }

    pub async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), Error> {
        let raw = self
            .transport
            .execute(
                Method::DELETE,
                &format!("zones/{zone_id}/dns_records/{record_id}"),
                &[],
                None,
                Access::Privileged,
            )
            .await?;

        // Some deployments answer 204 with no body.
        if raw.trim().is_empty() {
            return Ok(());
        }
        let envelope: Envelope<DeletedRecord> =
            serde_json::from_str(&raw).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: raw.clone(),
            })?;
        if envelope.success {
            return Ok(());
        }
        Self::unwrap(envelope).map(|_| ())
    }
}
