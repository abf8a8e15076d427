// ── API-to-domain type conversions ──
//
// Bridges raw `inboxguard_api` response types into `inboxguard_core::model`
// types: names canonicalized, type strings parsed, reputation strings
// mapped onto the enum.

use inboxguard_api::{MetricRow, RecordResponse};

use crate::domain;
use crate::model::{DnsRecord, RecordType, Reputation, SpamMetric};

impl From<RecordResponse> for DnsRecord {
    fn from(r: RecordResponse) -> Self {
        Self {
            id: Some(r.id),
            name: domain::canonical(&r.name),
            record_type: RecordType::from_provider(&r.record_type),
            content: r.content,
            ttl: r.ttl,
        }
    }
}

impl From<MetricRow> for SpamMetric {
    fn from(row: MetricRow) -> Self {
        Self {
            domain: row.domain.map(|d| domain::canonical(&d)),
            date: row.date,
            spam_rate: row.spam_rate,
            domain_reputation: row
                .domain_reputation
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .map(Reputation::from_report),
        }
    }
}
