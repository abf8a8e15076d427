// ── Compliance snapshots ──
//
// SPF and DMARC reads are independent and issued concurrently.

use tracing::debug;

use crate::analyze::{dmarc, spf};
use crate::domain;
use crate::error::CoreError;
use crate::lookup::{DnsLookup, RecordSetLookup};
use crate::model::ComplianceSnapshot;

/// SPF at `fqdn` (or the apex), DMARC at `_dmarc.<fqdn>` falling back to
/// `_dmarc.<zone_root>` when the host publishes none.
pub async fn check<L: DnsLookup>(
    lookup: &L,
    zone_root: &str,
    fqdn: Option<&str>,
) -> Result<ComplianceSnapshot, CoreError> {
    let zone = domain::normalize(zone_root)?;
    let host = match fqdn {
        Some(f) => domain::normalize(f)?,
        None => zone.clone(),
    };

    let (spf_txts, dmarc_txts) = tokio::try_join!(
        lookup.txt(&host),
        dmarc_txts(lookup, &host, &zone)
    )?;

    let snapshot = ComplianceSnapshot {
        spf: spf::check_records(&spf_txts),
        dmarc: dmarc::check_records(&dmarc_txts),
    };
    debug!(
        host = %host,
        spf = %snapshot.spf.status,
        dmarc_valid = snapshot.dmarc.valid,
        "compliance snapshot"
    );
    Ok(snapshot)
}

async fn dmarc_txts<L: DnsLookup>(lookup: &L, host: &str, zone: &str) -> Result<Vec<String>, CoreError> {
    let at_host = lookup.txt(&domain::dmarc_name(host)).await?;
    if !at_host.is_empty() || host == zone {
        return Ok(at_host);
    }
    lookup.txt(&domain::dmarc_name(zone)).await
}

/// Snapshot of an apex from an already-fetched record listing.
pub fn snapshot_from_records(lookup: &RecordSetLookup, zone_root: &str) -> ComplianceSnapshot {
    ComplianceSnapshot {
        spf: spf::check_records(&lookup.txt_values(zone_root)),
        dmarc: dmarc::check_records(&lookup.txt_values(&domain::dmarc_name(zone_root))),
    }
}
