// ── Autofix planning ──
//
// Diff desired against actual records and emit an ordered change list.
// Records are matched by `(purpose, type, name)`: a TXT slot is only ever
// matched against a TXT record of the same purpose, so unrelated TXT
// records at the apex (site verifications etc.) are never rewritten.
//
// Output order is SPF, DMARC, DKIM, then name, then action, then record
// id, so planning twice against the same state is byte-identical.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::config::DesiredStateConfig;
use crate::desired::desired_state;
use crate::domain;
use crate::error::CoreError;
use crate::model::{AutofixPlan, ChangeAction, ChangeEntry, DnsRecord, RecordPurpose, RecordType};
use crate::provider::DnsProvider;

type SlotKey = (RecordPurpose, RecordType, String);

fn slot(record: &DnsRecord) -> SlotKey {
    (record.purpose(), record.record_type, domain::canonical(&record.name))
}

fn change(action: ChangeAction, want: Option<&DnsRecord>, have: Option<&DnsRecord>) -> ChangeEntry {
    let reference = want.or(have);
    ChangeEntry {
        action,
        record_type: reference.map_or(RecordType::Other, |r| r.record_type),
        name: reference.map(|r| domain::canonical(&r.name)).unwrap_or_default(),
        purpose: reference.map_or(RecordPurpose::Other, DnsRecord::purpose),
        old_value: have.map(|r| r.content.clone()),
        new_value: want.map(|r| r.content.clone()),
        record_id: have.and_then(|r| r.id.clone()),
        ttl: reference.map_or(0, |r| r.ttl),
    }
}

/// Pure diff. Deletions are emitted only when `reconcile_extras` is set:
/// duplicates occupying a desired slot, and DKIM CNAMEs not in the
/// desired set (only when DKIM is managed at all).
pub fn diff(desired: &[DnsRecord], actual: &[DnsRecord], reconcile_extras: bool) -> Vec<ChangeEntry> {
    // Slot -> indices into `actual`, in a stable order.
    let mut slots: BTreeMap<SlotKey, Vec<usize>> = BTreeMap::new();
    for (idx, record) in actual.iter().enumerate() {
        slots.entry(slot(record)).or_default().push(idx);
    }
    for candidates in slots.values_mut() {
        candidates.sort_by(|&a, &b| {
            (&actual[a].id, &actual[a].content).cmp(&(&actual[b].id, &actual[b].content))
        });
    }

    let mut changes = Vec::new();
    let mut claimed: HashSet<usize> = HashSet::new();

    for want in desired {
        let candidates = slots.get(&slot(want)).map_or(&[][..], Vec::as_slice);
        let wanted = want.normalized_content();

        if let Some(&hit) = candidates
            .iter()
            .find(|&&idx| actual[idx].normalized_content() == wanted)
        {
            claimed.insert(hit);
            continue;
        }
        match candidates.iter().find(|idx| !claimed.contains(*idx)) {
            Some(&old) => {
                claimed.insert(old);
                changes.push(change(ChangeAction::Update, Some(want), Some(&actual[old])));
            }
            None => changes.push(change(ChangeAction::Create, Some(want), None)),
        }
    }

    if reconcile_extras {
        let desired_slots: HashSet<SlotKey> = desired.iter().map(slot).collect();
        let manages_dkim = desired.iter().any(|r| r.purpose() == RecordPurpose::Dkim);

        for (key, indices) in &slots {
            let managed = desired_slots.contains(key);
            let stray_dkim = manages_dkim && key.0 == RecordPurpose::Dkim && !managed;
            if !managed && !stray_dkim {
                continue;
            }
            for &idx in indices {
                if !claimed.contains(&idx) {
                    changes.push(change(ChangeAction::Delete, None, Some(&actual[idx])));
                }
            }
        }
    }

    changes.sort_by(|a, b| {
        (a.purpose, &a.name, a.action, &a.record_id).cmp(&(b.purpose, &b.name, b.action, &b.record_id))
    });
    changes
}

/// Computes [`AutofixPlan`]s from live provider state.
pub struct AutofixPlanner<'a, P> {
    provider: &'a P,
    config: &'a DesiredStateConfig,
}

impl<'a, P: DnsProvider> AutofixPlanner<'a, P> {
    pub fn new(provider: &'a P, config: &'a DesiredStateConfig) -> Self {
        Self { provider, config }
    }

    pub async fn plan(&self, zone_root: &str) -> Result<AutofixPlan, CoreError> {
        let zone = domain::normalize(zone_root)?;
        let desired = desired_state(&zone, self.config)?;
        let actual = self.provider.list_records(&zone).await?;
        let changes = diff(&desired, &actual, self.config.reconcile_extras);

        debug!(
            zone = %zone,
            desired = desired.len(),
            actual = actual.len(),
            changes = changes.len(),
            "computed autofix plan"
        );
        Ok(AutofixPlan::new(zone, changes))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rec(id: &str, ty: RecordType, name: &str, content: &str) -> DnsRecord {
        DnsRecord {
            id: Some(id.into()),
            ..DnsRecord::new(ty, name, content, 300)
        }
    }

    fn desired() -> Vec<DnsRecord> {
        vec![
            DnsRecord::new(RecordType::Cname, "s1._domainkey.example.com", "s1.esp.example", 300),
            DnsRecord::new(RecordType::Txt, "_dmarc.example.com", "v=DMARC1; p=reject", 300),
            DnsRecord::new(RecordType::Txt, "example.com", "v=spf1 include:esp.example ~all", 300),
        ]
    }

    #[test]
    fn empty_zone_creates_everything_in_order() {
        let changes = diff(&desired(), &[], false);
        let summary: Vec<_> = changes.iter().map(|c| (c.action, c.purpose)).collect();
        assert_eq!(
            summary,
            vec![
                (ChangeAction::Create, RecordPurpose::Spf),
                (ChangeAction::Create, RecordPurpose::Dmarc),
                (ChangeAction::Create, RecordPurpose::Dkim),
            ]
        );
    }

    #[test]
    fn matching_state_yields_no_changes() {
        let actual = vec![
            rec("1", RecordType::Txt, "example.com", "\"v=spf1 include:esp.example ~all\""),
            rec("2", RecordType::Txt, "_dmarc.example.com", "v=DMARC1; p=reject"),
            rec("3", RecordType::Cname, "s1._domainkey.example.com", "S1.ESP.example."),
            rec("4", RecordType::Txt, "example.com", "google-site-verification=abc"),
        ];
        assert!(diff(&desired(), &actual, true).is_empty());
    }

    #[test]
    fn differing_content_updates_in_place() {
        let actual = vec![
            rec("1", RecordType::Txt, "example.com", "v=spf1 -all"),
            rec("2", RecordType::Txt, "_dmarc.example.com", "v=DMARC1; p=none"),
        ];
        let changes = diff(&desired(), &actual, false);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].action, ChangeAction::Update);
        assert_eq!(changes[0].record_id.as_deref(), Some("1"));
        assert_eq!(changes[0].old_value.as_deref(), Some("v=spf1 -all"));
        assert_eq!(changes[0].new_value.as_deref(), Some("v=spf1 include:esp.example ~all"));
        assert_eq!(changes[1].action, ChangeAction::Update);
        assert_eq!(changes[2].action, ChangeAction::Create);
    }

    #[test]
    fn unrelated_txt_never_overwritten() {
        let actual = vec![rec("9", RecordType::Txt, "example.com", "ms=12345")];
        let changes = diff(&desired()[2..], &actual, true);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, ChangeAction::Create);
    }

    #[test]
    fn extras_only_deleted_when_opted_in() {
        let actual = vec![
            rec("1", RecordType::Txt, "example.com", "v=spf1 include:esp.example ~all"),
            rec("2", RecordType::Txt, "example.com", "v=spf1 mx -all"),
            rec("3", RecordType::Cname, "old._domainkey.example.com", "old.esp.example"),
        ];
        assert!(
            diff(&desired(), &actual, false)
                .iter()
                .all(|c| c.action != ChangeAction::Delete)
        );

        let changes = diff(&desired(), &actual, true);
        let deletes: Vec<_> = changes
            .iter()
            .filter(|c| c.action == ChangeAction::Delete)
            .map(|c| c.record_id.clone().unwrap())
            .collect();
        assert_eq!(deletes, vec!["2", "3"]);
    }

    #[test]
    fn stray_dkim_kept_when_dkim_unmanaged() {
        let actual = vec![rec("3", RecordType::Cname, "old._domainkey.example.com", "old.esp.example")];
        let changes = diff(&desired()[1..], &actual, true);
        assert!(changes.iter().all(|c| c.action != ChangeAction::Delete));
    }

    #[test]
    fn repeated_planning_is_byte_identical() {
        let actual = vec![
            rec("b", RecordType::Txt, "example.com", "v=spf1 -all"),
            rec("a", RecordType::Txt, "example.com", "v=spf1 mx -all"),
        ];
        let first = serde_json::to_string(&diff(&desired(), &actual, true)).unwrap();
        let second = serde_json::to_string(&diff(&desired(), &actual, true)).unwrap();
        assert_eq!(first, second);
    }
}
