use serde::{Deserialize, Serialize};
use strum::Display;

use super::compliance::ComplianceSnapshot;
use super::dns::{DnsRecord, RecordPurpose, RecordType};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

/// One planned DNS mutation. Immutable once produced by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub action: ChangeAction,
    pub record_type: RecordType,
    pub name: String,
    pub purpose: RecordPurpose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub ttl: u32,
}

impl ChangeEntry {
    /// The record this change would write, for create and update.
    pub fn target_record(&self) -> Option<DnsRecord> {
        self.new_value.as_ref().map(|content| DnsRecord {
            id: None,
            name: self.name.clone(),
            record_type: self.record_type,
            content: content.clone(),
            ttl: self.ttl,
        })
    }

    /// Whether `other` addresses the same record slot as `self`.
    ///
    /// Deletes are identified by record id; creates and updates by
    /// `(purpose, type, name)` so a create that turned into an update
    /// between plan and apply still counts as the same change.
    pub fn same_target(&self, other: &ChangeEntry) -> bool {
        match (self.action, other.action) {
            (ChangeAction::Delete, ChangeAction::Delete) => self.record_id == other.record_id,
            (ChangeAction::Delete, _) | (_, ChangeAction::Delete) => false,
            _ => {
                self.purpose == other.purpose
                    && self.record_type == other.record_type
                    && self.name == other.name
            }
        }
    }
}

/// A point-in-time diff between desired and actual zone state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutofixPlan {
    pub zone: String,
    pub changes: Vec<ChangeEntry>,
    /// `true` iff `changes` is empty.
    pub idempotent: bool,
}

impl AutofixPlan {
    pub fn new(zone: impl Into<String>, changes: Vec<ChangeEntry>) -> Self {
        let idempotent = changes.is_empty();
        Self {
            zone: zone.into(),
            changes,
            idempotent,
        }
    }
}

/// A change the executor attempted and the provider rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedChange {
    pub change: ChangeEntry,
    pub error: String,
    /// Timeout, connection failure or 5xx that outlived the retry budget.
    pub transient: bool,
}

/// Outcome of applying a plan. Applied and failed changes are always
/// reported together with the postcheck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub applied: Vec<ChangeEntry>,
    /// Changes already satisfied when re-checked just before applying.
    pub skipped: Vec<ChangeEntry>,
    pub failed: Vec<FailedChange>,
    pub postcheck: Option<ComplianceSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcheck_error: Option<String>,
}

impl ApplyResult {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Nothing failed and the postcheck confirms convergence.
    pub fn converged(&self) -> bool {
        !self.is_partial()
            && self
                .postcheck
                .as_ref()
                .is_some_and(ComplianceSnapshot::is_compliant)
    }
}
