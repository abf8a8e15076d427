// ── Domain model ──
//
// Canonical engine types. Everything here is a plain value: computed on
// demand, serializable for the CLI's JSON/YAML output, never persisted by
// the engine itself.

pub mod compliance;
pub mod decision;
pub mod dns;
pub mod metrics;
pub mod plan;

pub use compliance::{ComplianceSnapshot, DkimPostcheck, DmarcCheck, DmarcPolicy, SpfCheck, SpfStatus};
pub use decision::{Decision, PresendDecision, PresendInput};
pub use dns::{DnsRecord, RecordPurpose, RecordType};
pub use metrics::{
    AlertEvent, Reputation, SPAM_RATE_CRITICAL, SPAM_RATE_WARNING, Severity, SpamMetric,
    SpamVerdict,
};
pub use plan::{ApplyResult, AutofixPlan, ChangeAction, ChangeEntry, FailedChange};
