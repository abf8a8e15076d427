use serde::{Deserialize, Serialize};
use strum::Display;

use super::compliance::ComplianceSnapshot;
use super::metrics::SpamMetric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Pass,
    Block,
    PassWithOverride,
}

/// Everything a presend decision depends on. Assembled by the caller.
#[derive(Debug, Clone)]
pub struct PresendInput {
    pub domain: String,
    pub raw_headers: Option<String>,
    pub latest_metric: Option<SpamMetric>,
    pub compliance: ComplianceSnapshot,
    /// Checklist items the sender explicitly accepts. Only consulted when
    /// an override was requested.
    pub acknowledgments: Option<Vec<String>>,
}

/// Gate verdict for an outbound send.
///
/// `checklist[i]` is the remediation for `reasons[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresendDecision {
    pub decision: Decision,
    pub reasons: Vec<String>,
    pub checklist: Vec<String>,
    pub fix_snippets: Vec<String>,
    pub latest_metrics: Option<SpamMetric>,
}

impl PresendDecision {
    pub fn is_blocked(&self) -> bool {
        self.decision == Decision::Block
    }
}
