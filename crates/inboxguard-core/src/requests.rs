// ── Engine request / response types ──
//
// The shapes exchanged with presentation layers. Requests are plain data;
// validation happens in the engine before any network call.

use serde::{Deserialize, Serialize};

use crate::config::DkimSelector;
use crate::model::{
    ChangeEntry, ComplianceSnapshot, DkimPostcheck, DmarcCheck, FailedChange, SpamMetric, SpfCheck,
};

/// Where a compliance check reads DNS data from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckSource {
    /// Records as configured at the provider.
    #[default]
    Provider,
    /// Live resolution, as receivers see it.
    Live,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceRequest {
    pub zone_root: String,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default)]
    pub source: CheckSource,
}

/// SPF/DMARC snapshot plus configured DKIM selectors and the latest metric,
/// gathered concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub zone_root: String,
    pub spf: SpfCheck,
    pub dmarc: DmarcCheck,
    pub dkim: Vec<DkimPostcheck>,
    pub latest_metric: Option<SpamMetric>,
    /// Sub-checks that failed without failing the whole report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ComplianceReport {
    pub fn snapshot(&self) -> ComplianceSnapshot {
        ComplianceSnapshot {
            spf: self.spf.clone(),
            dmarc: self.dmarc.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutofixRequest {
    pub zone_root: String,
    #[serde(default)]
    pub apply: bool,
}

/// `changes` is the plan preview when `apply` was false and the actually
/// applied changes otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutofixResponse {
    pub success: bool,
    pub applied: bool,
    pub changes: Vec<ChangeEntry>,
    pub idempotent: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ChangeEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcheck: Option<ComplianceSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcheck_error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DkimApplyRequest {
    pub zone_root: String,
    pub selectors: Vec<DkimSelector>,
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DkimApplyResponse {
    /// Preview, present when `apply` was false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<ChangeEntry>>,
    /// Applied changes, present when `apply` was true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<ChangeEntry>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedChange>,
    pub postcheck: Vec<DkimPostcheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcheck_error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresendRequest {
    pub domain: String,
    #[serde(default)]
    pub raw_headers: Option<String>,
    #[serde(default)]
    pub allow_override: bool,
    #[serde(default)]
    pub acknowledgments: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsRequest {
    #[serde(default)]
    pub domain: Option<String>,
    pub days: u32,
}
