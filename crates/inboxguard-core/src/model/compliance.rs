use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// SPF lookup-budget tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpfStatus {
    Pass,
    Warn,
    Fail,
}

/// DMARC `p=` disposition.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DmarcPolicy {
    None,
    #[default]
    Quarantine,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpfCheck {
    pub exists: bool,
    /// Exactly one well-formed `v=spf1` record.
    pub valid: bool,
    pub lookup_count: usize,
    pub status: SpfStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmarcCheck {
    pub exists: bool,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<DmarcPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
}

/// SPF and DMARC state of a domain at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSnapshot {
    pub spf: SpfCheck,
    pub dmarc: DmarcCheck,
}

impl ComplianceSnapshot {
    /// SPF is present, valid and under the hard lookup limit, and DMARC is valid.
    pub fn is_compliant(&self) -> bool {
        self.spf.valid && self.spf.status != SpfStatus::Fail && self.dmarc.valid
    }
}

/// Result of resolving one DKIM selector CNAME.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkimPostcheck {
    pub name: String,
    pub resolves_to: Option<String>,
    pub ok: bool,
}
