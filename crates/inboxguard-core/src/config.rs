// ── Runtime engine configuration ──
//
// These types describe *what* the engine should converge a zone towards
// and *how* to reach its collaborators. They carry credential data and
// tuning, but never touch disk: the CLI builds an `EngineConfig` and
// hands it in.

pub use inboxguard_api::{ClientConfig, CredentialHeader, RetryPolicy, TlsMode};
use serde::{Deserialize, Serialize};

use crate::domain;
use crate::error::CoreError;
use crate::model::DmarcPolicy;

/// TTL applied to desired records when neither the selector nor the
/// config sets one.
pub const DEFAULT_TTL: u32 = 300;

/// One DKIM selector delegated by CNAME to the sending provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkimSelector {
    /// Relative (`s1._domainkey`) or fully qualified host.
    pub host: String,
    /// CNAME target, usually the sending provider's key host.
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// The compliant target state for a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredStateConfig {
    pub manage_spf: bool,
    /// Domains emitted as `include:` mechanisms, in order.
    pub spf_includes: Vec<String>,
    /// Extra mechanisms emitted verbatim before the includes (`mx`, `ip4:…`).
    pub spf_mechanisms: Vec<String>,
    /// Terminal `all` mechanism.
    pub spf_all: String,
    pub manage_dmarc: bool,
    pub dmarc_policy: DmarcPolicy,
    /// Aggregate report address; `mailto:` is added when missing.
    pub dmarc_rua: Option<String>,
    pub dmarc_pct: Option<u8>,
    pub dkim_selectors: Vec<DkimSelector>,
    pub ttl: u32,
    /// Opt-in deletion of duplicate SPF/DMARC records and unconfigured
    /// DKIM CNAMEs.
    pub reconcile_extras: bool,
}

impl Default for DesiredStateConfig {
    fn default() -> Self {
        Self {
            manage_spf: true,
            spf_includes: Vec::new(),
            spf_mechanisms: Vec::new(),
            spf_all: "~all".into(),
            manage_dmarc: true,
            dmarc_policy: DmarcPolicy::Quarantine,
            dmarc_rua: None,
            dmarc_pct: None,
            dkim_selectors: Vec::new(),
            ttl: DEFAULT_TTL,
            reconcile_extras: false,
        }
    }
}

impl DesiredStateConfig {
    /// Reject configurations that cannot produce a well-formed record set.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ttl == 0 {
            return Err(CoreError::validation("ttl must be positive"));
        }
        if self.manage_spf {
            let all = self.spf_all.trim().to_ascii_lowercase();
            if !matches!(all.as_str(), "all" | "+all" | "-all" | "~all" | "?all") {
                return Err(CoreError::validation(format!(
                    "spf_all must be one of -all, ~all, ?all, +all (got '{}')",
                    self.spf_all
                )));
            }
            for include in &self.spf_includes {
                domain::normalize(include).map_err(|_| {
                    CoreError::validation(format!("invalid SPF include domain '{include}'"))
                })?;
            }
            if self.spf_mechanisms.iter().any(|m| m.trim().is_empty() || m.contains(' ')) {
                return Err(CoreError::validation("SPF mechanisms must be single terms"));
            }
        }
        if let Some(pct) = self.dmarc_pct {
            if pct > 100 {
                return Err(CoreError::validation(format!(
                    "dmarc_pct must be 0-100 (got {pct})"
                )));
            }
        }
        for sel in &self.dkim_selectors {
            if sel.host.trim().is_empty() {
                return Err(CoreError::validation("DKIM selector host is empty"));
            }
            if sel.target.trim().is_empty() {
                return Err(CoreError::validation(format!(
                    "DKIM selector '{}' has no target",
                    sel.host
                )));
            }
            if sel.ttl == Some(0) {
                return Err(CoreError::validation(format!(
                    "DKIM selector '{}' has a zero ttl",
                    sel.host
                )));
            }
        }
        Ok(())
    }

    /// A config that manages only the given DKIM selectors.
    pub fn dkim_only(&self, selectors: Vec<DkimSelector>) -> Self {
        Self {
            manage_spf: false,
            manage_dmarc: false,
            dkim_selectors: selectors,
            ..self.clone()
        }
    }
}

/// Everything needed to build an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// DNS provider endpoint and write credential.
    pub provider: ClientConfig,
    /// Reputation metrics endpoint; alerts and spam checks are unavailable
    /// without it.
    pub metrics: Option<ClientConfig>,
    pub desired: DesiredStateConfig,
    pub default_domain: Option<String>,
}
