// ── Desired zone state ──
//
// Pure: the same zone and config always produce the same record set.

use std::collections::HashSet;

use crate::config::DesiredStateConfig;
use crate::domain;
use crate::error::CoreError;
use crate::model::{DnsRecord, RecordType};

/// `v=spf1 [mechanisms] [include:…] <all>`, includes de-duplicated in order.
pub fn spf_content(config: &DesiredStateConfig) -> String {
    let mut seen = HashSet::new();
    let mut terms = vec!["v=spf1".to_owned()];
    terms.extend(config.spf_mechanisms.iter().map(|m| m.trim().to_owned()));
    for include in &config.spf_includes {
        let include = domain::canonical(include);
        if seen.insert(include.clone()) {
            terms.push(format!("include:{include}"));
        }
    }
    terms.push(config.spf_all.trim().to_ascii_lowercase());
    terms.join(" ")
}

/// `v=DMARC1; p=<policy>[; rua=mailto:…][; pct=N]`
pub fn dmarc_content(config: &DesiredStateConfig) -> String {
    let mut content = format!("v=DMARC1; p={}", config.dmarc_policy);
    if let Some(rua) = config.dmarc_rua.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        if rua.to_ascii_lowercase().starts_with("mailto:") {
            content.push_str(&format!("; rua={rua}"));
        } else {
            content.push_str(&format!("; rua=mailto:{rua}"));
        }
    }
    if let Some(pct) = config.dmarc_pct {
        content.push_str(&format!("; pct={pct}"));
    }
    content
}

/// The record set a compliant `zone_root` publishes under `config`.
pub fn desired_state(zone_root: &str, config: &DesiredStateConfig) -> Result<Vec<DnsRecord>, CoreError> {
    config.validate()?;
    let zone = domain::normalize(zone_root)?;
    let mut records = Vec::new();

    if config.manage_spf {
        records.push(DnsRecord::new(RecordType::Txt, &zone, spf_content(config), config.ttl));
    }
    if config.manage_dmarc {
        records.push(DnsRecord::new(
            RecordType::Txt,
            domain::dmarc_name(&zone),
            dmarc_content(config),
            config.ttl,
        ));
    }

    let mut names = HashSet::new();
    for sel in &config.dkim_selectors {
        let name = domain::qualify(&sel.host, &zone);
        domain::normalize(&name)?;
        if !names.insert(name.clone()) {
            return Err(CoreError::ValidationFailed {
                message: format!("DKIM selector '{name}' is configured twice"),
            });
        }
        records.push(DnsRecord::new(
            RecordType::Cname,
            name,
            domain::canonical(&sel.target),
            sel.ttl.unwrap_or(config.ttl),
        ));
    }

    Ok(records)
}
