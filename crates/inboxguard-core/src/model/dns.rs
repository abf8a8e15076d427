use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::domain;

/// DNS record types the engine reads or writes. Anything else is carried
/// as `Other` and never touched.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    #[serde(other)]
    Other,
}

impl RecordType {
    /// Lenient parse of a provider-supplied type string.
    pub fn from_provider(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Other)
    }
}

/// What a record is *for*. Orders desired changes: SPF, then DMARC, then DKIM.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordPurpose {
    Spf,
    Dmarc,
    Dkim,
    Other,
}

/// A DNS record as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned id; `None` for desired-state records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
}

impl DnsRecord {
    pub fn new(record_type: RecordType, name: impl Into<String>, content: impl Into<String>, ttl: u32) -> Self {
        Self {
            id: None,
            name: domain::canonical(&name.into()),
            record_type,
            content: content.into(),
            ttl,
        }
    }

    /// TXT content with provider quoting removed; CNAME targets canonicalized.
    pub fn normalized_content(&self) -> String {
        normalize_content(self.record_type, &self.content)
    }

    pub fn purpose(&self) -> RecordPurpose {
        classify_purpose(self.record_type, &self.name, &self.content)
    }
}

/// Normalize record content for comparison.
pub fn normalize_content(record_type: RecordType, content: &str) -> String {
    match record_type {
        RecordType::Txt => unquote_txt(content),
        RecordType::Cname => domain::canonical(content),
        _ => content.trim().to_owned(),
    }
}

/// Join the character-strings of a quoted TXT value.
///
/// `"v=spf1 include:a" " ~all"` becomes `v=spf1 include:a ~all`; unquoted
/// content is returned trimmed.
pub fn unquote_txt(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with('"') {
        return trimmed.to_owned();
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_quotes = false;
    let mut escaped = false;
    for c in trimmed.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => out.push(c),
            _ => {}
        }
    }
    out
}

fn classify_purpose(record_type: RecordType, name: &str, content: &str) -> RecordPurpose {
    let name = domain::canonical(name);
    match record_type {
        RecordType::Txt if name.starts_with("_dmarc.") => RecordPurpose::Dmarc,
        RecordType::Txt if crate::analyze::spf::is_spf_record(&unquote_txt(content)) => {
            RecordPurpose::Spf
        }
        RecordType::Cname if name.contains("._domainkey.") => RecordPurpose::Dkim,
        _ => RecordPurpose::Other,
    }
}
