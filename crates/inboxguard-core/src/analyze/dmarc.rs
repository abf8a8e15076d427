// ── DMARC validation ──
//
// Operates on already-fetched TXT text; no network access.

use serde::Serialize;
use tracing::debug;

use crate::model::dns::unquote_txt;
use crate::model::{DmarcCheck, DmarcPolicy};

/// Parsed tags of a DMARC record that the engine reports on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DmarcRecord {
    pub policy: DmarcPolicy,
    pub subdomain_policy: Option<DmarcPolicy>,
    pub pct: Option<u8>,
    pub rua: Vec<String>,
}

/// Parse a DMARC TXT record. `v=DMARC1` must be the first tag and `p=`
/// must carry `none`, `quarantine` or `reject`. Later tags without `=`
/// are skipped.
pub fn parse(record: &str) -> Result<DmarcRecord, String> {
    let text = unquote_txt(record);
    let mut tags = Vec::new();
    for part in text.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            Some((tag, value)) => tags.push((tag.trim().to_ascii_lowercase(), value.trim())),
            None if tags.is_empty() => return Err("record must start with v=DMARC1".into()),
            None => debug!(tag = part, "skipping malformed DMARC tag"),
        }
    }

    match tags.first() {
        Some((tag, value)) if tag == "v" && value.eq_ignore_ascii_case("DMARC1") => {}
        Some((tag, _)) if tag == "v" => return Err("invalid version, expected DMARC1".into()),
        _ => return Err("record must start with v=DMARC1".into()),
    }

    let find = |name: &str| tags.iter().find(|(t, _)| t == name).map(|(_, v)| *v);

    let policy = match find("p") {
        Some(raw) => raw
            .parse::<DmarcPolicy>()
            .map_err(|_| format!("invalid p= value '{raw}'"))?,
        None => return Err("missing required p= tag".into()),
    };

    Ok(DmarcRecord {
        policy,
        subdomain_policy: find("sp").and_then(|v| v.parse().ok()),
        pct: find("pct").and_then(|v| v.parse().ok()).filter(|p| *p <= 100),
        rua: find("rua")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

/// Validate one record. `exists` is true whenever text was supplied.
pub fn validate(record: Option<&str>) -> DmarcCheck {
    let Some(text) = record else {
        return DmarcCheck {
            exists: false,
            valid: false,
            policy: None,
            record: None,
        };
    };
    let parsed = parse(text).ok();
    DmarcCheck {
        exists: true,
        valid: parsed.is_some(),
        policy: parsed.map(|r| r.policy),
        record: Some(unquote_txt(text)),
    }
}

/// Validate every TXT string published at `_dmarc.<domain>`.
///
/// More than one `v=DMARC1` record leaves the policy undefined
/// (RFC 7489 §6.6.3) and is reported invalid.
pub fn check_records(txts: &[String]) -> DmarcCheck {
    let dmarc: Vec<&String> = txts
        .iter()
        .filter(|t| {
            unquote_txt(t)
                .get(..8)
                .is_some_and(|head| head.eq_ignore_ascii_case("v=DMARC1"))
        })
        .collect();

    match dmarc.as_slice() {
        [] => validate(txts.first().map(String::as_str)),
        [only] => validate(Some(only)),
        [first, ..] => DmarcCheck {
            valid: false,
            policy: None,
            ..validate(Some(first))
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn valid_reject_record() {
        let check = validate(Some("v=DMARC1; p=reject; rua=mailto:x@y.com"));
        assert!(check.exists);
        assert!(check.valid);
        assert_eq!(check.policy, Some(DmarcPolicy::Reject));
    }

    #[test]
    fn missing_version_is_invalid() {
        let check = validate(Some("p=reject"));
        assert!(check.exists);
        assert!(!check.valid);
        assert_eq!(check.policy, None);
    }

    #[test]
    fn absent_record() {
        let check = validate(None);
        assert!(!check.exists);
        assert!(!check.valid);
    }

    #[test]
    fn stray_trailing_tag_is_skipped() {
        let check = validate(Some("v=DMARC1; p=reject; rua=mailto:x@y.com; fo"));
        assert!(check.valid);
        assert_eq!(check.policy, Some(DmarcPolicy::Reject));

        let record = parse("v=DMARC1; p=quarantine; x-custom=1; fo; pct=50").unwrap();
        assert_eq!(record.policy, DmarcPolicy::Quarantine);
        assert_eq!(record.pct, Some(50));
        assert_eq!(record.rua, Vec::<String>::new());
    }

    #[test]
    fn malformed_leading_tag_is_invalid() {
        assert!(parse("junk; v=DMARC1; p=reject").is_err());
        assert!(!validate(Some("v=DMARC1; fo")).valid);
    }

    #[test]
    fn bad_policy_value() {
        assert!(parse("v=DMARC1; p=block").is_err());
        assert!(parse("v=DMARC1; rua=mailto:a@b.c").is_err());
        assert!(parse("v=DMARC2; p=none").is_err());
    }

    #[test]
    fn parses_optional_tags() {
        let rec = parse("\"v=DMARC1; p=quarantine; sp=none; pct=50; rua=mailto:a@x.example, mailto:b@x.example\"")
            .unwrap();
        assert_eq!(rec.policy, DmarcPolicy::Quarantine);
        assert_eq!(rec.subdomain_policy, Some(DmarcPolicy::None));
        assert_eq!(rec.pct, Some(50));
        assert_eq!(rec.rua.len(), 2);
    }

    #[test]
    fn duplicate_records_invalid() {
        let check = check_records(&[
            "v=DMARC1; p=none".to_owned(),
            "v=DMARC1; p=reject".to_owned(),
        ]);
        assert!(check.exists);
        assert!(!check.valid);
    }

    #[test]
    fn stray_txt_at_dmarc_name_exists_but_invalid() {
        let check = check_records(&["p=reject".to_owned()]);
        assert!(check.exists);
        assert!(!check.valid);
    }
}
