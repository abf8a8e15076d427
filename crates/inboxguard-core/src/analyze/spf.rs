// ── SPF analysis ──
//
// Lookup accounting over SPF record text. Every function here is pure and
// total: any input string yields a result.
//
// Counted per RFC 7208 §4.6.4: `include:`, `a:`, `mx:`, `exists:`, `ptr:`
// and `redirect=` once per occurrence, plus the bare `a`, `mx` and `ptr`
// mechanisms once each however often they repeat. `redirect=` is counted
// like any other term and does not end evaluation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{SpfCheck, SpfStatus};

/// RFC 7208 hard limit on DNS-querying terms.
pub const LOOKUP_LIMIT: usize = 10;
/// Counts at or above this are flagged before the hard limit is hit.
pub const WARN_THRESHOLD: usize = 8;

const VERSION_TAG: &str = "v=spf1";

/// Whether `text` is an SPF record (`v=spf1` followed by a space or end).
pub fn is_spf_record(text: &str) -> bool {
    let t = text.trim_start();
    match t.get(..VERSION_TAG.len()) {
        Some(head) if head.eq_ignore_ascii_case(VERSION_TAG) => t
            .get(VERSION_TAG.len()..)
            .and_then(|rest| rest.chars().next())
            .is_none_or(char::is_whitespace),
        _ => false,
    }
}

/// Split a term into its lowercased mechanism/modifier name and the
/// separator that followed it (`:`, `/`, `=`), dropping any qualifier.
fn split_term(term: &str) -> (String, Option<char>) {
    let body = term.trim_start_matches(['+', '-', '~', '?']);
    match body.find([':', '/', '=']) {
        Some(idx) => (
            body[..idx].to_ascii_lowercase(),
            body[idx..].chars().next(),
        ),
        None => (body.to_ascii_lowercase(), None),
    }
}

/// Number of DNS lookups the record would cost a receiver.
pub fn count_lookups(text: &str) -> usize {
    let mut count = 0;
    let (mut bare_a, mut bare_mx, mut bare_ptr) = (false, false, false);

    for term in text.split_ascii_whitespace() {
        match split_term(term) {
            (name, Some(':')) if matches!(name.as_str(), "include" | "a" | "mx" | "exists" | "ptr") => {
                count += 1;
            }
            (name, Some('=')) if name == "redirect" => count += 1,
            (name, None | Some('/')) if name == "a" => bare_a = true,
            (name, None | Some('/')) if name == "mx" => bare_mx = true,
            (name, None | Some('/')) if name == "ptr" => bare_ptr = true,
            _ => {}
        }
    }

    count + usize::from(bare_a) + usize::from(bare_mx) + usize::from(bare_ptr)
}

/// `< 8` pass, `8..10` warn, `>= 10` fail.
pub fn classify(count: usize) -> SpfStatus {
    if count >= LOOKUP_LIMIT {
        SpfStatus::Fail
    } else if count >= WARN_THRESHOLD {
        SpfStatus::Warn
    } else {
        SpfStatus::Pass
    }
}

/// Occurrences of each mechanism and modifier name, for diagnostics.
pub fn breakdown(text: &str) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for term in text.split_ascii_whitespace() {
        if term.eq_ignore_ascii_case(VERSION_TAG) {
            continue;
        }
        let (name, _) = split_term(term);
        if name.is_empty() {
            continue;
        }
        *out.entry(name).or_insert(0) += 1;
    }
    out
}

pub fn guidance(status: SpfStatus) -> &'static str {
    match status {
        SpfStatus::Pass => "Excellent - well within limits",
        SpfStatus::Warn => "Warning - close to the 10-lookup limit",
        SpfStatus::Fail => "Critical - exceeds the RFC 7208 lookup limit",
    }
}

/// Full diagnostic view of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpfAnalysis {
    pub lookup_count: usize,
    pub status: SpfStatus,
    pub breakdown: BTreeMap<String, usize>,
    pub guidance: &'static str,
}

pub fn analyze(text: &str) -> SpfAnalysis {
    let lookup_count = count_lookups(text);
    let status = classify(lookup_count);
    SpfAnalysis {
        lookup_count,
        status,
        breakdown: breakdown(text),
        guidance: guidance(status),
    }
}

/// Evaluate every TXT string published at a name.
///
/// No `v=spf1` record is a fail. More than one is invalid (RFC 7208
/// permerror) and also a fail; the first is still analyzed.
pub fn check_records(txts: &[String]) -> SpfCheck {
    let records: Vec<&String> = txts.iter().filter(|t| is_spf_record(t)).collect();
    let Some(first) = records.first() else {
        return SpfCheck {
            exists: false,
            valid: false,
            lookup_count: 0,
            status: SpfStatus::Fail,
            record: None,
        };
    };

    let lookup_count = count_lookups(first);
    let valid = records.len() == 1;
    SpfCheck {
        exists: true,
        valid,
        lookup_count,
        status: if valid { classify(lookup_count) } else { SpfStatus::Fail },
        record: Some((*first).clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_includes_and_bare_mechanisms() {
        assert_eq!(
            count_lookups("v=spf1 include:_spf.google.com include:mailgun.org a mx ~all"),
            4
        );
    }

    #[test]
    fn include_order_does_not_matter() {
        let a = count_lookups("v=spf1 include:a.example include:b.example include:c.example -all");
        let b = count_lookups("v=spf1 include:c.example include:a.example include:b.example -all");
        assert_eq!(a, b);
        assert_eq!(a, 3);
    }

    #[test]
    fn bare_mechanisms_counted_once() {
        assert_eq!(count_lookups("v=spf1 a a mx mx/24 ptr ptr -all"), 3);
    }

    #[test]
    fn qualified_and_colon_forms() {
        assert_eq!(
            count_lookups("v=spf1 +a:mail.example -mx:mx.example ?exists:%{i}.x.example ~ptr:p.example redirect=_spf.example"),
            5
        );
    }

    #[test]
    fn ip_ranges_cost_nothing() {
        assert_eq!(count_lookups("v=spf1 ip4:192.0.2.0/24 ip6:2001:db8::a:1 -all"), 0);
    }

    #[test]
    fn total_over_garbage() {
        assert_eq!(count_lookups(""), 0);
        assert_eq!(count_lookups("   ::: === "), 0);
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(7), SpfStatus::Pass);
        assert_eq!(classify(8), SpfStatus::Warn);
        assert_eq!(classify(9), SpfStatus::Warn);
        assert_eq!(classify(10), SpfStatus::Fail);
    }

    #[test]
    fn breakdown_counts_each_name() {
        let b = breakdown("v=spf1 include:a include:b ip4:1.2.3.4 mx ~all");
        assert_eq!(b.get("include"), Some(&2));
        assert_eq!(b.get("ip4"), Some(&1));
        assert_eq!(b.get("mx"), Some(&1));
        assert_eq!(b.get("all"), Some(&1));
        assert!(!b.contains_key("v"));
    }

    #[test]
    fn record_detection() {
        assert!(is_spf_record("v=spf1 -all"));
        assert!(is_spf_record("V=SPF1"));
        assert!(!is_spf_record("v=spf10 -all"));
        assert!(!is_spf_record("google-site-verification=abc"));
    }

    #[test]
    fn missing_record_is_fail() {
        let check = check_records(&["some-verification=1".to_owned()]);
        assert!(!check.exists);
        assert_eq!(check.status, SpfStatus::Fail);
    }

    #[test]
    fn duplicate_records_are_invalid() {
        let check = check_records(&["v=spf1 -all".to_owned(), "v=spf1 mx -all".to_owned()]);
        assert!(check.exists);
        assert!(!check.valid);
        assert_eq!(check.status, SpfStatus::Fail);
    }

    #[test]
    fn single_record_is_valid() {
        let check = check_records(&["v=spf1 include:_spf.google.com ~all".to_owned()]);
        assert!(check.valid);
        assert_eq!(check.lookup_count, 1);
        assert_eq!(check.status, SpfStatus::Pass);
    }
}
