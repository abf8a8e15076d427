// ── RFC 8058 One-Click unsubscribe lint ──
//
// Deterministic over the raw header block: folded lines are unfolded,
// header names compared case-insensitively, first occurrence wins.

use serde::Serialize;
use strum::Display;

pub const MISSING_LIST_UNSUBSCRIBE: &str = "Missing List-Unsubscribe header.";
pub const MISSING_MAILTO: &str = "List-Unsubscribe should include a mailto: URL.";
pub const MISSING_HTTP: &str = "List-Unsubscribe should include an HTTP(S) URL.";
pub const MISSING_POST: &str = "Missing List-Unsubscribe-Post header (required for One-Click).";
pub const BAD_POST_VALUE: &str =
    "List-Unsubscribe-Post must be exactly 'List-Unsubscribe=One-Click'.";

const ONE_CLICK_VALUE: &str = "List-Unsubscribe=One-Click";
const DOMAIN_PLACEHOLDER: &str = "YOURDOMAIN.com";
const SNIPPET_TEMPLATES: [&str; 2] = [
    "List-Unsubscribe: <mailto:unsubscribe@YOURDOMAIN.com>, <https://YOURDOMAIN.com/unsubscribe?u={{user_id}}>",
    "List-Unsubscribe-Post: List-Unsubscribe=One-Click",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderLint {
    pub issues: Vec<String>,
    pub is_compliant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HeaderStatus {
    Compliant,
    Warning,
    Critical,
}

/// Canonical header templates, with `domain` substituted when given.
pub fn fix_snippets(domain: Option<&str>) -> Vec<String> {
    SNIPPET_TEMPLATES
        .iter()
        .map(|t| match domain {
            Some(d) => t.replace(DOMAIN_PLACEHOLDER, d),
            None => (*t).to_owned(),
        })
        .collect()
}

/// Unfold continuation lines and return `(name, value)` pairs. Parsing
/// stops at the first empty line (end of the header block).
fn parse_headers(raw: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_owned()));
        }
    }
    headers
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

pub fn lint(raw: &str) -> HeaderLint {
    let headers = parse_headers(raw);
    let mut issues = Vec::new();

    match header(&headers, "list-unsubscribe") {
        None => issues.push(MISSING_LIST_UNSUBSCRIBE.to_owned()),
        Some(value) => {
            let lower = value.to_ascii_lowercase();
            if !lower.contains("mailto:") {
                issues.push(MISSING_MAILTO.to_owned());
            }
            if !lower.contains("https://") && !lower.contains("http://") {
                issues.push(MISSING_HTTP.to_owned());
            }
        }
    }

    match header(&headers, "list-unsubscribe-post") {
        None => issues.push(MISSING_POST.to_owned()),
        Some(value) if !value.eq_ignore_ascii_case(ONE_CLICK_VALUE) => {
            issues.push(BAD_POST_VALUE.to_owned());
        }
        Some(_) => {}
    }

    HeaderLint {
        is_compliant: issues.is_empty(),
        issues,
    }
}

/// Critical when a required header is missing, warning when present but
/// malformed.
pub fn compliance_status(lint: &HeaderLint) -> HeaderStatus {
    if lint.is_compliant {
        return HeaderStatus::Compliant;
    }
    let missing = lint
        .issues
        .iter()
        .any(|i| i == MISSING_LIST_UNSUBSCRIBE || i == MISSING_POST);
    if missing {
        HeaderStatus::Critical
    } else {
        HeaderStatus::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "From: news@example.com\r\n\
List-Unsubscribe: <mailto:unsub@example.com>,\r\n <https://example.com/u?id=1>\r\n\
List-Unsubscribe-Post: List-Unsubscribe=One-Click\r\n\
Subject: hi\r\n";

    #[test]
    fn compliant_headers_with_folding() {
        let lint = lint(GOOD);
        assert!(lint.is_compliant, "issues: {:?}", lint.issues);
        assert_eq!(compliance_status(&lint), HeaderStatus::Compliant);
    }

    #[test]
    fn empty_input_misses_both_headers() {
        let lint = lint("");
        assert_eq!(lint.issues, vec![MISSING_LIST_UNSUBSCRIBE, MISSING_POST]);
        assert_eq!(compliance_status(&lint), HeaderStatus::Critical);
    }

    #[test]
    fn mailto_only() {
        let lint = lint(
            "list-unsubscribe: <mailto:u@example.com>\nLIST-UNSUBSCRIBE-POST: list-unsubscribe=one-click\n",
        );
        assert_eq!(lint.issues, vec![MISSING_HTTP]);
        assert_eq!(compliance_status(&lint), HeaderStatus::Warning);
    }

    #[test]
    fn post_value_must_match_exactly() {
        let lint = lint(
            "List-Unsubscribe: <mailto:u@x.example>, <https://x.example/u>\nList-Unsubscribe-Post: List-Unsubscribe=One-Click; extra\n",
        );
        assert_eq!(lint.issues, vec![BAD_POST_VALUE]);
    }

    #[test]
    fn body_after_blank_line_ignored() {
        let lint = lint("Subject: x\n\nList-Unsubscribe: <mailto:a@b.c>\n");
        assert!(lint.issues.contains(&MISSING_LIST_UNSUBSCRIBE.to_owned()));
    }

    #[test]
    fn deterministic() {
        assert_eq!(lint(GOOD), lint(GOOD));
    }

    #[test]
    fn snippets_substitute_domain() {
        let snippets = fix_snippets(Some("mail.example"));
        assert!(snippets[0].contains("unsubscribe@mail.example"));
        assert_eq!(snippets[1], "List-Unsubscribe-Post: List-Unsubscribe=One-Click");
        assert!(fix_snippets(None)[0].contains(DOMAIN_PLACEHOLDER));
    }
}
