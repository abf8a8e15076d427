// ── Presend gate ──
//
// Single-shot and stateless. Moving from BLOCK to PASS_WITH_OVERRIDE means
// calling again with the previous checklist as acknowledgments.

use std::collections::HashSet;

use crate::analyze::headers;
use crate::model::{
    Decision, PresendDecision, PresendInput, SPAM_RATE_CRITICAL, SpfStatus,
};
use crate::model::metrics::format_rate;

pub const CHECK_HEADERS: &str =
    "Add RFC 8058 List-Unsubscribe (mailto: and https:) and List-Unsubscribe-Post: List-Unsubscribe=One-Click headers";
pub const CHECK_SPAM_RATE: &str =
    "Reduce spam rate below 30%: pause bulk sends and remove unengaged recipients";
pub const CHECK_REPUTATION: &str =
    "Recover domain reputation: send only to engaged recipients and warm up volume gradually";
pub const CHECK_AUTHENTICATION: &str =
    "Fix DNS authentication: publish one valid DMARC record and keep SPF under 10 lookups (run autofix)";

/// Evaluate a send. `checklist[i]` remediates `reasons[i]`.
pub fn decide(input: &PresendInput) -> PresendDecision {
    let mut reasons = Vec::new();
    let mut checklist = Vec::new();
    let mut header_issue = false;

    if let Some(raw) = input.raw_headers.as_deref() {
        let lint = headers::lint(raw);
        if !lint.is_compliant {
            header_issue = true;
            reasons.push(format!("Unsubscribe headers are not compliant: {}", lint.issues.join(" ")));
            checklist.push(CHECK_HEADERS.to_owned());
        }
    }

    if let Some(metric) = &input.latest_metric {
        if let Some(rate) = metric.spam_rate.filter(|r| *r >= SPAM_RATE_CRITICAL) {
            reasons.push(format!(
                "Spam rate {} on {} is at or above the {} threshold",
                format_rate(Some(rate)),
                metric.date,
                format_rate(Some(SPAM_RATE_CRITICAL)),
            ));
            checklist.push(CHECK_SPAM_RATE.to_owned());
        }
        if let Some(rep) = metric.domain_reputation.filter(|r| r.is_poor()) {
            reasons.push(format!("Domain reputation is {rep}"));
            checklist.push(CHECK_REPUTATION.to_owned());
        }
    }

    let dmarc_bad = !input.compliance.dmarc.valid;
    let spf_bad = input.compliance.spf.status == SpfStatus::Fail;
    if dmarc_bad || spf_bad {
        let mut parts = Vec::new();
        if dmarc_bad {
            parts.push(if input.compliance.dmarc.exists {
                "DMARC record is invalid"
            } else {
                "DMARC record is missing"
            });
        }
        if spf_bad {
            parts.push(if input.compliance.spf.exists {
                "SPF fails (over the lookup limit or duplicated)"
            } else {
                "SPF record is missing"
            });
        }
        reasons.push(format!("Authentication for {}: {}", input.domain, parts.join("; ")));
        checklist.push(CHECK_AUTHENTICATION.to_owned());
    }

    let decision = if reasons.is_empty() {
        Decision::Pass
    } else if acknowledged(input.acknowledgments.as_deref(), &checklist) {
        Decision::PassWithOverride
    } else {
        Decision::Block
    };

    PresendDecision {
        decision,
        reasons,
        checklist,
        fix_snippets: if header_issue {
            headers::fix_snippets(Some(&input.domain))
        } else {
            Vec::new()
        },
        latest_metrics: input.latest_metric.clone(),
    }
}

/// Set containment: every checklist item appears among the acknowledgments.
fn acknowledged(acks: Option<&[String]>, checklist: &[String]) -> bool {
    let Some(acks) = acks else {
        return false;
    };
    let acks: HashSet<&str> = acks.iter().map(String::as_str).collect();
    checklist.iter().all(|item| acks.contains(item.as_str()))
}
