//! Standalone analyzers: SPF, DMARC and unsubscribe headers.
//!
//! These run without a profile. `--domain` switches SPF and DMARC from
//! record text to a live resolver lookup.

use serde::Serialize;

use inboxguard_core::analyze::dmarc::{self, DmarcRecord};
use inboxguard_core::analyze::headers::{self, HeaderLint, HeaderStatus};
use inboxguard_core::analyze::spf::{self, SpfAnalysis};
use inboxguard_core::{DmarcCheck, DnsLookup, ResolverLookup, SpfStatus, domain};

use crate::cli::{DmarcArgs, GlobalOpts, HeadersArgs, SpfArgs};
use crate::error::CliError;
use crate::output::{self, Painter, Tone};

use super::util;

fn status_tone(status: SpfStatus) -> Tone {
    match status {
        SpfStatus::Pass => Tone::Good,
        SpfStatus::Warn => Tone::Caution,
        SpfStatus::Fail => Tone::Bad,
    }
}

// ── SPF ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SpfReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    record: Option<String>,
    /// More than one `v=spf1` record was published.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    duplicate: bool,
    #[serde(flatten)]
    analysis: SpfAnalysis,
}

fn spf_detail(r: &SpfReport, painter: Painter) -> String {
    let mut pairs = Vec::new();
    if let Some(ref d) = r.domain {
        pairs.push(("Domain", d.clone()));
    }
    pairs.push(("Record", r.record.clone().unwrap_or_else(|| "(none)".into())));
    pairs.push(("Lookups", format!("{} / {}", r.analysis.lookup_count, spf::LOOKUP_LIMIT)));
    pairs.push((
        "Status",
        painter.paint(&r.analysis.status.to_string().to_uppercase(), status_tone(r.analysis.status)),
    ));
    pairs.push(("Guidance", r.analysis.guidance.to_owned()));
    if !r.analysis.breakdown.is_empty() {
        let terms = r
            .analysis
            .breakdown
            .iter()
            .map(|(name, n)| format!("{name} x{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        pairs.push(("Terms", terms));
    }
    if r.duplicate {
        pairs.push((
            "Warning",
            painter.paint("multiple SPF records published; receivers will permerror", Tone::Bad),
        ));
    }
    output::detail_lines(&pairs)
}

pub async fn spf(args: SpfArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let report = match (args.record, args.domain) {
        (Some(record), _) => SpfReport {
            domain: None,
            analysis: spf::analyze(&record),
            record: Some(record),
            duplicate: false,
        },
        (None, Some(raw)) => {
            let name = domain::normalize(&raw)?;
            let lookup = ResolverLookup::from_system_conf()?;
            let txts = util::with_spinner("Resolving", global, lookup.txt(&name)).await?;
            let check = spf::check_records(&txts);
            let mut analysis = spf::analyze(check.record.as_deref().unwrap_or_default());
            // Missing or duplicated records fail regardless of lookup count.
            analysis.status = check.status;
            analysis.guidance = spf::guidance(check.status);
            SpfReport {
                domain: Some(name),
                duplicate: check.exists && !check.valid,
                record: check.record,
                analysis,
            }
        }
        (None, None) => {
            return Err(CliError::Validation {
                field: "record".into(),
                reason: "pass an SPF record or --domain".into(),
            });
        }
    };

    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| spf_detail(r, painter),
        |r| r.analysis.lookup_count.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── DMARC ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct DmarcReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(flatten)]
    check: DmarcCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<DmarcRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DmarcReport {
    fn new(domain: Option<String>, check: DmarcCheck) -> Self {
        let parsed = check.record.as_deref().map(dmarc::parse);
        let (tags, error) = match parsed {
            Some(Ok(tags)) => (Some(tags), None),
            Some(Err(e)) => (None, Some(e)),
            None => (None, None),
        };
        let error = match error {
            None if check.exists && !check.valid => {
                Some("multiple DMARC records published; policy is undefined".to_owned())
            }
            other => other,
        };
        Self {
            domain,
            check,
            tags,
            error,
        }
    }
}

fn dmarc_detail(r: &DmarcReport, painter: Painter) -> String {
    let mut pairs = Vec::new();
    if let Some(ref d) = r.domain {
        pairs.push(("Domain", d.clone()));
    }
    pairs.push((
        "Record",
        r.check.record.clone().unwrap_or_else(|| "(none)".into()),
    ));
    pairs.push(("Valid", painter.flag(r.check.valid)));
    if let Some(ref tags) = r.tags {
        pairs.push(("Policy", tags.policy.to_string()));
        if let Some(sp) = tags.subdomain_policy {
            pairs.push(("Subdomains", sp.to_string()));
        }
        if let Some(pct) = tags.pct {
            pairs.push(("Percent", format!("{pct}%")));
        }
        if !tags.rua.is_empty() {
            pairs.push(("Reports to", tags.rua.join(", ")));
        }
    }
    if let Some(ref e) = r.error {
        pairs.push(("Error", painter.paint(e, Tone::Bad)));
    }
    output::detail_lines(&pairs)
}

pub async fn dmarc(args: DmarcArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let report = match (args.record, args.domain) {
        (Some(record), _) => DmarcReport::new(None, dmarc::validate(Some(&record))),
        (None, Some(raw)) => {
            let name = domain::normalize(&raw)?;
            let lookup = ResolverLookup::from_system_conf()?;
            let txts =
                util::with_spinner("Resolving", global, lookup.txt(&domain::dmarc_name(&name)))
                    .await?;
            DmarcReport::new(Some(name), dmarc::check_records(&txts))
        }
        (None, None) => {
            return Err(CliError::Validation {
                field: "record".into(),
                reason: "pass a DMARC record or --domain".into(),
            });
        }
    };

    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| dmarc_detail(r, painter),
        |r| if r.check.valid { "valid" } else { "invalid" }.to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Headers ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct HeaderReport {
    status: HeaderStatus,
    #[serde(flatten)]
    lint: HeaderLint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fix_snippets: Vec<String>,
}

fn headers_detail(r: &HeaderReport, painter: Painter) -> String {
    let tone = match r.status {
        HeaderStatus::Compliant => Tone::Good,
        HeaderStatus::Warning => Tone::Caution,
        HeaderStatus::Critical => Tone::Bad,
    };
    let mut lines = vec![format!(
        "One-Click unsubscribe: {}",
        painter.paint(&r.status.to_string(), tone)
    )];
    lines.extend(r.lint.issues.iter().map(|i| format!("  - {i}")));
    if !r.fix_snippets.is_empty() {
        lines.push("Add:".into());
        lines.extend(r.fix_snippets.iter().map(|s| format!("  {s}")));
    }
    lines.join("\n")
}

pub fn headers(args: &HeadersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let raw = util::read_input(args.file.as_deref())?;
    let lint = headers::lint(&raw);
    let status = headers::compliance_status(&lint);
    let fix_snippets = if lint.is_compliant {
        Vec::new()
    } else {
        headers::fix_snippets(args.domain.as_deref())
    };
    let report = HeaderReport {
        status,
        lint,
        fix_snippets,
    };

    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| headers_detail(r, painter),
        |r| r.status.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
