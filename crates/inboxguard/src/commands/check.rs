//! Compliance check handler.

use inboxguard_core::model::metrics::format_rate;
use inboxguard_core::{
    ComplianceReport, ComplianceRequest, DkimPostcheck, DmarcCheck, SpfCheck, SpfStatus,
};

use crate::cli::{CheckArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter, Tone};

use super::{Context, util};

pub(crate) fn spf_summary(spf: &SpfCheck, painter: Painter) -> String {
    if !spf.exists {
        return painter.paint("missing", Tone::Bad);
    }
    let tone = match spf.status {
        SpfStatus::Pass if spf.valid => Tone::Good,
        SpfStatus::Warn if spf.valid => Tone::Caution,
        _ => Tone::Bad,
    };
    let mut text = format!("{} ({} lookups)", spf.status, spf.lookup_count);
    if !spf.valid {
        text.push_str(", multiple records");
    }
    painter.paint(&text, tone)
}

pub(crate) fn dmarc_summary(dmarc: &DmarcCheck, painter: Painter) -> String {
    match (dmarc.exists, dmarc.valid, dmarc.policy) {
        (false, _, _) => painter.paint("missing", Tone::Bad),
        (true, true, Some(policy)) => painter.paint(&format!("valid, p={policy}"), Tone::Good),
        _ => painter.paint("invalid", Tone::Bad),
    }
}

pub(crate) fn dkim_summary(dkim: &[DkimPostcheck], painter: Painter) -> String {
    if dkim.is_empty() {
        return painter.paint("no selectors configured", Tone::Muted);
    }
    dkim.iter()
        .map(|d| {
            let target = d.resolves_to.as_deref().unwrap_or("unresolved");
            let tone = if d.ok { Tone::Good } else { Tone::Bad };
            format!("{} -> {}", d.name, painter.paint(target, tone))
        })
        .collect::<Vec<_>>()
        .join("\n       ")
}

fn detail(report: &ComplianceReport, painter: Painter) -> String {
    let compliant = report.snapshot().is_compliant();
    let mut pairs = vec![
        ("Domain", report.zone_root.clone()),
        (
            "Status",
            if compliant {
                painter.paint("compliant", Tone::Good)
            } else {
                painter.paint("not compliant", Tone::Bad)
            },
        ),
        ("SPF", spf_summary(&report.spf, painter)),
        ("DMARC", dmarc_summary(&report.dmarc, painter)),
        ("DKIM", dkim_summary(&report.dkim, painter)),
    ];
    if let Some(ref record) = report.spf.record {
        pairs.push(("SPF TXT", record.clone()));
    }
    if let Some(ref record) = report.dmarc.record {
        pairs.push(("DMARC TXT", record.clone()));
    }
    if let Some(ref metric) = report.latest_metric {
        let reputation = metric
            .domain_reputation
            .map_or_else(|| "-".to_owned(), |r| r.to_string());
        pairs.push((
            "Metrics",
            format!(
                "{} spam, reputation {reputation} ({})",
                format_rate(metric.spam_rate),
                metric.date
            ),
        ));
    }
    let mut out = output::detail_lines(&pairs);
    for warning in &report.warnings {
        out.push('\n');
        out.push_str(&painter.paint(&format!("warning: {warning}"), Tone::Caution));
    }
    out
}

pub async fn handle(ctx: &Context, args: CheckArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let zone_root = util::resolve_domain(args.domain.as_deref(), ctx.default_domain.as_deref())?;
    let req = ComplianceRequest {
        zone_root,
        fqdn: args.fqdn,
        source: util::check_source(args.source),
    };

    let report = util::with_spinner("Checking DNS", global, ctx.engine.compliance_check(&req)).await?;

    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, painter),
        |r| {
            if r.snapshot().is_compliant() {
                "compliant".into()
            } else {
                "non-compliant".into()
            }
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
