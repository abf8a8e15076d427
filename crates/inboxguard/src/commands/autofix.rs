//! Autofix handlers: preview and apply.

use tabled::Tabled;

use inboxguard_core::{
    AutofixRequest, AutofixResponse, ChangeEntry, ComplianceSnapshot, DnsProvider, FailedChange,
};

use crate::cli::{AutofixArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter, Tone};

use super::check::{dmarc_summary, spf_summary};
use super::{Context, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct ChangeRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Type")]
    record_type: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Current")]
    old_value: String,
    #[tabled(rename = "Desired")]
    new_value: String,
}

impl From<&ChangeEntry> for ChangeRow {
    fn from(c: &ChangeEntry) -> Self {
        Self {
            action: c.action.to_string(),
            record_type: c.record_type.to_string(),
            name: c.name.clone(),
            old_value: c.old_value.clone().unwrap_or_else(|| "-".into()),
            new_value: c.new_value.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct FailedRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Transient")]
    transient: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&FailedChange> for FailedRow {
    fn from(f: &FailedChange) -> Self {
        Self {
            action: f.change.action.to_string(),
            name: f.change.name.clone(),
            transient: if f.transient { "yes" } else { "no" }.into(),
            error: f.error.clone(),
        }
    }
}

pub(crate) fn change_id(c: &ChangeEntry) -> String {
    format!("{} {} {}", c.action, c.record_type, c.name)
}

pub(crate) fn render_changes(changes: &[ChangeEntry]) -> String {
    output::render_table(&changes.iter().map(ChangeRow::from).collect::<Vec<_>>())
}

pub(crate) fn render_failed(failed: &[FailedChange]) -> String {
    output::render_table(&failed.iter().map(FailedRow::from).collect::<Vec<_>>())
}

fn postcheck_line(postcheck: &ComplianceSnapshot, painter: Painter) -> String {
    format!(
        "Postcheck: SPF {}, DMARC {}",
        spf_summary(&postcheck.spf, painter),
        dmarc_summary(&postcheck.dmarc, painter)
    )
}

// ── Detail view ─────────────────────────────────────────────────────

fn detail(resp: &AutofixResponse, painter: Painter) -> String {
    let mut sections = Vec::new();
    if resp.applied {
        if resp.changes.is_empty() {
            sections.push(painter.paint("No changes applied", Tone::Muted));
        } else {
            sections.push(format!("Applied {} change(s):", resp.changes.len()));
            sections.push(render_changes(&resp.changes));
        }
        if !resp.skipped.is_empty() {
            sections.push(format!("Already satisfied ({}):", resp.skipped.len()));
            sections.push(render_changes(&resp.skipped));
        }
        if !resp.failed.is_empty() {
            sections.push(painter.paint(&format!("Failed ({}):", resp.failed.len()), Tone::Bad));
            sections.push(render_failed(&resp.failed));
        }
        if let Some(ref postcheck) = resp.postcheck {
            sections.push(postcheck_line(postcheck, painter));
        }
        if let Some(ref err) = resp.postcheck_error {
            sections.push(painter.paint(&format!("Postcheck unavailable: {err}"), Tone::Caution));
        }
    } else if resp.idempotent {
        sections.push(painter.paint("Zone already compliant; nothing to change", Tone::Good));
    } else {
        sections.push(format!("Planned {} change(s):", resp.changes.len()));
        sections.push(render_changes(&resp.changes));
        sections.push(painter.paint(
            "Preview only. Re-run with --apply to make these changes.",
            Tone::Muted,
        ));
    }
    sections.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: AutofixArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let zone_root = util::resolve_domain(args.domain.as_deref(), ctx.default_domain.as_deref())?;
    let painter = Painter::new(&global.color);
    if args.apply && !ctx.engine.provider().can_mutate() {
        return Err(CliError::NoCredentials {
            operation: "autofix apply".into(),
        });
    }

    let preview = util::with_spinner(
        "Planning",
        global,
        ctx.engine.autofix(&AutofixRequest {
            zone_root: zone_root.clone(),
            apply: false,
        }),
    )
    .await?;

    if !args.apply || preview.idempotent {
        print_response(&preview, global, painter);
        return Ok(());
    }

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!("{}", render_changes(&preview.changes));
    }
    let prompt = format!("Apply {} change(s) to {zone_root}?", preview.changes.len());
    if !util::confirm(&prompt, global.yes)? {
        return Ok(());
    }

    let resp = util::with_spinner(
        "Applying",
        global,
        ctx.engine.autofix(&AutofixRequest {
            zone_root,
            apply: true,
        }),
    )
    .await?;
    print_response(&resp, global, painter);

    if resp.failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::PartialApply {
            failed: resp.failed.len(),
            attempted: resp.changes.len() + resp.skipped.len() + resp.failed.len(),
        })
    }
}

fn print_response(resp: &AutofixResponse, global: &GlobalOpts, painter: Painter) {
    let out = output::render_single(
        &global.output,
        resp,
        |r| detail(r, painter),
        |r| r.changes.iter().map(change_id).collect::<Vec<_>>().join("\n"),
    );
    output::print_output(&out, global.quiet);
}
