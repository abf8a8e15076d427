//! DKIM selector handlers.

use tabled::Tabled;

use inboxguard_core::{
    DkimApplyRequest, DkimApplyResponse, DkimPostcheck, DkimSelector, DnsProvider,
};

use crate::cli::{DkimArgs, DkimCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter, Tone};

use super::autofix::{change_id, render_changes, render_failed};
use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SelectorRow {
    #[tabled(rename = "Selector")]
    name: String,
    #[tabled(rename = "Resolves To")]
    resolves_to: String,
    #[tabled(rename = "OK")]
    ok: String,
}

impl SelectorRow {
    fn new(d: &DkimPostcheck, painter: Painter) -> Self {
        Self {
            name: d.name.clone(),
            resolves_to: d.resolves_to.clone().unwrap_or_else(|| "-".into()),
            ok: painter.flag(d.ok),
        }
    }
}

fn render_postcheck(postcheck: &[DkimPostcheck], painter: Painter) -> String {
    output::render_table(
        &postcheck
            .iter()
            .map(|d| SelectorRow::new(d, painter))
            .collect::<Vec<_>>(),
    )
}

/// Parse `HOST=TARGET`.
fn parse_selector(raw: &str, ttl: Option<u32>) -> Result<DkimSelector, CliError> {
    let (host, target) = raw
        .split_once('=')
        .map(|(h, t)| (h.trim(), t.trim()))
        .filter(|(h, t)| !h.is_empty() && !t.is_empty())
        .ok_or_else(|| CliError::Validation {
            field: "selector".into(),
            reason: format!("expected HOST=TARGET, got '{raw}'"),
        })?;
    Ok(DkimSelector {
        host: host.to_owned(),
        target: target.to_owned(),
        ttl,
    })
}

fn detail(resp: &DkimApplyResponse, painter: Painter) -> String {
    let mut sections = Vec::new();
    match (&resp.plan, &resp.changes) {
        (Some(plan), _) if plan.is_empty() => {
            sections.push(painter.paint("Selectors already published", Tone::Good));
        }
        (Some(plan), _) => {
            sections.push(format!("Planned {} change(s):", plan.len()));
            sections.push(render_changes(plan));
        }
        (None, Some(changes)) if !changes.is_empty() => {
            sections.push(format!("Applied {} change(s):", changes.len()));
            sections.push(render_changes(changes));
        }
        _ => sections.push(painter.paint("No changes applied", Tone::Muted)),
    }
    if !resp.failed.is_empty() {
        sections.push(painter.paint(&format!("Failed ({}):", resp.failed.len()), Tone::Bad));
        sections.push(render_failed(&resp.failed));
    }
    if !resp.postcheck.is_empty() {
        sections.push(render_postcheck(&resp.postcheck, painter));
    }
    if let Some(ref err) = resp.postcheck_error {
        sections.push(painter.paint(&format!("Postcheck unavailable: {err}"), Tone::Caution));
    }
    sections.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: DkimArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let painter = Painter::new(&global.color);
    match args.command {
        DkimCommand::Status { domain, source } => {
            let zone = util::resolve_domain(domain.as_deref(), ctx.default_domain.as_deref())?;
            let status = util::with_spinner(
                "Resolving selectors",
                global,
                ctx.engine.dkim_status(&zone, util::check_source(source)),
            )
            .await?;
            if status.is_empty() && !global.quiet {
                eprintln!("No DKIM selectors configured for this profile");
            }
            let out = output::render_list(
                &global.output,
                &status,
                |d| SelectorRow::new(d, painter),
                |d| d.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DkimCommand::Apply {
            domain,
            selectors,
            ttl,
            apply,
        } => {
            let zone = util::resolve_domain(domain.as_deref(), ctx.default_domain.as_deref())?;
            let selectors = if selectors.is_empty() {
                ctx.engine
                    .desired()
                    .dkim_selectors
                    .iter()
                    .cloned()
                    .map(|s| DkimSelector { ttl: ttl.or(s.ttl), ..s })
                    .collect()
            } else {
                selectors
                    .iter()
                    .map(|raw| parse_selector(raw, ttl))
                    .collect::<Result<Vec<_>, _>>()?
            };
            if apply && !ctx.engine.provider().can_mutate() {
                return Err(CliError::NoCredentials {
                    operation: "DKIM apply".into(),
                });
            }

            let mut req = DkimApplyRequest {
                zone_root: zone.clone(),
                selectors,
                apply: false,
            };
            if apply {
                let preview = ctx.engine.dkim_apply(&req).await?;
                let planned = preview.plan.unwrap_or_default();
                if planned.is_empty() {
                    if !global.quiet {
                        eprintln!("Selectors already published on {zone}");
                    }
                    return Ok(());
                }
                let prompt = format!("Publish {} DKIM change(s) on {zone}?", planned.len());
                if !util::confirm(&prompt, global.yes)? {
                    return Ok(());
                }
                req.apply = true;
            }

            let resp = util::with_spinner("Publishing", global, ctx.engine.dkim_apply(&req)).await?;
            let out = output::render_single(
                &global.output,
                &resp,
                |r| detail(r, painter),
                |r| {
                    r.plan
                        .as_ref()
                        .or(r.changes.as_ref())
                        .map(|c| c.iter().map(change_id).collect::<Vec<_>>().join("\n"))
                        .unwrap_or_default()
                },
            );
            output::print_output(&out, global.quiet);

            if resp.failed.is_empty() {
                Ok(())
            } else {
                Err(CliError::PartialApply {
                    failed: resp.failed.len(),
                    attempted: resp.failed.len() + resp.changes.as_ref().map_or(0, Vec::len),
                })
            }
        }
    }
}
