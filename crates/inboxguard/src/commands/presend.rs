//! Presend gate handler.

use std::io::IsTerminal;

use inboxguard_core::model::metrics::format_rate;
use inboxguard_core::{Decision, PresendDecision, PresendRequest};

use crate::cli::{GlobalOpts, PresendArgs};
use crate::error::CliError;
use crate::output::{self, Painter, Tone};

use super::{Context, util};

fn decision_tone(decision: Decision) -> Tone {
    match decision {
        Decision::Pass => Tone::Good,
        Decision::PassWithOverride => Tone::Caution,
        Decision::Block => Tone::Bad,
    }
}

fn detail(d: &PresendDecision, painter: Painter) -> String {
    let mut lines = vec![format!(
        "Decision: {}",
        painter.paint(&d.decision.to_string(), decision_tone(d.decision))
    )];
    if let Some(ref metric) = d.latest_metrics {
        let reputation = metric
            .domain_reputation
            .map_or_else(|| "-".to_owned(), |r| r.to_string());
        lines.push(format!(
            "Latest metrics ({}): spam {}, reputation {reputation}",
            metric.date,
            format_rate(metric.spam_rate)
        ));
    }
    if !d.reasons.is_empty() {
        lines.push(String::new());
        lines.push("Reasons:".into());
        lines.extend(d.reasons.iter().map(|r| format!("  - {r}")));
        lines.push("Checklist:".into());
        lines.extend(
            d.checklist
                .iter()
                .enumerate()
                .map(|(i, item)| format!("  [{}] {item}", i + 1)),
        );
    }
    if !d.fix_snippets.is_empty() {
        lines.push("Header fix:".into());
        lines.extend(d.fix_snippets.iter().map(|s| format!("  {s}")));
    }
    lines.join("\n")
}

/// Map `--ack` values onto checklist items. A value is either the item
/// text or its 1-based position in the checklist.
fn resolve_acks(raw: &[String], checklist: &[String]) -> Vec<String> {
    raw.iter()
        .map(|ack| {
            ack.trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| checklist.get(i))
                .cloned()
                .unwrap_or_else(|| ack.clone())
        })
        .collect()
}

/// Ask about each checklist item; `--yes` acknowledges all of them.
fn prompt_acks(checklist: &[String], yes: bool) -> Result<Vec<String>, CliError> {
    if yes {
        return Ok(checklist.to_vec());
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: "presend override".into(),
        });
    }
    let mut acks = Vec::new();
    for item in checklist {
        let accepted = dialoguer::Confirm::new()
            .with_prompt(format!("Acknowledge: {item}?"))
            .default(false)
            .interact()
            .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        if accepted {
            acks.push(item.clone());
        }
    }
    Ok(acks)
}

pub async fn handle(ctx: &Context, args: PresendArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let domain = util::resolve_domain(args.domain.as_deref(), ctx.default_domain.as_deref())?;
    let raw_headers = args
        .headers
        .as_deref()
        .map(|p| util::read_input(Some(p)))
        .transpose()?;

    let mut req = PresendRequest {
        domain,
        raw_headers,
        allow_override: false,
        acknowledgments: Vec::new(),
    };
    let mut decision =
        util::with_spinner("Evaluating", global, ctx.engine.presend_check(&req)).await?;

    if decision.is_blocked() && args.allow_override {
        req.allow_override = true;
        req.acknowledgments = if args.acknowledgments.is_empty() {
            prompt_acks(&decision.checklist, global.yes)?
        } else {
            resolve_acks(&args.acknowledgments, &decision.checklist)
        };
        decision = ctx.engine.presend_check(&req).await?;
        tracing::info!(
            decision = %decision.decision,
            acks = req.acknowledgments.len(),
            "override evaluated"
        );
    }

    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &decision,
        |d| detail(d, painter),
        |d| d.decision.to_string(),
    );
    output::print_output(&out, global.quiet);

    if decision.is_blocked() {
        Err(CliError::PresendBlocked {
            reasons: decision.reasons.len(),
        })
    } else {
        Ok(())
    }
}
