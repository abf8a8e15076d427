//! Watch handler: runs a status monitor until Ctrl-C or `--count`.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use inboxguard_core::model::metrics::format_rate;
use inboxguard_core::{ComplianceSnapshot, MonitorConfig, QuickStatus, StatusMonitor, Tile};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Painter, Tone};

use super::check::{dkim_summary, dmarc_summary, spf_summary};
use super::{Context, util};

fn tile_line<T>(tile: &Tile<T>, painter: Painter, render: impl Fn(&T) -> String) -> String {
    let mut line = tile
        .data
        .as_ref()
        .map_or_else(|| painter.paint("no data", Tone::Muted), render);
    if let Some(ref err) = tile.error {
        let age = tile
            .last_updated
            .map_or_else(|| "never".to_owned(), |t| t.format("%H:%M:%S").to_string());
        line.push_str(&painter.paint(&format!("  (stale since {age}: {err})"), Tone::Caution));
    }
    line
}

fn detail(status: &QuickStatus, painter: Painter) -> String {
    let pairs = vec![
        (
            "Checked",
            format!("{} {}", status.domain, status.checked_at.format("%Y-%m-%d %H:%M:%S UTC")),
        ),
        (
            "SPF",
            tile_line(&status.dns, painter, |s| spf_summary(&s.spf, painter)),
        ),
        (
            "DMARC",
            tile_line(&status.dns, painter, |s| dmarc_summary(&s.dmarc, painter)),
        ),
        (
            "DKIM",
            tile_line(&status.dkim, painter, |d| dkim_summary(d, painter)),
        ),
        (
            "Metrics",
            tile_line(&status.metrics, painter, |m| {
                format!("{} spam ({})", format_rate(m.spam_rate), m.date)
            }),
        ),
    ];
    output::detail_lines(&pairs)
}

fn plain(status: &QuickStatus) -> String {
    let compliant = status.dns.data.as_ref().map(ComplianceSnapshot::is_compliant);
    let state = match compliant {
        Some(true) => "compliant",
        Some(false) => "non-compliant",
        None => "unknown",
    };
    format!("{} {} {state}", status.checked_at.to_rfc3339(), status.domain)
}

pub async fn handle(ctx: &Context, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let domain = util::resolve_domain(args.domain.as_deref(), ctx.default_domain.as_deref())?;
    let cancel = CancellationToken::new();
    let monitor = StatusMonitor::spawn(
        ctx.engine.clone(),
        MonitorConfig {
            domain,
            interval: Duration::from_secs(args.interval),
            source: util::check_source(args.source),
        },
        cancel.clone(),
    )?;
    let mut updates = monitor.subscribe();
    let painter = Painter::new(&global.color);
    let mut seen: u32 = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(status) = updates.borrow_and_update().clone() else {
                    continue;
                };
                let out = output::render_single(
                    &global.output,
                    &status,
                    |s| detail(s, painter),
                    plain,
                );
                output::print_output(&out, global.quiet);
                seen += 1;
                if args.count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}
