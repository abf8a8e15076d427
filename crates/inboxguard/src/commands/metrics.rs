//! Metrics handlers: latest verdict, cached history.

use serde::Serialize;
use tabled::Tabled;

use inboxguard_core::model::metrics::format_rate;
use inboxguard_core::{MetricHistory, SpamMetric, SpamVerdict};

use crate::cli::{GlobalOpts, MetricsArgs, MetricsCommand};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Painter, Tone};

use super::{Context, util};

fn verdict_tone(verdict: SpamVerdict) -> Tone {
    match verdict {
        SpamVerdict::Low => Tone::Good,
        SpamVerdict::Elevated => Tone::Caution,
        SpamVerdict::High => Tone::Bad,
    }
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Spam Rate")]
    spam_rate: String,
    #[tabled(rename = "Reputation")]
    reputation: String,
    #[tabled(rename = "Verdict")]
    verdict: String,
}

impl MetricRow {
    fn new(m: &SpamMetric, painter: Painter) -> Self {
        Self {
            date: m.date.to_string(),
            spam_rate: format_rate(m.spam_rate),
            reputation: m
                .domain_reputation
                .map_or_else(|| "-".to_owned(), |r| r.to_string()),
            verdict: m.spam_rate.map_or_else(
                || "-".to_owned(),
                |r| {
                    let v = SpamVerdict::for_rate(r);
                    painter.paint(&v.to_string(), verdict_tone(v))
                },
            ),
        }
    }
}

/// Latest metric with its verdict and advice.
#[derive(Debug, Serialize)]
struct LatestView {
    domain: String,
    metric: Option<SpamMetric>,
    verdict: Option<SpamVerdict>,
    message: Option<&'static str>,
    recommendations: Vec<&'static str>,
}

impl LatestView {
    fn new(domain: String, metric: Option<SpamMetric>) -> Self {
        let verdict = metric
            .as_ref()
            .and_then(|m| m.spam_rate)
            .map(SpamVerdict::for_rate);
        Self {
            domain,
            metric,
            verdict,
            message: verdict.map(SpamVerdict::message),
            recommendations: verdict.map(|v| v.recommendations().to_vec()).unwrap_or_default(),
        }
    }
}

fn latest_detail(view: &LatestView, painter: Painter) -> String {
    let Some(ref metric) = view.metric else {
        return format!("No metrics reported for {}", view.domain);
    };
    let mut pairs = vec![
        ("Domain", view.domain.clone()),
        ("Date", metric.date.to_string()),
        ("Spam rate", format_rate(metric.spam_rate)),
        (
            "Reputation",
            metric
                .domain_reputation
                .map_or_else(|| "-".to_owned(), |r| r.to_string()),
        ),
    ];
    if let Some(verdict) = view.verdict {
        pairs.push(("Verdict", painter.paint(&verdict.to_string(), verdict_tone(verdict))));
    }
    let mut out = output::detail_lines(&pairs);
    if let Some(message) = view.message {
        out.push_str("\n\n");
        out.push_str(message);
    }
    for rec in &view.recommendations {
        out.push_str("\n  - ");
        out.push_str(rec);
    }
    out
}

fn require_metrics(ctx: &Context) -> Result<(), CliError> {
    if ctx.engine.has_metrics() {
        Ok(())
    } else {
        Err(CliError::MetricsUnavailable(
            "No metrics service configured".into(),
        ))
    }
}

pub async fn handle(ctx: &Context, args: MetricsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let painter = Painter::new(&global.color);
    match args.command {
        MetricsCommand::Latest { domain } => {
            require_metrics(ctx)?;
            let domain = util::resolve_domain(domain.as_deref(), ctx.default_domain.as_deref())?;
            let metric =
                util::with_spinner("Fetching metrics", global, ctx.engine.latest_metric(&domain))
                    .await?;
            let view = LatestView::new(domain, metric);
            let out = output::render_single(
                &global.output,
                &view,
                |v| latest_detail(v, painter),
                |v| v.verdict.map_or_else(|| "-".to_owned(), |v| v.to_string()),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MetricsCommand::History {
            domain,
            days,
            offline,
        } => {
            let domain = util::resolve_domain(domain.as_deref(), ctx.default_domain.as_deref())?;
            let history = MetricHistory::new(config::state_store());
            let rows = if offline {
                history.load(&domain)?
            } else {
                require_metrics(ctx)?;
                let fetched = util::with_spinner(
                    "Fetching metrics",
                    global,
                    ctx.engine.metrics_window(Some(&domain), days),
                )
                .await?;
                history.append(&domain, &fetched)?
            };
            let out = output::render_list(
                &global.output,
                &rows,
                |m| MetricRow::new(m, painter),
                |m| format!("{} {}", m.date, format_rate(m.spam_rate)),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MetricsCommand::ClearCache { domain } => {
            let domain = util::resolve_domain(domain.as_deref(), ctx.default_domain.as_deref())?;
            MetricHistory::new(config::state_store()).clear(&domain)?;
            if !global.quiet {
                eprintln!("Cleared cached metrics for {domain}");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::cli::ColorMode;

    fn metric(rate: Option<f64>) -> SpamMetric {
        SpamMetric {
            domain: None,
            date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            spam_rate: rate,
            domain_reputation: None,
        }
    }

    #[test]
    fn latest_view_carries_verdict_advice() {
        let view = LatestView::new("example.com".into(), Some(metric(Some(0.31))));
        assert_eq!(view.verdict, Some(SpamVerdict::High));
        assert_eq!(view.recommendations.len(), 5);
        let text = latest_detail(&view, Painter::new(&ColorMode::Never));
        assert!(text.contains("31.00%"), "{text}");
        assert!(text.contains("Pause bulk campaigns immediately"), "{text}");
    }

    #[test]
    fn missing_rate_has_no_verdict() {
        let view = LatestView::new("example.com".into(), Some(metric(None)));
        assert_eq!(view.verdict, None);
        assert!(view.recommendations.is_empty());
    }
}
