//! Alert handler.

use tabled::Tabled;

use inboxguard_core::{AlertEvent, AlertsRequest, Severity};

use crate::cli::{AlertsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter, Tone};

use super::{Context, util};

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl AlertRow {
    fn new(a: &AlertEvent, painter: Painter) -> Self {
        let tone = match a.severity {
            Severity::Critical => Tone::Bad,
            Severity::Warning => Tone::Caution,
        };
        Self {
            date: a.date.to_string(),
            domain: a.domain.clone(),
            severity: painter.paint(&a.severity.to_string(), tone),
            reason: a.reason.clone(),
        }
    }
}

pub async fn handle(ctx: &Context, args: AlertsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let req = AlertsRequest {
        domain: args.domain,
        days: args.days,
    };
    let alerts = util::with_spinner("Fetching metrics", global, ctx.engine.alerts(&req)).await?;

    if alerts.is_empty() && !global.quiet {
        eprintln!("No alerts in the last {} day(s)", args.days);
    }
    let painter = Painter::new(&global.color);
    let out = output::render_list(
        &global.output,
        &alerts,
        |a| AlertRow::new(a, painter),
        |a| format!("{} {} {}", a.date, a.domain, a.severity),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
