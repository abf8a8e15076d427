//! Command dispatch: bridges CLI args -> engine calls -> output formatting.

pub mod alerts;
pub mod analyze;
pub mod autofix;
pub mod check;
pub mod config_cmd;
pub mod dkim;
pub mod domain;
pub mod metrics;
pub mod presend;
pub mod util;
pub mod watch;

use std::sync::Arc;

use inboxguard_core::HttpEngine;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// What provider-bound handlers share.
pub struct Context {
    pub engine: Arc<HttpEngine>,
    pub profile: String,
    /// The profile's `zone_root`, if any.
    pub default_domain: Option<String>,
}

/// Dispatch a provider-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Check(args) => check::handle(ctx, args, global).await,
        Command::Autofix(args) => autofix::handle(ctx, args, global).await,
        Command::Dkim(args) => dkim::handle(ctx, args, global).await,
        Command::Presend(args) => presend::handle(ctx, args, global).await,
        Command::Alerts(args) => alerts::handle(ctx, args, global).await,
        Command::Metrics(args) => metrics::handle(ctx, args, global).await,
        Command::Watch(args) => watch::handle(ctx, args, global).await,
        // Local commands are handled before dispatch
        Command::Spf(_)
        | Command::Dmarc(_)
        | Command::Headers(_)
        | Command::Domain(_)
        | Command::Config(_)
        | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the provider dispatcher".into(),
        )),
    }
}
