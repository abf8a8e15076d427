mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use inboxguard_core::HttpEngine;

use crate::cli::{Cli, Command};
use crate::commands::Context;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("INBOXGUARD_LOG").unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local-only commands: no provider, no credentials
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Spf(args) => commands::analyze::spf(args, &cli.global).await,
        Command::Dmarc(args) => commands::analyze::dmarc(args, &cli.global).await,
        Command::Headers(args) => commands::analyze::headers(&args, &cli.global),
        Command::Domain(args) => commands::domain::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "inboxguard", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the DNS provider and metrics service
        cmd => {
            let (engine_config, profile) = config::build_engine_config(&cli.global)?;
            let default_domain = engine_config.default_domain.clone();
            let engine = Arc::new(HttpEngine::from_config(engine_config)?);
            let ctx = Context {
                engine,
                profile,
                default_domain,
            };

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &ctx, &cli.global)
                .await
                .map_err(|e| e.with_profile(&ctx.profile))
        }
    }
}
