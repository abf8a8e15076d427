//! Shared helpers for command handlers.

use std::future::Future;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use inboxguard_core::{CheckSource, DomainSelection, domain};

use crate::cli::{GlobalOpts, OutputFormat, SourceArg};
use crate::config;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Explicit argument, else the selected domain, else the profile's zone root.
pub fn resolve_domain(arg: Option<&str>, profile_default: Option<&str>) -> Result<String, CliError> {
    if let Some(raw) = arg {
        return Ok(domain::normalize(raw)?);
    }
    let selection = DomainSelection::load(config::state_store(), profile_default)?;
    selection.current().ok_or(CliError::NoDomain)
}

pub fn check_source(arg: SourceArg) -> CheckSource {
    match arg {
        SourceArg::Provider => CheckSource::Provider,
        SourceArg::Live => CheckSource::Live,
    }
}

/// Read a file, or stdin when `path` is `None` or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(p) if p != Path::new("-") => Ok(std::fs::read_to_string(p)?),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Run `fut` behind a stderr spinner when a human is watching.
pub async fn with_spinner<F: Future>(message: &str, global: &GlobalOpts, fut: F) -> F::Output {
    let interactive = !global.quiet
        && matches!(global.output, OutputFormat::Table)
        && std::io::stderr().is_terminal();
    if !interactive {
        return fut.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    spinner.finish_and_clear();
    out
}
