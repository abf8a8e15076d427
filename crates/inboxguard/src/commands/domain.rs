//! Domain selection: which zone commands default to.

use inboxguard_core::DomainSelection;

use crate::cli::{DomainArgs, DomainCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// The active profile's `zone_root`. A missing or unreadable config
/// just means there is no fallback.
fn profile_zone_root(global: &GlobalOpts) -> Option<String> {
    let cfg = config::load_config(global).ok()?;
    let name = config::active_profile_name(global, &cfg);
    cfg.profiles.get(&name)?.zone_root.clone()
}

pub fn handle(args: DomainArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let fallback = profile_zone_root(global);
    let selection = DomainSelection::load(config::state_store(), fallback.as_deref())?;

    match args.command {
        DomainCommand::Show => {
            let current = selection.current().ok_or(CliError::NoDomain)?;
            println!("{current}");
            Ok(())
        }
        DomainCommand::Use { name } => {
            let selected = selection.set(&name)?;
            if !global.quiet {
                eprintln!("✓ Selected {selected}");
            }
            Ok(())
        }
    }
}
