//! `appfleet config` — inspect the effective configuration.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::domain::FleetConfig;
use crate::infra::config::YamlConfigStore;
use crate::output::{HumanRenderer, OutputContext, json};

/// Config subcommands.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

/// Runs without an `AppContext`: reading configuration needs no host or
/// registry access, and a broken config file must still be locatable.
///
/// # Errors
///
/// Returns an error if the path cannot be determined or, for `show`, the
/// file cannot be parsed.
pub fn run(ctx: &OutputContext, cmd: ConfigCommand, json_mode: bool) -> Result<ExitCode> {
    let store = YamlConfigStore;
    let path = store.path()?;
    match cmd {
        ConfigCommand::Path => {
            if json_mode {
                json::print(&serde_json::json!({ "path": path }))?;
            } else {
                println!("{}", path.display());
            }
        }
        ConfigCommand::Show => {
            let config: FleetConfig = store.load()?;
            if json_mode {
                json::print(&serde_json::json!({ "path": path, "config": config }))?;
            } else {
                HumanRenderer::new(ctx).render_config(&config, &path);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
