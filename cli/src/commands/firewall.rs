//! `appfleet firewall <status|rebuild>`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::commands::print_text;
use crate::output::progress::SpinnerGuard;
use crate::output::{SilentReporter, json};

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum FirewallCommand {
    /// Show the firewall's current rules
    Status,
    /// Reset the firewall and re-allow every registered application port
    Rebuild,
}

/// # Errors
///
/// Returns an error if the status query fails or the registry cannot be read.
pub async fn run(app: &AppContext, cmd: FirewallCommand) -> Result<ExitCode> {
    let orchestrator = app.orchestrator(&SilentReporter);
    match cmd {
        FirewallCommand::Status => {
            let text = {
                let _spinner = SpinnerGuard::start(&app.output, "querying firewall...");
                orchestrator.firewall_status().await?
            };
            print_text(app, "status", &text)
        }
        FirewallCommand::Rebuild => {
            let _lock = app.lock()?;
            let spinner = SpinnerGuard::start(&app.output, "rebuilding firewall...");
            let rebuild = orchestrator.rebuild_firewall().await?;
            if rebuild.warnings.is_empty() {
                spinner.finish_ok(&format!("firewall rebuilt with {} rule(s)", rebuild.rules.len()));
            } else {
                drop(spinner);
            }
            if app.is_json() {
                json::print(&rebuild)?;
            } else {
                app.renderer().render_firewall(&rebuild);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
