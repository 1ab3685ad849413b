//! `appfleet switch <name|number>` — change the current application.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::output::{SilentReporter, json};

#[derive(Args, Debug)]
pub struct SwitchArgs {
    /// Application name or its 1-based position in `appfleet status`
    pub selection: String,
}

/// # Errors
///
/// Returns an error if the selection matches nothing or the index cannot be
/// written.
pub fn run(app: &AppContext, args: &SwitchArgs) -> Result<ExitCode> {
    let _lock = app.lock()?;
    let name = app.orchestrator(&SilentReporter).switch(&args.selection)?;
    if app.is_json() {
        json::print(&serde_json::json!({ "current": name }))?;
    } else {
        app.output.success(&format!("current application is now '{name}'"));
    }
    Ok(ExitCode::SUCCESS)
}
