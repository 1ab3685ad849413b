//! `appfleet status` — fleet overview.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::output::{SilentReporter, json};

/// # Errors
///
/// Returns an error if the registry cannot be read.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let rows = app.orchestrator(&SilentReporter).fleet_status()?;
    if app.is_json() {
        json::print(&rows)?;
    } else {
        app.renderer().render_fleet(&rows);
    }
    Ok(ExitCode::SUCCESS)
}
