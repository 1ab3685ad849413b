//! `appfleet delete <name>` — tear an application down.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::finish;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Application to delete (must not be the current one)
    pub name: String,
}

/// # Errors
///
/// Returns an error if the application is unknown or current, or the index
/// cannot be written.
pub async fn run(app: &AppContext, args: &DeleteArgs) -> Result<ExitCode> {
    let name = args.name.as_str();
    if !app.non_interactive {
        app.output.warn(&format!(
            "This stops '{name}', removes its service unit, proxy site, runtime and registry record."
        ));
        app.output.info("The application's code directory is kept.");
        if !app.confirm("Continue?", false)? {
            app.output.info("Cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let _lock = app.lock()?;
    let reporter = app.reporter();
    let outcome = app.orchestrator(&reporter).delete(name).await?;
    finish(app, &outcome)
}
