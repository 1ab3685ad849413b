//! `appfleet create <name>` — register and scaffold a new application.

use std::process::ExitCode;

use anyhow::Result;
use appfleet_common::RuntimeFlavor;
use clap::Args;

use crate::app::AppContext;
use crate::commands::finish;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// New application name (letters, digits, `-`, `_`)
    pub name: String,

    /// Process manager (defaults to `default_flavor` from the config)
    #[arg(long, value_enum)]
    pub flavor: Option<RuntimeFlavor>,
}

/// # Errors
///
/// Returns an error if the name is rejected, no port is free, or the
/// registry cannot be written.
pub async fn run(app: &AppContext, args: &CreateArgs) -> Result<ExitCode> {
    let _lock = app.lock()?;
    let reporter = app.reporter();
    let outcome = app
        .orchestrator(&reporter)
        .create(&args.name, args.flavor)
        .await?;
    app.output
        .info(&format!("next: appfleet setup --app {}", args.name));
    finish(app, &outcome)
}
