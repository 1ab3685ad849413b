//! `appfleet import <name> <dir>` — adopt an existing application tree.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use appfleet_common::RuntimeFlavor;
use clap::Args;

use crate::app::AppContext;
use crate::commands::finish;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// New application name
    pub name: String,

    /// Directory holding the application's code
    pub source: PathBuf,

    /// Process manager (defaults to `default_flavor` from the config)
    #[arg(long, value_enum)]
    pub flavor: Option<RuntimeFlavor>,

    /// Run full setup immediately when an entry point is found
    #[arg(long)]
    pub activate: bool,
}

/// # Errors
///
/// Returns an error if the name is rejected, the source is missing, the copy
/// fails, or the registry cannot be written.
pub async fn run(app: &AppContext, args: &ImportArgs) -> Result<ExitCode> {
    let _lock = app.lock()?;
    let reporter = app.reporter();
    let outcome = app
        .orchestrator(&reporter)
        .import(&args.name, &args.source, args.flavor, args.activate)
        .await?;
    finish(app, &outcome)
}
