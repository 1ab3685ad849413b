//! `appfleet flavor <gunicorn|uwsgi>` — switch the process manager.

use std::process::ExitCode;

use anyhow::Result;
use appfleet_common::RuntimeFlavor;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{Target, finish};

#[derive(Args, Debug)]
pub struct FlavorArgs {
    /// Process manager to switch to
    #[arg(value_enum)]
    pub flavor: RuntimeFlavor,

    #[command(flatten)]
    pub target: Target,
}

/// # Errors
///
/// Returns an error if the application has no record or the registry cannot
/// be written.
pub async fn run(app: &AppContext, args: &FlavorArgs) -> Result<ExitCode> {
    let _lock = app.lock()?;
    let name = app.target(args.target.app.as_deref())?;
    let reporter = app.reporter();
    let outcome = app
        .orchestrator(&reporter)
        .change_flavor(&name, args.flavor)
        .await?;
    finish(app, &outcome)
}
