//! `appfleet repair` — recreate the runtime and reset permissions.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{Target, finish};

#[derive(Args, Debug, Default)]
pub struct RepairArgs {
    #[command(flatten)]
    pub target: Target,
}

/// # Errors
///
/// Returns an error if the application has no record.
pub async fn run(app: &AppContext, args: &RepairArgs) -> Result<ExitCode> {
    let _lock = app.lock()?;
    let name = app.target(args.target.app.as_deref())?;
    let reporter = app.reporter();
    let outcome = app.orchestrator(&reporter).repair(&name).await?;
    finish(app, &outcome)
}
