//! `appfleet update` — upgrade host packages and the application runtime.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{Target, finish};

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub target: Target,
}

/// # Errors
///
/// Returns an error if the registry cannot be read.
pub async fn run(app: &AppContext, args: &UpdateArgs) -> Result<ExitCode> {
    let _lock = app.lock()?;
    let name = app.target(args.target.app.as_deref())?;
    let reporter = app.reporter();
    let outcome = app.orchestrator(&reporter).update(&name).await?;
    finish(app, &outcome)
}
