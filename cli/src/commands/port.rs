//! `appfleet port <port>` — move an application to another port.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{Target, finish};

#[derive(Args, Debug)]
pub struct PortArgs {
    /// New port (1024-65535, unused by other applications and the host)
    pub port: String,

    #[command(flatten)]
    pub target: Target,
}

/// # Errors
///
/// Returns an error if the port is rejected or the registry cannot be
/// written.
pub async fn run(app: &AppContext, args: &PortArgs) -> Result<ExitCode> {
    let _lock = app.lock()?;
    let name = app.target(args.target.app.as_deref())?;
    let reporter = app.reporter();
    let outcome = app
        .orchestrator(&reporter)
        .change_port(&name, &args.port)
        .await?;
    finish(app, &outcome)
}
