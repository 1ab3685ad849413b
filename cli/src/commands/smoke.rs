//! `appfleet smoke` — check that an application is actually serving.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::Target;
use crate::output::progress::SpinnerGuard;
use crate::output::{SilentReporter, json};

#[derive(Args, Debug, Default)]
pub struct SmokeArgs {
    #[command(flatten)]
    pub target: Target,
}

/// Exits non-zero when any check fails.
///
/// # Errors
///
/// Returns an error if the application has no record.
pub async fn run(app: &AppContext, args: &SmokeArgs) -> Result<ExitCode> {
    let name = app.target(args.target.app.as_deref())?;
    let checks = {
        let _spinner = SpinnerGuard::start(&app.output, &format!("smoke testing '{name}'..."));
        app.orchestrator(&SilentReporter)
            .smoke_test(&name, &app.probe)
            .await?
    };

    if app.is_json() {
        json::print(&checks)?;
    } else {
        app.renderer().render_smoke(&checks);
    }
    if checks.iter().all(|c| c.passed) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
