//! Command implementations

pub mod backup;
pub mod config;
pub mod create;
pub mod delete;
pub mod firewall;
pub mod flavor;
pub mod import;
pub mod menu;
pub mod port;
pub mod proxy;
pub mod repair;
pub mod service;
pub mod setup;
pub mod smoke;
pub mod status;
pub mod switch;
pub mod update;

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::domain::WorkflowOutcome;
use crate::output::json;

/// Which application a command acts on.
#[derive(Args, Debug, Clone, Default)]
pub struct Target {
    /// Application name (defaults to the current application)
    #[arg(long, short = 'a')]
    pub app: Option<String>,
}

impl Target {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            app: Some(name.to_string()),
        }
    }
}

/// Print a workflow outcome in the active output mode.
///
/// Tolerated step failures are reported but do not change the exit code;
/// re-running the workflow is the recovery path.
pub(crate) fn finish(app: &AppContext, outcome: &WorkflowOutcome) -> Result<ExitCode> {
    if app.is_json() {
        json::print(outcome)?;
    } else {
        app.renderer().render_outcome(outcome);
    }
    Ok(ExitCode::SUCCESS)
}

/// Print free-form command output (status text, site lists).
pub(crate) fn print_text(app: &AppContext, key: &str, text: &str) -> Result<ExitCode> {
    if app.is_json() {
        json::print(&serde_json::json!({ key: text }))?;
    } else {
        app.output.raw(text);
    }
    Ok(ExitCode::SUCCESS)
}
