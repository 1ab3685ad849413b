//! `appfleet service <start|stop|restart|status>`.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::application::services::maintenance::ServiceAction;
use crate::commands::{Target, print_text};
use crate::output::SilentReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceVerb {
    Start,
    Stop,
    Restart,
    Status,
}

impl From<ServiceVerb> for ServiceAction {
    fn from(verb: ServiceVerb) -> Self {
        match verb {
            ServiceVerb::Start => Self::Start,
            ServiceVerb::Stop => Self::Stop,
            ServiceVerb::Restart => Self::Restart,
            ServiceVerb::Status => Self::Status,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServiceArgs {
    #[arg(value_enum)]
    pub action: ServiceVerb,

    #[command(flatten)]
    pub target: Target,
}

/// # Errors
///
/// Returns an error if the application has no record or the supervisor
/// command fails.
pub async fn run(app: &AppContext, args: &ServiceArgs) -> Result<ExitCode> {
    let name = app.target(args.target.app.as_deref())?;
    let text = app
        .orchestrator(&SilentReporter)
        .control_service(&name, args.action.into())
        .await?;
    if args.action == ServiceVerb::Status {
        return print_text(app, "status", &text);
    }
    if app.is_json() {
        crate::output::json::print(&serde_json::json!({ "application": name, "result": text }))?;
    } else {
        app.output.success(&text);
    }
    Ok(ExitCode::SUCCESS)
}
