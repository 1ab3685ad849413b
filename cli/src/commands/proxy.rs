//! `appfleet proxy <test|reload|restart|status|sites>`.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::application::services::maintenance::ProxyAction;
use crate::commands::print_text;
use crate::output::SilentReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProxyVerb {
    /// Validate the proxy configuration
    Test,
    Reload,
    Restart,
    Status,
    /// List enabled sites
    Sites,
}

impl From<ProxyVerb> for ProxyAction {
    fn from(verb: ProxyVerb) -> Self {
        match verb {
            ProxyVerb::Test => Self::Test,
            ProxyVerb::Reload => Self::Reload,
            ProxyVerb::Restart => Self::Restart,
            ProxyVerb::Status => Self::Status,
            ProxyVerb::Sites => Self::Sites,
        }
    }
}

#[derive(Args, Debug)]
pub struct ProxyArgs {
    #[arg(value_enum)]
    pub action: ProxyVerb,
}

/// # Errors
///
/// Returns an error if the proxy command fails.
pub async fn run(app: &AppContext, args: &ProxyArgs) -> Result<ExitCode> {
    let text = app
        .orchestrator(&SilentReporter)
        .proxy_admin(args.action.into())
        .await?;
    match args.action {
        ProxyVerb::Status | ProxyVerb::Sites => print_text(app, "output", &text),
        ProxyVerb::Test | ProxyVerb::Reload | ProxyVerb::Restart => {
            if app.is_json() {
                crate::output::json::print(&serde_json::json!({ "result": text }))?;
            } else {
                app.output.success(&text);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
