//! `appfleet setup` — bring an application to `active`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::RegistryStore as _;
use crate::application::services::lifecycle::PortRequest;
use crate::application::services::port_allocator;
use crate::commands::{Target, finish};
use crate::domain::PortSelection;

#[derive(Args, Debug, Default)]
pub struct SetupArgs {
    #[command(flatten)]
    pub target: Target,

    /// Port to serve on (skips the prompt)
    #[arg(long)]
    pub port: Option<String>,
}

/// # Errors
///
/// Returns an error if the application is unknown, the port is rejected, or
/// a registry write fails.
pub async fn run(app: &AppContext, args: &SetupArgs) -> Result<ExitCode> {
    let _lock = app.lock()?;
    let name = app.target(args.target.app.as_deref())?;
    let request = port_request(app, &name, args.port.as_deref())?;

    let reporter = app.reporter();
    let outcome = app.orchestrator(&reporter).full_setup(&name, request).await?;
    finish(app, &outcome)
}

/// Decide how full setup picks the port: an explicit flag wins, then an
/// operator prompt when configured and possible, else automatic.
fn port_request(app: &AppContext, name: &str, explicit: Option<&str>) -> Result<PortRequest> {
    if let Some(port) = explicit {
        return Ok(PortRequest::Explicit(port.to_string()));
    }
    if app.config.ports.selection == PortSelection::Auto || !app.can_prompt() {
        return Ok(PortRequest::Auto);
    }

    let suggestion = suggest_port(app, name)?;
    let answer: String = dialoguer::Input::new()
        .with_prompt(format!("Port for '{name}'"))
        .default(suggestion.to_string())
        .interact_text()?;
    Ok(PortRequest::Explicit(answer))
}

/// The recorded port when it still validates, else the first free one.
fn suggest_port(app: &AppContext, name: &str) -> Result<u16> {
    let apps = port_allocator::snapshot(&app.registry)?;
    let recorded = app.registry.load_application(name)?.port;
    if port_allocator::validate(&recorded.to_string(), Some(name), &apps, &app.probe).is_valid() {
        return Ok(recorded);
    }
    let ports = &app.config.ports;
    Ok(port_allocator::find_available(
        ports.range_start,
        ports.range_end,
        Some(name),
        &apps,
        &app.probe,
    )?)
}
