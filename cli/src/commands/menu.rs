//! `appfleet menu` — numbered interactive menu over every command.
//!
//! Each entry gathers its arguments with `dialoguer` prompts and then runs
//! the same handler the subcommand would. A failing entry is reported and
//! the menu continues.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use appfleet_common::RuntimeFlavor;
use dialoguer::{Confirm, Input, Select};

use crate::app::AppContext;
use crate::application::ports::RegistryStore as _;
use crate::commands::{
    backup, create, delete, firewall, flavor, import, port, proxy, repair, service, setup, smoke,
    status, switch, update, Target,
};
use crate::domain::classify;

const ENTRIES: [&str; 15] = [
    "Exit",
    "Switch application",
    "Create application",
    "Import application",
    "Delete application",
    "Full setup",
    "Update system and dependencies",
    "Switch runtime flavor",
    "Change port",
    "Service control",
    "Firewall status",
    "Fleet status",
    "Backup / restore",
    "Repair / smoke test",
    "Proxy administration",
];

/// # Errors
///
/// Returns an error only if the terminal cannot be driven.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    loop {
        let current = app.registry.load_index()?.current;
        println!();
        app.output.header(&format!("appfleet (current: {current})"));
        let items: Vec<String> = ENTRIES
            .iter()
            .enumerate()
            .map(|(i, label)| format!("{i:>2}. {label}"))
            .collect();
        let Some(choice) = Select::new()
            .with_prompt("Choose an action")
            .items(&items)
            .default(0)
            .interact_opt()?
        else {
            return Ok(ExitCode::SUCCESS);
        };
        if choice == 0 {
            return Ok(ExitCode::SUCCESS);
        }

        if let Err(e) = dispatch(app, choice).await {
            let (category, code) = classify(&e);
            tracing::debug!(category = category.as_str(), code, "menu action failed");
            app.output.error(&format!("{e:#}"));
        }
    }
}

async fn dispatch(app: &AppContext, choice: usize) -> Result<ExitCode> {
    let here = Target::default();
    match choice {
        1 => {
            let index = app.registry.load_index()?;
            let selected = Select::new()
                .with_prompt("Switch to")
                .items(&index.applications)
                .default(
                    index
                        .applications
                        .iter()
                        .position(|n| *n == index.current)
                        .unwrap_or(0),
                )
                .interact()?;
            let selection = (selected + 1).to_string();
            switch::run(app, &switch::SwitchArgs { selection })
        }
        2 => {
            let name: String = Input::new().with_prompt("Application name").interact_text()?;
            let flavor = pick_flavor(app.config.default_flavor)?;
            create::run(app, &create::CreateArgs { name, flavor: Some(flavor) }).await
        }
        3 => {
            let name: String = Input::new().with_prompt("Application name").interact_text()?;
            let source: String = Input::new().with_prompt("Source directory").interact_text()?;
            let flavor = pick_flavor(app.config.default_flavor)?;
            let activate = Confirm::new()
                .with_prompt("Run full setup after import?")
                .default(false)
                .interact()?;
            let args = import::ImportArgs {
                name,
                source: PathBuf::from(source),
                flavor: Some(flavor),
                activate,
            };
            import::run(app, &args).await
        }
        4 => {
            let index = app.registry.load_index()?;
            let candidates: Vec<&String> = index
                .applications
                .iter()
                .filter(|n| **n != index.current)
                .collect();
            if candidates.is_empty() {
                app.output
                    .info("Only the current application is registered; switch first.");
                return Ok(ExitCode::SUCCESS);
            }
            let selected = Select::new()
                .with_prompt("Delete")
                .items(&candidates)
                .interact()?;
            let name = candidates[selected].clone();
            delete::run(app, &delete::DeleteArgs { name }).await
        }
        5 => setup::run(app, &setup::SetupArgs::default()).await,
        6 => update::run(app, &update::UpdateArgs::default()).await,
        7 => {
            let flavor = pick_flavor(app.config.default_flavor)?;
            flavor::run(app, &flavor::FlavorArgs { flavor, target: here }).await
        }
        8 => {
            let port: String = Input::new().with_prompt("New port").interact_text()?;
            port::run(app, &port::PortArgs { port, target: here }).await
        }
        9 => {
            let verbs = [
                service::ServiceVerb::Start,
                service::ServiceVerb::Stop,
                service::ServiceVerb::Restart,
                service::ServiceVerb::Status,
            ];
            let selected = Select::new()
                .with_prompt("Service")
                .items(&["start", "stop", "restart", "status"])
                .default(3)
                .interact()?;
            let args = service::ServiceArgs {
                action: verbs[selected],
                target: here,
            };
            service::run(app, &args).await
        }
        10 => firewall::run(app, firewall::FirewallCommand::Status).await,
        11 => status::run(app),
        12 => {
            let selected = Select::new()
                .items(&["Create backup", "Show restore procedure"])
                .default(0)
                .interact()?;
            let cmd = if selected == 0 {
                backup::BackupCommand::Create
            } else {
                backup::BackupCommand::Restore
            };
            backup::run(app, cmd)
        }
        13 => {
            let selected = Select::new()
                .items(&["Repair", "Smoke test"])
                .default(0)
                .interact()?;
            if selected == 0 {
                repair::run(app, &repair::RepairArgs::default()).await
            } else {
                smoke::run(app, &smoke::SmokeArgs::default()).await
            }
        }
        14 => {
            let verbs = [
                proxy::ProxyVerb::Test,
                proxy::ProxyVerb::Reload,
                proxy::ProxyVerb::Restart,
                proxy::ProxyVerb::Status,
                proxy::ProxyVerb::Sites,
            ];
            let selected = Select::new()
                .with_prompt("Proxy")
                .items(&["test configuration", "reload", "restart", "status", "enabled sites"])
                .default(0)
                .interact()?;
            proxy::run(app, &proxy::ProxyArgs { action: verbs[selected] }).await
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn pick_flavor(default: RuntimeFlavor) -> Result<RuntimeFlavor> {
    let flavors = [RuntimeFlavor::Gunicorn, RuntimeFlavor::Uwsgi];
    let selected = Select::new()
        .with_prompt("Runtime flavor")
        .items(&flavors.map(RuntimeFlavor::as_str))
        .default(flavors.iter().position(|f| *f == default).unwrap_or(0))
        .interact()?;
    Ok(flavors[selected])
}
