//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::infra::privilege;
use crate::output::OutputContext;

/// Registry, port allocation and provisioning for web applications on one host
#[derive(Parser)]
#[command(name = "appfleet", version, propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also honoured via `NO_COLOR`)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log diagnostics at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to confirmations and skip prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Runs the interactive menu when omitted on a terminal
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Make another application current
    Switch(commands::switch::SwitchArgs),

    /// Register and scaffold a new application
    Create(commands::create::CreateArgs),

    /// Register an existing application directory
    Import(commands::import::ImportArgs),

    /// Remove an application from the host and the registry
    Delete(commands::delete::DeleteArgs),

    /// Provision and start an application
    Setup(commands::setup::SetupArgs),

    /// Upgrade system packages and the application's dependencies
    Update(commands::update::UpdateArgs),

    /// Switch the process manager
    Flavor(commands::flavor::FlavorArgs),

    /// Move an application to another port
    Port(commands::port::PortArgs),

    /// Control the application's service
    Service(commands::service::ServiceArgs),

    /// Inspect or rebuild the host firewall
    #[command(subcommand)]
    Firewall(commands::firewall::FirewallCommand),

    /// Show every application with its port and stage
    Status,

    /// Back up the registry or show how to restore it
    #[command(subcommand)]
    Backup(commands::backup::BackupCommand),

    /// Recreate the runtime and reset permissions
    Repair(commands::repair::RepairArgs),

    /// Check that an application is serving
    Smoke(commands::smoke::SmokeArgs),

    /// Administer the reverse proxy
    Proxy(commands::proxy::ProxyArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Interactive numbered menu
    Menu,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the process runs as root, the configuration cannot
    /// be loaded, or the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose,
            yes,
            command,
        } = self;
        crate::logging::init(verbose, no_color);

        if let Some(Command::Config(cmd)) = command {
            let ctx = OutputContext::new(no_color, quiet || json);
            return commands::config::run(&ctx, cmd, json);
        }

        privilege::refuse_root()?;

        let flags = AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        };
        let app = AppContext::new(&flags)?;

        let Some(command) = command else {
            if app.can_prompt() {
                return commands::menu::run(&app).await;
            }
            anyhow::bail!("no command given; run `appfleet --help` or `appfleet menu`");
        };

        match command {
            Command::Switch(args) => commands::switch::run(&app, &args),
            Command::Create(args) => commands::create::run(&app, &args).await,
            Command::Import(args) => commands::import::run(&app, &args).await,
            Command::Delete(args) => commands::delete::run(&app, &args).await,
            Command::Setup(args) => commands::setup::run(&app, &args).await,
            Command::Update(args) => commands::update::run(&app, &args).await,
            Command::Flavor(args) => commands::flavor::run(&app, &args).await,
            Command::Port(args) => commands::port::run(&app, &args).await,
            Command::Service(args) => commands::service::run(&app, &args).await,
            Command::Firewall(cmd) => commands::firewall::run(&app, cmd).await,
            Command::Status => commands::status::run(&app),
            Command::Backup(cmd) => commands::backup::run(&app, cmd),
            Command::Repair(args) => commands::repair::run(&app, &args).await,
            Command::Smoke(args) => commands::smoke::run(&app, &args).await,
            Command::Proxy(args) => commands::proxy::run(&app, &args).await,
            Command::Menu => commands::menu::run(&app).await,
            Command::Config(cmd) => commands::config::run(&app.output, cmd, json),
        }
    }
}
