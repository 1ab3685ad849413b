//! `appfleet backup <create|restore>` — archive the registry, or print how
//! to put an archive back.

use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::RegistryStore as _;
use crate::infra::backup;
use crate::output::json;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum BackupCommand {
    /// Write a compressed archive of every registry file
    Create,
    /// Print the manual restore procedure
    Restore,
}

/// # Errors
///
/// Returns an error if the registry cannot be listed or the archive cannot
/// be written.
pub fn run(app: &AppContext, cmd: BackupCommand) -> Result<ExitCode> {
    match cmd {
        BackupCommand::Create => create(app),
        BackupCommand::Restore => {
            let steps = backup::restore_instructions(app.registry.root(), &app.config.backup_dir);
            if app.is_json() {
                json::print(&serde_json::json!({ "procedure": steps.lines().collect::<Vec<_>>() }))?;
            } else {
                app.output.header("Restoring the registry from a backup");
                println!();
                app.output.raw(&steps);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn create(app: &AppContext) -> Result<ExitCode> {
    // Hold the lock so the archive is a consistent snapshot.
    let _lock = app.lock()?;
    let files = app.registry.files()?;
    let archive = backup::create_archive(
        app.registry.root(),
        &files,
        &app.config.backup_dir,
        Utc::now(),
    )?;
    if app.is_json() {
        json::print(&archive)?;
    } else {
        app.output.success(&format!(
            "archived {} file(s) to {}",
            archive.files,
            archive.archive.display()
        ));
        app.output.kv("sha256:", &archive.sha256);
        app.output.kv("checksum:", &archive.checksum.display().to_string());
    }
    Ok(ExitCode::SUCCESS)
}
