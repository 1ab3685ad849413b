//! appfleet - registry, port allocation and provisioning for web
//! applications on one host

use std::process::ExitCode;

use appfleet_cli::cli::Cli;
use appfleet_cli::domain::classify;
use appfleet_cli::output::{OutputContext, json};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (json_mode, no_color) = (cli.json, cli.no_color);
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            let (category, code) = classify(&e);
            tracing::debug!(category = category.as_str(), code, error = ?e, "command failed");
            let message = format!("{e:#}");
            match json::format_error(&message, category.as_str(), code) {
                Ok(text) if json_mode => eprintln!("{text}"),
                _ => OutputContext::new(no_color, false).error(&message),
            }
            ExitCode::FAILURE
        }
    }
}
