//! `FirewallController` over ufw.

use anyhow::Result;

use super::SystemHost;
use crate::application::ports::{CommandRunner, FirewallController};

impl<R: CommandRunner> FirewallController for SystemHost<R> {
    async fn reset_firewall(&self) -> Result<()> {
        self.sudo("ufw", &["--force", "reset"]).await?;
        self.sudo("ufw", &["default", "deny", "incoming"]).await?;
        self.sudo("ufw", &["default", "allow", "outgoing"]).await?;
        Ok(())
    }

    async fn allow_port(&self, port: u16, tag: &str) -> Result<()> {
        let rule = format!("{port}/tcp");
        self.sudo("ufw", &["allow", &rule, "comment", tag])
            .await
            .map(|_| ())
    }

    async fn enable_firewall(&self) -> Result<()> {
        self.sudo("ufw", &["--force", "enable"]).await.map(|_| ())
    }

    async fn firewall_status(&self) -> Result<String> {
        let output = self.sudo("ufw", &["status", "verbose"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
