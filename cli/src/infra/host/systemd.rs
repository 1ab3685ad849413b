//! `ServiceController` over systemd.

use anyhow::Result;

use super::SystemHost;
use crate::application::ports::{CommandRunner, ServiceController};

fn unit_file(service_id: &str) -> String {
    format!("{service_id}.service")
}

impl<R: CommandRunner> SystemHost<R> {
    async fn systemctl(&self, verb: &str, service_id: &str) -> Result<()> {
        self.sudo("systemctl", &[verb, &unit_file(service_id)])
            .await
            .map(|_| ())
    }
}

impl<R: CommandRunner> ServiceController for SystemHost<R> {
    async fn write_unit(&self, service_id: &str, content: &str) -> Result<()> {
        let path = self.systemd_dir.join(unit_file(service_id));
        self.write_file(&path, content).await
    }

    async fn remove_unit(&self, service_id: &str) -> Result<()> {
        let path = self.systemd_dir.join(unit_file(service_id));
        self.remove_file(&path).await
    }

    async fn reload_units(&self) -> Result<()> {
        self.sudo("systemctl", &["daemon-reload"]).await.map(|_| ())
    }

    async fn enable_unit(&self, service_id: &str) -> Result<()> {
        self.systemctl("enable", service_id).await
    }

    async fn disable_unit(&self, service_id: &str) -> Result<()> {
        self.systemctl("disable", service_id).await
    }

    async fn start_unit(&self, service_id: &str) -> Result<()> {
        self.systemctl("start", service_id).await
    }

    async fn stop_unit(&self, service_id: &str) -> Result<()> {
        self.systemctl("stop", service_id).await
    }

    async fn restart_unit(&self, service_id: &str) -> Result<()> {
        self.systemctl("restart", service_id).await
    }

    async fn unit_active(&self, service_id: &str) -> Result<bool> {
        let output = self
            .query("systemctl", &["is-active", "--quiet", &unit_file(service_id)])
            .await?;
        Ok(output.status.success())
    }

    async fn unit_status(&self, service_id: &str) -> Result<String> {
        // Exit code 3 just means inactive; the text is what matters.
        let output = self
            .query("systemctl", &["status", "--no-pager", &unit_file(service_id)])
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
