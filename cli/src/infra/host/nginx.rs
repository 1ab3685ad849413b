//! `ProxyController` over nginx's sites-available / sites-enabled layout.

use std::path::Path;

use anyhow::{Context, Result};

use super::{SystemHost, path_arg};
use crate::application::ports::{CommandRunner, ProxyController};

const DAEMON: &str = "nginx";

impl<R: CommandRunner> ProxyController for SystemHost<R> {
    async fn write_site(&self, available: &Path, content: &str) -> Result<()> {
        self.write_file(available, content).await
    }

    async fn link_site(&self, available: &Path, service_id: &str) -> Result<()> {
        let enabled = self.nginx_enabled.join(service_id);
        self.sudo("ln", &["-sf", path_arg(available)?, path_arg(&enabled)?])
            .await
            .map(|_| ())
    }

    async fn unlink_site(&self, service_id: &str) -> Result<()> {
        let enabled = self.nginx_enabled.join(service_id);
        self.remove_file(&enabled).await
    }

    async fn remove_site(&self, available: &Path) -> Result<()> {
        self.remove_file(available).await
    }

    async fn test_config(&self) -> Result<()> {
        self.sudo(DAEMON, &["-t"]).await.map(|_| ())
    }

    async fn start_proxy(&self) -> Result<()> {
        self.sudo("systemctl", &["start", DAEMON]).await.map(|_| ())
    }

    async fn reload_proxy(&self) -> Result<()> {
        self.sudo("systemctl", &["reload", DAEMON]).await.map(|_| ())
    }

    async fn restart_proxy(&self) -> Result<()> {
        self.sudo("systemctl", &["restart", DAEMON]).await.map(|_| ())
    }

    async fn proxy_active(&self) -> Result<bool> {
        let output = self
            .query("systemctl", &["is-active", "--quiet", DAEMON])
            .await?;
        Ok(output.status.success())
    }

    async fn proxy_status(&self) -> Result<String> {
        let output = self
            .query("systemctl", &["status", "--no-pager", DAEMON])
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn enabled_sites(&self) -> Result<Vec<String>> {
        let dir = self.nginx_enabled.clone();
        tokio::task::spawn_blocking(move || {
            let mut names = Vec::new();
            for entry in std::fs::read_dir(&dir)
                .with_context(|| format!("reading {}", dir.display()))?
            {
                let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();
            Ok::<_, anyhow::Error>(names)
        })
        .await
        .context("listing enabled sites task panicked")?
    }
}
