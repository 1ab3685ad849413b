//! Host adapter — implements every host controller port by shelling out
//! through a `CommandRunner`.
//!
//! `SystemHost<R>` is generic over the runner so tests can record the exact
//! command lines without spawning processes. Privileged commands are
//! prefixed with `sudo -n` when configured; content destined for privileged
//! paths is piped through `sudo tee`.

mod nginx;
mod packages;
mod permissions;
mod systemd;
mod ufw;

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::CommandRunner;
use crate::domain::config::{HostConfig, TimeoutsConfig};

/// Production implementation of `HostControl` (systemd, nginx, ufw, apt,
/// venv + pip, chown/chmod).
pub struct SystemHost<R: CommandRunner> {
    runner: R,
    use_sudo: bool,
    systemd_dir: PathBuf,
    nginx_enabled: PathBuf,
    install_timeout: Duration,
}

impl<R: CommandRunner> SystemHost<R> {
    pub fn new(runner: R, host: &HostConfig, timeouts: &TimeoutsConfig) -> Self {
        Self {
            runner,
            use_sudo: host.use_sudo,
            systemd_dir: host.systemd_dir.clone(),
            nginx_enabled: host.nginx_enabled.clone(),
            install_timeout: timeouts.install(),
        }
    }

    /// Run as root (via `sudo -n` when enabled) and require success.
    async fn sudo(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.sudo_with(program, args, None).await
    }

    /// Like [`Self::sudo`] with the package-install timeout.
    async fn sudo_long(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.sudo_with(program, args, Some(self.install_timeout)).await
    }

    async fn sudo_with(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<Output> {
        let (program_name, full) = self.elevate(program, args);
        let output = match timeout {
            Some(t) => self.runner.run_with_timeout(program_name, &full, t).await?,
            None => self.runner.run(program_name, &full).await?,
        };
        check(program, args, output)
    }

    /// Run as the invoking user with the package-install timeout and
    /// require success.
    async fn user_long(&self, program: &str, args: &[&str]) -> Result<Output> {
        let output = self
            .runner
            .run_with_timeout(program, args, self.install_timeout)
            .await?;
        check(program, args, output)
    }

    /// Run as the invoking user; the exit status is the answer.
    async fn query(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.runner.run(program, args).await
    }

    /// Replace the content of a root-owned file.
    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let target = path_arg(path)?;
        let output = if self.use_sudo {
            self.runner
                .run_with_stdin("sudo", &["-n", "tee", target], content.as_bytes())
                .await?
        } else {
            self.runner
                .run_with_stdin("tee", &[target], content.as_bytes())
                .await?
        };
        check("tee", &[target], output)
            .map(|_| ())
            .with_context(|| format!("writing {}", path.display()))
    }

    /// Delete a root-owned file; a missing file is fine.
    async fn remove_file(&self, path: &Path) -> Result<()> {
        self.sudo("rm", &["-f", path_arg(path)?]).await.map(|_| ())
    }

    fn elevate<'a>(&self, program: &'a str, args: &[&'a str]) -> (&'a str, Vec<&'a str>) {
        if self.use_sudo {
            let mut full = Vec::with_capacity(args.len() + 2);
            full.push("-n");
            full.push(program);
            full.extend_from_slice(args);
            ("sudo", full)
        } else {
            (program, args.to_vec())
        }
    }
}

/// Turn a non-zero exit into an error carrying the command line and stderr.
fn check(program: &str, args: &[&str], output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    anyhow::bail!(
        "{program} {} exited with {code}: {}",
        args.join(" "),
        stderr.trim()
    )
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("path is not valid UTF-8: {}", path.display()))
}
