//! `DependencyInstaller` over apt-get and per-application venv + pip.

use std::path::Path;

use anyhow::Result;

use super::{SystemHost, path_arg};
use crate::application::ports::{CommandRunner, DependencyInstaller};

impl<R: CommandRunner> SystemHost<R> {
    async fn pip(&self, into: &Path, args: &[&str]) -> Result<()> {
        let pip = into.join("bin").join("pip");
        self.user_long(path_arg(&pip)?, args).await.map(|_| ())
    }

    async fn apt(&self, args: &[&str]) -> Result<()> {
        let mut full = vec!["DEBIAN_FRONTEND=noninteractive", "apt-get"];
        full.extend_from_slice(args);
        self.sudo_long("env", &full).await.map(|_| ())
    }
}

impl<R: CommandRunner> DependencyInstaller for SystemHost<R> {
    async fn create_environment(&self, path: &Path) -> Result<()> {
        self.user_long("python3", &["-m", "venv", path_arg(path)?])
            .await
            .map(|_| ())
    }

    async fn install_packages(&self, packages: &[String], into: &Path) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let mut args = vec!["install", "--quiet"];
        args.extend(packages.iter().map(String::as_str));
        self.pip(into, &args).await
    }

    async fn upgrade_packages(&self, packages: &[String], into: &Path) -> Result<()> {
        let mut args = vec!["install", "--quiet", "--upgrade", "pip"];
        args.extend(packages.iter().map(String::as_str));
        self.pip(into, &args).await
    }

    async fn install_requirements(&self, file: &Path, into: &Path) -> Result<()> {
        self.pip(into, &["install", "--quiet", "-r", path_arg(file)?])
            .await
    }

    async fn install_system_packages(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let mut args = vec!["install", "-y"];
        args.extend(packages.iter().map(String::as_str));
        self.apt(&args).await
    }

    async fn update_system(&self) -> Result<()> {
        self.apt(&["update"]).await?;
        self.apt(&["upgrade", "-y"]).await
    }
}
