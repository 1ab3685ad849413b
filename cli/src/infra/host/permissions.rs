//! `PermissionManager` over chown/chmod.

use std::path::Path;

use anyhow::Result;

use super::{SystemHost, path_arg};
use crate::application::ports::{CommandRunner, PermissionManager};

impl<R: CommandRunner> PermissionManager for SystemHost<R> {
    async fn set_owner(&self, path: &Path, owner: &str) -> Result<()> {
        self.sudo("chown", &["-R", owner, path_arg(path)?])
            .await
            .map(|_| ())
    }

    async fn set_mode(&self, path: &Path, mode: &str) -> Result<()> {
        self.sudo("chmod", &["-R", mode, path_arg(path)?])
            .await
            .map(|_| ())
    }
}
