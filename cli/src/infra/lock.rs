//! Single-writer guard for a registry directory.
//!
//! A second invocation against the same registry is rejected rather than
//! queued. Exclusion comes from an advisory `flock` on `<registry>/.lock`,
//! which the kernel drops when the holder exits; the pid written into the
//! file is only used to name the holder in the error.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};

use crate::domain::StartupError;
use crate::infra::registry::create_private_dir;

const LOCK_FILE: &str = ".lock";

/// Held for the lifetime of a mutating command; the lock is released on drop.
pub struct RegistryLock {
    _guard: Flock<File>,
    path: PathBuf,
}

impl fmt::Debug for RegistryLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryLock")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RegistryLock {
    /// Take the lock for `registry_dir`, creating the directory 0700 if it
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::RegistryLocked` if another process holds it, or
    /// an I/O error if the lock file cannot be opened or locked.
    pub fn acquire(registry_dir: &Path) -> Result<Self> {
        create_private_dir(registry_dir)?;
        let path = registry_dir.join(LOCK_FILE);

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;

        let mut guard = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(guard) => guard,
            Err((mut file, errno)) if errno == Errno::EWOULDBLOCK => {
                let holder = match read_pid(&mut file) {
                    Some(pid) => format!("pid {pid}"),
                    None => "pid unknown".to_string(),
                };
                return Err(StartupError::RegistryLocked {
                    holder,
                    path: path.display().to_string(),
                }
                .into());
            }
            Err((_, errno)) => {
                return Err(errno).with_context(|| format!("locking {}", path.display()));
            }
        };

        let file: &mut File = &mut guard;
        file.set_len(0)
            .and_then(|()| write!(file, "{}", std::process::id()))
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "registry lock acquired");
        Ok(Self {
            _guard: guard,
            path,
        })
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    content.trim().parse().ok()
}
