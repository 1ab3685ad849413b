//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `appfleet_common` — never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use appfleet_common::{Application, RegistryIndex};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Registry Port ─────────────────────────────────────────────────────────────

/// Durable store of the fleet index and per-application records.
///
/// Every write fully replaces the persisted representation and is atomic:
/// a reader sees either the previous version or the new one.
pub trait RegistryStore {
    /// Load the index, or a single-placeholder index when none is persisted.
    /// The returned index is normalized (`current` names a listed entry).
    fn load_index(&self) -> Result<RegistryIndex>;
    /// Persist the index.
    fn save_index(&self, index: &RegistryIndex) -> Result<()>;
    /// Load the record for `name`, materializing the deterministic default
    /// record when none is persisted. Nothing is written.
    fn load_application(&self, name: &str) -> Result<Application>;
    /// Whether a record file exists for `name`.
    fn has_application(&self, name: &str) -> bool;
    /// Persist a record.
    fn save_application(&self, app: &Application) -> Result<()>;
    /// Remove the record for `name`. Returns `false` when there was none.
    fn remove_application(&self, name: &str) -> Result<bool>;
    /// Every file the registry currently owns (index first).
    fn files(&self) -> Result<Vec<PathBuf>>;
    /// Existing directories the registry owns (root first).
    fn directories(&self) -> Vec<PathBuf>;
}

// ── Host Controller Ports ─────────────────────────────────────────────────────

/// Process supervisor holding one unit per application, keyed by service id.
#[allow(async_fn_in_trait)]
pub trait ServiceController {
    /// Write the unit definition for `service_id`.
    async fn write_unit(&self, service_id: &str, content: &str) -> Result<()>;
    /// Delete the unit definition for `service_id` (absent is not an error).
    async fn remove_unit(&self, service_id: &str) -> Result<()>;
    /// Make the supervisor re-read its unit definitions.
    async fn reload_units(&self) -> Result<()>;
    async fn enable_unit(&self, service_id: &str) -> Result<()>;
    async fn disable_unit(&self, service_id: &str) -> Result<()>;
    async fn start_unit(&self, service_id: &str) -> Result<()>;
    async fn stop_unit(&self, service_id: &str) -> Result<()>;
    async fn restart_unit(&self, service_id: &str) -> Result<()>;
    /// Whether the unit is currently running.
    async fn unit_active(&self, service_id: &str) -> Result<bool>;
    /// Human-readable status text.
    async fn unit_status(&self, service_id: &str) -> Result<String>;
}

/// Reverse-proxy daemon with an "available" and an "enabled" site set.
#[allow(async_fn_in_trait)]
pub trait ProxyController {
    /// Write the site definition to its "available" path.
    async fn write_site(&self, available: &Path, content: &str) -> Result<()>;
    /// Symlink an available site into the enabled set under `service_id`.
    async fn link_site(&self, available: &Path, service_id: &str) -> Result<()>;
    /// Remove `service_id` from the enabled set (absent is not an error).
    async fn unlink_site(&self, service_id: &str) -> Result<()>;
    /// Delete an available site definition (absent is not an error).
    async fn remove_site(&self, available: &Path) -> Result<()>;
    /// Validate the daemon's full configuration.
    async fn test_config(&self) -> Result<()>;
    async fn start_proxy(&self) -> Result<()>;
    async fn reload_proxy(&self) -> Result<()>;
    async fn restart_proxy(&self) -> Result<()>;
    async fn proxy_active(&self) -> Result<bool>;
    async fn proxy_status(&self) -> Result<String>;
    /// Names of the sites currently enabled.
    async fn enabled_sites(&self) -> Result<Vec<String>>;
}

/// Host firewall.
#[allow(async_fn_in_trait)]
pub trait FirewallController {
    /// Drop every rule and restore deny-inbound / allow-outbound.
    async fn reset_firewall(&self) -> Result<()>;
    /// Allow inbound TCP on `port`, annotated with `tag`.
    async fn allow_port(&self, port: u16, tag: &str) -> Result<()>;
    async fn enable_firewall(&self) -> Result<()>;
    async fn firewall_status(&self) -> Result<String>;
}

/// Distribution packages and per-application isolated runtimes.
#[allow(async_fn_in_trait)]
pub trait DependencyInstaller {
    /// Create an isolated runtime at `path`.
    async fn create_environment(&self, path: &Path) -> Result<()>;
    /// Install packages into the runtime at `into`.
    async fn install_packages(&self, packages: &[String], into: &Path) -> Result<()>;
    /// Upgrade packages already present in the runtime at `into`.
    async fn upgrade_packages(&self, packages: &[String], into: &Path) -> Result<()>;
    /// Install a requirements file into the runtime at `into`.
    async fn install_requirements(&self, file: &Path, into: &Path) -> Result<()>;
    async fn install_system_packages(&self, packages: &[String]) -> Result<()>;
    /// Refresh the package index and upgrade installed packages.
    async fn update_system(&self) -> Result<()>;
}

/// Ownership and mode changes on application trees.
#[allow(async_fn_in_trait)]
pub trait PermissionManager {
    /// Recursively set `owner` (`user:group`) on `path`.
    async fn set_owner(&self, path: &Path, owner: &str) -> Result<()>;
    /// Recursively set a symbolic or octal `mode` on `path`.
    async fn set_mode(&self, path: &Path, mode: &str) -> Result<()>;
}

/// Composite trait — everything a workflow needs from the host.
pub trait HostControl:
    ServiceController + ProxyController + FirewallController + DependencyInstaller + PermissionManager
{
}

/// Blanket implementation: any type implementing all five sub-traits is a `HostControl`.
impl<T> HostControl for T where
    T: ServiceController
        + ProxyController
        + FirewallController
        + DependencyInstaller
        + PermissionManager
{
}

// ── Probe Ports ───────────────────────────────────────────────────────────────

/// Live OS port table.
pub trait PortProbe {
    /// Whether some process on the host is bound to `port`.
    fn is_bound(&self, port: u16) -> bool;
}

/// Abstracts network connectivity checks so application services can be tested
/// without real network access.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    /// Check TCP connectivity to the given host and port.
    async fn check_tcp_connectivity(&self, host: &str, port: u16) -> Result<bool>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Local filesystem operations on application trees (user-owned paths).
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
    /// Recursively copy the contents of `from` into `to`.
    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()>;
}
