//! Domain types for appfleet configuration.
//!
//! Pure data only — no I/O, no async, no filesystem access. The only ambient
//! lookup is the home directory used to root per-user defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use appfleet_common::{ApplicationDefaults, RuntimeFlavor};
use serde::{Deserialize, Serialize};

use crate::domain::error::PortError;
use crate::domain::port::MIN_PORT;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.appfleet/config.yaml`.
///
/// Loaded once per invocation; the resulting value is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Directory holding `fleet.json` and `apps/*.json`.
    pub registry_dir: PathBuf,
    /// Directory receiving registry backup archives.
    pub backup_dir: PathBuf,
    /// Directory under which application roots are created.
    pub apps_root: PathBuf,
    /// Placeholder application used when the index is empty.
    pub default_application: String,
    pub default_flavor: RuntimeFlavor,
    /// WSGI module scaffolded for new applications.
    pub entry_module: String,
    /// Suffix for generated proxy `server_name`s (`<app>.<suffix>`).
    pub server_name_suffix: String,
    pub ports: PortsConfig,
    pub host: HostConfig,
    pub packages: PackagesConfig,
    pub timeouts: TimeoutsConfig,
}

/// How ports are chosen during full setup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortSelection {
    /// Ask the operator, suggesting the first free port.
    #[default]
    Prompt,
    /// Take the first free port without asking.
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    pub range_start: u16,
    pub range_end: u16,
    pub selection: PortSelection,
    /// SSH port always allowed through the firewall.
    pub ssh: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            range_start: 5000,
            range_end: 5999,
            selection: PortSelection::Prompt,
            ssh: 22,
        }
    }
}

impl PortsConfig {
    /// Reject ranges that could never yield an assignable port.
    ///
    /// # Errors
    ///
    /// Returns `PortError::InvalidRange` when the range is inverted or
    /// starts below `MIN_PORT`.
    pub fn validate(&self) -> Result<(), PortError> {
        if self.range_start < MIN_PORT || self.range_start > self.range_end {
            return Err(PortError::InvalidRange {
                start: self.range_start,
                end: self.range_end,
            });
        }
        Ok(())
    }
}

/// Host integration: where artifacts live and who owns application trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Owner of application trees and the service process. Empty means the
    /// invoking user.
    pub run_user: String,
    pub run_group: String,
    pub systemd_dir: PathBuf,
    pub nginx_available: PathBuf,
    pub nginx_enabled: PathBuf,
    pub nginx_log_dir: PathBuf,
    /// Prefix privileged commands with `sudo -n`.
    pub use_sudo: bool,
    /// Worker processes passed to the process manager.
    pub workers: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            run_user: String::new(),
            run_group: "www-data".to_string(),
            systemd_dir: PathBuf::from("/etc/systemd/system"),
            nginx_available: PathBuf::from("/etc/nginx/sites-available"),
            nginx_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
            nginx_log_dir: PathBuf::from("/var/log/nginx"),
            use_sudo: true,
            workers: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// Distribution packages installed during full setup and update.
    pub system: Vec<String>,
    /// Python packages installed into every isolated runtime, in addition
    /// to the process manager and `requirements.txt`.
    pub python: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            system: ["python3", "python3-venv", "python3-pip", "nginx", "ufw"]
                .map(String::from)
                .to_vec(),
            python: vec!["flask".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Upper bound for service, proxy and firewall commands.
    pub command_secs: u64,
    /// Upper bound for package installation commands.
    pub install_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            command_secs: 60,
            install_secs: 900,
        }
    }
}

impl TimeoutsConfig {
    #[must_use]
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    #[must_use]
    pub fn install(&self) -> Duration {
        Duration::from_secs(self.install_secs)
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::rooted_at(&home)
    }
}

impl FleetConfig {
    /// Defaults with every per-user path placed under `home`.
    #[must_use]
    pub fn rooted_at(home: &Path) -> Self {
        let base = home.join(".appfleet");
        Self {
            registry_dir: base.join("registry"),
            backup_dir: base.join("backups"),
            apps_root: home.join("apps"),
            default_application: "default".to_string(),
            default_flavor: RuntimeFlavor::Gunicorn,
            entry_module: "app".to_string(),
            server_name_suffix: "localhost".to_string(),
            ports: PortsConfig::default(),
            host: HostConfig::default(),
            packages: PackagesConfig::default(),
            timeouts: TimeoutsConfig::default(),
        }
    }

    /// Inputs for materializing a record that has never been persisted.
    #[must_use]
    pub fn application_defaults(&self) -> ApplicationDefaults {
        ApplicationDefaults {
            apps_root: self.apps_root.clone(),
            proxy_available_dir: self.host.nginx_available.clone(),
            flavor: self.default_flavor,
            port: self.ports.range_start,
            entry_module: self.entry_module.clone(),
            server_name_suffix: self.server_name_suffix.clone(),
        }
    }

    /// `user:group` owner applied to application trees.
    #[must_use]
    pub fn owner(&self, fallback_user: &str) -> String {
        let user = if self.host.run_user.is_empty() {
            fallback_user
        } else {
            self.host.run_user.as_str()
        };
        format!("{user}:{}", self.host.run_group)
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
