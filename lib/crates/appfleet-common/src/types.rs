use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix applied to every supervised-service identifier.
pub const SERVICE_PREFIX: &str = "appfleet-";

/// Position of an application in its setup state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Registered, runtime prepared, nothing applied to the host yet.
    #[default]
    Uninitialized,
    /// Service unit and proxy site written; not yet started.
    Provisioned,
    /// Proxy daemon and service started.
    Active,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Uninitialized => "uninitialized",
            Stage::Provisioned => "provisioned",
            Stage::Active => "active",
        }
    }

    /// Whether host artifacts (unit file, proxy site) exist for this stage.
    #[must_use]
    pub fn is_provisioned(self) -> bool {
        matches!(self, Stage::Provisioned | Stage::Active)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process manager that serves the application behind the proxy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum RuntimeFlavor {
    #[default]
    Gunicorn,
    Uwsgi,
}

impl RuntimeFlavor {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeFlavor::Gunicorn => "gunicorn",
            RuntimeFlavor::Uwsgi => "uwsgi",
        }
    }

    /// Python package providing the process manager.
    #[must_use]
    pub fn package(self) -> &'static str {
        self.as_str()
    }

    /// Executable name inside the isolated runtime's `bin/`.
    #[must_use]
    pub fn binary(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for RuntimeFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs used to materialize a record for a name that has none persisted.
#[derive(Debug, Clone)]
pub struct ApplicationDefaults {
    /// Directory under which every application root lives.
    pub apps_root: PathBuf,
    /// Directory holding proxy site definitions ("available" set).
    pub proxy_available_dir: PathBuf,
    pub flavor: RuntimeFlavor,
    /// Port assigned before any allocation has run.
    pub port: u16,
    /// WSGI module holding the `app` callable.
    pub entry_module: String,
    /// Appended to the application name to form its proxy `server_name`.
    pub server_name_suffix: String,
}

/// Full per-application record, persisted as `apps/<name>.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    /// Application source tree.
    pub root_dir: PathBuf,
    /// Isolated Python runtime (virtualenv).
    pub runtime_dir: PathBuf,
    /// Supervised-service identifier, without the `.service` suffix.
    pub service_id: String,
    /// Proxy site definition path in the "available" set.
    pub proxy_config: PathBuf,
    pub flavor: RuntimeFlavor,
    pub port: u16,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default = "default_entry_module")]
    pub entry_module: String,
    #[serde(default)]
    pub server_name: String,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_entry_module() -> String {
    "app".to_string()
}

impl Application {
    /// Deterministic record for `name`: every path and identifier derives
    /// from the name and the supplied defaults.
    #[must_use]
    pub fn with_defaults(name: &str, defaults: &ApplicationDefaults) -> Self {
        let root_dir = defaults.apps_root.join(name);
        let service_id = service_id_for(name);
        Self {
            name: name.to_string(),
            runtime_dir: root_dir.join("venv"),
            root_dir,
            proxy_config: defaults.proxy_available_dir.join(&service_id),
            service_id,
            flavor: defaults.flavor,
            port: defaults.port,
            stage: Stage::Uninitialized,
            entry_module: defaults.entry_module.clone(),
            server_name: server_name_for(name, &defaults.server_name_suffix),
            updated_at: Utc::now(),
        }
    }

    /// Unit file name as known to the service manager.
    #[must_use]
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.service_id)
    }

    /// Path of an executable inside the isolated runtime.
    #[must_use]
    pub fn runtime_bin(&self, program: &str) -> PathBuf {
        self.runtime_dir.join("bin").join(program)
    }

    /// Path of the entry-point file derived from `entry_module`.
    #[must_use]
    pub fn entry_file(&self) -> PathBuf {
        self.root_dir.join(format!("{}.py", self.entry_module))
    }
}

/// Service identifier derived from an application name.
#[must_use]
pub fn service_id_for(name: &str) -> String {
    format!("{SERVICE_PREFIX}{name}")
}

/// Proxy `server_name` derived from an application name.
#[must_use]
pub fn server_name_for(name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{suffix}")
    }
}

/// Fleet-level index persisted as `fleet.json`: ordered membership plus the
/// current selection. Holds no per-application detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryIndex {
    pub current: String,
    #[serde(default)]
    pub applications: Vec<String>,
}

impl RegistryIndex {
    /// Index holding a single placeholder application, which is current.
    #[must_use]
    pub fn with_placeholder(name: &str) -> Self {
        Self {
            current: name.to_string(),
            applications: vec![name.to_string()],
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.applications.iter().any(|n| n == name)
    }

    /// Append `name`; returns `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.applications.push(name.to_string());
        true
    }

    /// Remove `name`; returns `false` if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.applications.len();
        self.applications.retain(|n| n != name);
        before != self.applications.len()
    }

    /// Restore the index invariants: no duplicate names, and `current`
    /// names a member. An empty index gets `fallback` as its only member.
    pub fn normalize(&mut self, fallback: &str) {
        let mut seen = std::collections::HashSet::new();
        self.applications.retain(|n| seen.insert(n.clone()));
        if self.applications.is_empty() {
            self.applications.push(fallback.to_string());
        }
        if !self.contains(&self.current) {
            self.current.clone_from(&self.applications[0]);
        }
    }

    /// Resolve a selection given either as a member name or as a 1-based
    /// position in the ordered list.
    #[must_use]
    pub fn resolve_selection(&self, selection: &str) -> Option<&str> {
        if let Some(name) = self.applications.iter().find(|n| *n == selection) {
            return Some(name.as_str());
        }
        let position: usize = selection.parse().ok()?;
        position
            .checked_sub(1)
            .and_then(|i| self.applications.get(i))
            .map(String::as_str)
    }
}
