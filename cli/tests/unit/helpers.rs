//! Shared fakes: in-memory registry, recording host, scripted port probe,
//! in-memory filesystem.
//!
//! Every fake records what it was asked to do so tests can assert on host
//! state after a workflow instead of on call order.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use appfleet_cli::application::ports::{
    DependencyInstaller, FirewallController, LocalFs, NetworkProbe, PermissionManager, PortProbe,
    ProgressReporter, ProxyController, RegistryStore, ServiceController,
};
use appfleet_cli::application::services::lifecycle::Orchestrator;
use appfleet_cli::domain::{FleetConfig, PortSelection};
use appfleet_common::{Application, ApplicationDefaults, RegistryIndex};

// ── Registry ─────────────────────────────────────────────────────────────────

pub struct MemoryRegistry {
    defaults: ApplicationDefaults,
    placeholder: String,
    index: RefCell<Option<RegistryIndex>>,
    records: RefCell<BTreeMap<String, Application>>,
    pub fail_index_save: Cell<bool>,
}

impl MemoryRegistry {
    pub fn new(config: &FleetConfig) -> Self {
        Self {
            defaults: config.application_defaults(),
            placeholder: config.default_application.clone(),
            index: RefCell::new(None),
            records: RefCell::new(BTreeMap::new()),
            fail_index_save: Cell::new(false),
        }
    }

    pub fn record(&self, name: &str) -> Option<Application> {
        self.records.borrow().get(name).cloned()
    }

    pub fn index(&self) -> RegistryIndex {
        self.load_index().unwrap()
    }
}

impl RegistryStore for MemoryRegistry {
    fn load_index(&self) -> Result<RegistryIndex> {
        let mut index = self
            .index
            .borrow()
            .clone()
            .unwrap_or_else(|| RegistryIndex::with_placeholder(&self.placeholder));
        index.normalize(&self.placeholder);
        Ok(index)
    }

    fn save_index(&self, index: &RegistryIndex) -> Result<()> {
        if self.fail_index_save.get() {
            anyhow::bail!("disk full");
        }
        *self.index.borrow_mut() = Some(index.clone());
        Ok(())
    }

    fn load_application(&self, name: &str) -> Result<Application> {
        Ok(self
            .record(name)
            .unwrap_or_else(|| Application::with_defaults(name, &self.defaults)))
    }

    fn has_application(&self, name: &str) -> bool {
        self.records.borrow().contains_key(name)
    }

    fn save_application(&self, app: &Application) -> Result<()> {
        self.records
            .borrow_mut()
            .insert(app.name.clone(), app.clone());
        Ok(())
    }

    fn remove_application(&self, name: &str) -> Result<bool> {
        Ok(self.records.borrow_mut().remove(name).is_some())
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let root = Path::new("/registry");
        let mut files = vec![root.join("fleet.json")];
        files.extend(
            self.records
                .borrow()
                .keys()
                .map(|name| root.join("apps").join(format!("{name}.json"))),
        );
        Ok(files)
    }

    fn directories(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("/registry"), PathBuf::from("/registry/apps")]
    }
}

// ── Host ─────────────────────────────────────────────────────────────────────

/// Host that applies every request to in-memory state and logs it.
///
/// Operations named with [`RecordingHost::fail_on`] are still logged but
/// return an error and leave state untouched.
#[derive(Default)]
pub struct RecordingHost {
    pub calls: RefCell<Vec<String>>,
    pub units: RefCell<BTreeMap<String, String>>,
    pub sites: RefCell<BTreeMap<PathBuf, String>>,
    pub enabled_sites: RefCell<BTreeSet<String>>,
    pub running: RefCell<BTreeSet<String>>,
    pub firewall_rules: RefCell<Vec<(u16, String)>>,
    pub firewall_enabled: Cell<bool>,
    pub proxy_running: Cell<bool>,
    failing: RefCell<HashSet<String>>,
}

impl RecordingHost {
    pub fn fail_on(&self, op: &str) {
        self.failing.borrow_mut().insert(op.to_string());
    }

    fn call(&self, op: &str, detail: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("{op} {detail}").trim_end().to_string());
        if self.failing.borrow().contains(op) {
            anyhow::bail!("{op} exited with 1: boom");
        }
        Ok(())
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split(' ').next() == Some(op))
            .count()
    }

    pub fn allowed_ports(&self) -> Vec<u16> {
        self.firewall_rules.borrow().iter().map(|(p, _)| *p).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl ServiceController for RecordingHost {
    async fn write_unit(&self, service_id: &str, content: &str) -> Result<()> {
        self.call("write_unit", service_id)?;
        self.units
            .borrow_mut()
            .insert(service_id.to_string(), content.to_string());
        Ok(())
    }
    async fn remove_unit(&self, service_id: &str) -> Result<()> {
        self.call("remove_unit", service_id)?;
        self.units.borrow_mut().remove(service_id);
        Ok(())
    }
    async fn reload_units(&self) -> Result<()> {
        self.call("reload_units", "")
    }
    async fn enable_unit(&self, service_id: &str) -> Result<()> {
        self.call("enable_unit", service_id)
    }
    async fn disable_unit(&self, service_id: &str) -> Result<()> {
        self.call("disable_unit", service_id)
    }
    async fn start_unit(&self, service_id: &str) -> Result<()> {
        self.call("start_unit", service_id)?;
        self.running.borrow_mut().insert(service_id.to_string());
        Ok(())
    }
    async fn stop_unit(&self, service_id: &str) -> Result<()> {
        self.call("stop_unit", service_id)?;
        self.running.borrow_mut().remove(service_id);
        Ok(())
    }
    async fn restart_unit(&self, service_id: &str) -> Result<()> {
        self.call("restart_unit", service_id)?;
        self.running.borrow_mut().insert(service_id.to_string());
        Ok(())
    }
    async fn unit_active(&self, service_id: &str) -> Result<bool> {
        self.call("unit_active", service_id)?;
        Ok(self.running.borrow().contains(service_id))
    }
    async fn unit_status(&self, service_id: &str) -> Result<String> {
        self.call("unit_status", service_id)?;
        let state = if self.running.borrow().contains(service_id) {
            "active (running)"
        } else {
            "inactive (dead)"
        };
        Ok(format!("{service_id}.service - {state}"))
    }
}

impl ProxyController for RecordingHost {
    async fn write_site(&self, available: &Path, content: &str) -> Result<()> {
        self.call("write_site", &available.display().to_string())?;
        self.sites
            .borrow_mut()
            .insert(available.to_path_buf(), content.to_string());
        Ok(())
    }
    async fn link_site(&self, _available: &Path, service_id: &str) -> Result<()> {
        self.call("link_site", service_id)?;
        self.enabled_sites.borrow_mut().insert(service_id.to_string());
        Ok(())
    }
    async fn unlink_site(&self, service_id: &str) -> Result<()> {
        self.call("unlink_site", service_id)?;
        self.enabled_sites.borrow_mut().remove(service_id);
        Ok(())
    }
    async fn remove_site(&self, available: &Path) -> Result<()> {
        self.call("remove_site", &available.display().to_string())?;
        self.sites.borrow_mut().remove(available);
        Ok(())
    }
    async fn test_config(&self) -> Result<()> {
        self.call("test_config", "")
    }
    async fn start_proxy(&self) -> Result<()> {
        self.call("start_proxy", "")?;
        self.proxy_running.set(true);
        Ok(())
    }
    async fn reload_proxy(&self) -> Result<()> {
        self.call("reload_proxy", "")
    }
    async fn restart_proxy(&self) -> Result<()> {
        self.call("restart_proxy", "")?;
        self.proxy_running.set(true);
        Ok(())
    }
    async fn proxy_active(&self) -> Result<bool> {
        self.call("proxy_active", "")?;
        Ok(self.proxy_running.get())
    }
    async fn proxy_status(&self) -> Result<String> {
        self.call("proxy_status", "")?;
        Ok("nginx.service - active (running)".to_string())
    }
    async fn enabled_sites(&self) -> Result<Vec<String>> {
        self.call("enabled_sites", "")?;
        Ok(self.enabled_sites.borrow().iter().cloned().collect())
    }
}

impl FirewallController for RecordingHost {
    async fn reset_firewall(&self) -> Result<()> {
        self.call("reset_firewall", "")?;
        self.firewall_rules.borrow_mut().clear();
        self.firewall_enabled.set(false);
        Ok(())
    }
    async fn allow_port(&self, port: u16, tag: &str) -> Result<()> {
        self.call("allow_port", &port.to_string())?;
        self.firewall_rules.borrow_mut().push((port, tag.to_string()));
        Ok(())
    }
    async fn enable_firewall(&self) -> Result<()> {
        self.call("enable_firewall", "")?;
        self.firewall_enabled.set(true);
        Ok(())
    }
    async fn firewall_status(&self) -> Result<String> {
        self.call("firewall_status", "")?;
        let rules: Vec<String> = self
            .firewall_rules
            .borrow()
            .iter()
            .map(|(port, tag)| format!("{port}/tcp ALLOW IN # {tag}"))
            .collect();
        Ok(rules.join("\n"))
    }
}

impl DependencyInstaller for RecordingHost {
    async fn create_environment(&self, path: &Path) -> Result<()> {
        self.call("create_environment", &path.display().to_string())
    }
    async fn install_packages(&self, packages: &[String], _into: &Path) -> Result<()> {
        self.call("install_packages", &packages.join(","))
    }
    async fn upgrade_packages(&self, packages: &[String], _into: &Path) -> Result<()> {
        self.call("upgrade_packages", &packages.join(","))
    }
    async fn install_requirements(&self, file: &Path, _into: &Path) -> Result<()> {
        self.call("install_requirements", &file.display().to_string())
    }
    async fn install_system_packages(&self, packages: &[String]) -> Result<()> {
        self.call("install_system_packages", &packages.join(","))
    }
    async fn update_system(&self) -> Result<()> {
        self.call("update_system", "")
    }
}

impl PermissionManager for RecordingHost {
    async fn set_owner(&self, path: &Path, owner: &str) -> Result<()> {
        self.call("set_owner", &format!("{owner} {}", path.display()))
    }
    async fn set_mode(&self, path: &Path, mode: &str) -> Result<()> {
        self.call("set_mode", &format!("{mode} {}", path.display()))
    }
}

// ── Probes ───────────────────────────────────────────────────────────────────

/// Port table scripted by the test; also answers connectivity checks for
/// ports marked as listening.
#[derive(Default)]
pub struct ScriptedProbe {
    pub bound: RefCell<HashSet<u16>>,
}

impl ScriptedProbe {
    pub fn bind(&self, port: u16) {
        self.bound.borrow_mut().insert(port);
    }
}

impl PortProbe for ScriptedProbe {
    fn is_bound(&self, port: u16) -> bool {
        self.bound.borrow().contains(&port)
    }
}

impl NetworkProbe for ScriptedProbe {
    async fn check_tcp_connectivity(&self, _host: &str, port: u16) -> Result<bool> {
        Ok(self.bound.borrow().contains(&port))
    }
}

// ── Filesystem ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryFs {
    pub dirs: RefCell<BTreeSet<PathBuf>>,
    pub files: RefCell<BTreeMap<PathBuf, String>>,
    pub modes: RefCell<BTreeMap<PathBuf, u32>>,
}

impl MemoryFs {
    pub fn add_file(&self, path: &str, content: &str) {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).unwrap();
        }
        self.files.borrow_mut().insert(path, content.to_string());
    }

    pub fn read(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn is_dir_path(&self, path: &str) -> bool {
        self.dirs.borrow().contains(Path::new(path))
    }
}

impl LocalFs for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.dirs.borrow().contains(path) || self.files.borrow().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.borrow().contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.dirs.borrow_mut().retain(|d| !d.starts_with(path));
        self.files.borrow_mut().retain(|f, _| !f.starts_with(path));
        Ok(())
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        self.modes.borrow_mut().insert(path.to_path_buf(), mode);
        Ok(())
    }

    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()> {
        let copied: Vec<(PathBuf, String)> = self
            .files
            .borrow()
            .iter()
            .filter_map(|(path, content)| {
                let rel = path.strip_prefix(from).ok()?;
                Some((to.join(rel), content.clone()))
            })
            .collect();
        for (path, content) in copied {
            if let Some(parent) = path.parent() {
                self.create_dir_all(parent)?;
            }
            self.files.borrow_mut().insert(path, content);
        }
        Ok(())
    }
}

// ── Reporter ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct NullReporter {
    pub messages: RefCell<Vec<String>>,
}

impl ProgressReporter for NullReporter {
    fn step(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
    fn success(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

// ── Fixture ──────────────────────────────────────────────────────────────────

/// Everything a workflow touches, wired to fakes.
pub struct Fleet {
    pub config: FleetConfig,
    pub registry: MemoryRegistry,
    pub host: RecordingHost,
    pub probe: ScriptedProbe,
    pub fs: MemoryFs,
    pub reporter: NullReporter,
}

pub type TestOrchestrator<'a> =
    Orchestrator<'a, MemoryRegistry, RecordingHost, ScriptedProbe, MemoryFs, NullReporter>;

impl Fleet {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: FleetConfig) -> Self {
        Self {
            registry: MemoryRegistry::new(&config),
            host: RecordingHost::default(),
            probe: ScriptedProbe::default(),
            fs: MemoryFs::default(),
            reporter: NullReporter::default(),
            config,
        }
    }

    pub fn orchestrator(&self) -> TestOrchestrator<'_> {
        Orchestrator {
            config: &self.config,
            registry: &self.registry,
            host: &self.host,
            probe: &self.probe,
            fs: &self.fs,
            reporter: &self.reporter,
            user: "ops",
        }
    }
}

pub fn test_config() -> FleetConfig {
    let mut config = FleetConfig::rooted_at(Path::new("/home/ops"));
    config.ports.selection = PortSelection::Auto;
    config.packages.system = vec!["nginx".to_string(), "ufw".to_string()];
    config.packages.python = vec!["flask".to_string()];
    config
}
