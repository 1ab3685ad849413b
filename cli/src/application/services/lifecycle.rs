//! Lifecycle Orchestrator — the named workflows that move an application
//! through `uninitialized → provisioned → active` and out of the registry.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Structural errors abort before anything is mutated; external-command
//! failures are recorded in the returned [`WorkflowOutcome`] and never stop
//! a workflow from reaching its final registry write.

use std::path::Path;

use anyhow::{Context, Result};
use appfleet_common::{Application, RegistryIndex, RuntimeFlavor, Stage, validate_application_name};
use chrono::Utc;

use crate::application::ports::{
    HostControl, LocalFs, PortProbe, ProgressReporter, RegistryStore,
};
use crate::application::services::{fleet, port_allocator, provisioner};
use crate::domain::artifacts::{self, UnitContext};
use crate::domain::{ApplicationError, FleetConfig, WorkflowOutcome};

/// How full setup picks the application's port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortRequest {
    /// Re-validate the port already on the record.
    Keep,
    /// Keep the recorded port when it still validates, else take the first
    /// free port in the configured range.
    Auto,
    /// Operator-supplied candidate.
    Explicit(String),
}

/// Collaborators shared by every workflow, resolved once per invocation.
pub struct Orchestrator<'a, S, H, P, F, R> {
    pub config: &'a FleetConfig,
    pub registry: &'a S,
    pub host: &'a H,
    pub probe: &'a P,
    pub fs: &'a F,
    pub reporter: &'a R,
    /// Account that owns application trees and runs their services.
    pub user: &'a str,
}

impl<S, H, P, F, R> Orchestrator<'_, S, H, P, F, R>
where
    S: RegistryStore,
    H: HostControl,
    P: PortProbe,
    F: LocalFs,
    R: ProgressReporter,
{
    /// Make `selection` (a name or 1-based position) the current application.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::InvalidSelection` when nothing matches, or
    /// an error if the index cannot be persisted.
    pub fn switch(&self, selection: &str) -> Result<String> {
        let mut index = self.registry.load_index()?;
        let target = index
            .resolve_selection(selection)
            .map(str::to_owned)
            .ok_or_else(|| ApplicationError::InvalidSelection {
                selection: selection.to_string(),
                count: index.applications.len(),
            })?;
        index.current.clone_from(&target);
        self.registry.save_index(&index)?;
        tracing::info!(app = %target, "switched current application");
        Ok(target)
    }

    /// Register a new application, give it a runtime and a scaffolded entry
    /// point. The stage stays `uninitialized` until full setup runs.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid or duplicate name, an exhausted port
    /// range, or a failed registry write.
    pub async fn create(&self, name: &str, flavor: Option<RuntimeFlavor>) -> Result<WorkflowOutcome> {
        let mut index = self.registry.load_index()?;
        self.check_new_name(&index, name)?;
        let port = self.allocate(name)?;

        let mut app = self.registry.load_application(name)?;
        app.port = port;
        if let Some(flavor) = flavor {
            app.flavor = flavor;
        }
        self.register(&mut index, &mut app)?;

        let mut outcome = WorkflowOutcome::new(name, Stage::Uninitialized);
        self.reporter.step(&format!("creating application tree for '{name}'..."));
        outcome.record("layout.root", self.fs.create_dir_all(&app.root_dir));
        self.prepare_runtime(&app, &mut outcome).await;

        let entry = app.entry_file();
        if !self.fs.exists(&entry) {
            outcome.record("scaffold.entry", self.fs.write(&entry, &artifacts::scaffold_entry(name)));
        }
        let requirements = app.root_dir.join(artifacts::REQUIREMENTS_FILE);
        if !self.fs.exists(&requirements) {
            outcome.record(
                "scaffold.requirements",
                self.fs.write(&requirements, artifacts::scaffold_requirements()),
            );
        }

        self.persist(&mut app)?;
        self.reporter
            .success(&format!("application '{name}' created on port {port}"));
        Ok(outcome)
    }

    /// Register an existing directory tree as a new application.
    ///
    /// When `activate` is set and a known entry point was found, full setup
    /// runs straight away with the allocated port.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid or duplicate name, a missing source
    /// directory, a failed copy, an exhausted port range, or a failed
    /// registry write.
    pub async fn import(
        &self,
        name: &str,
        source: &Path,
        flavor: Option<RuntimeFlavor>,
        activate: bool,
    ) -> Result<WorkflowOutcome> {
        let mut index = self.registry.load_index()?;
        self.check_new_name(&index, name)?;
        if !self.fs.is_dir(source) {
            return Err(ApplicationError::ImportSourceMissing(source.display().to_string()).into());
        }
        let port = self.allocate(name)?;

        let mut app = self.registry.load_application(name)?;
        app.port = port;
        if let Some(flavor) = flavor {
            app.flavor = flavor;
        }
        if source != app.root_dir {
            self.reporter.step(&format!("copying {}...", source.display()));
            self.fs.create_dir_all(&app.root_dir)?;
            self.fs
                .copy_dir(source, &app.root_dir)
                .with_context(|| format!("importing {}", source.display()))?;
        }

        let entry = artifacts::ENTRY_POINT_CANDIDATES
            .iter()
            .find(|file| self.fs.exists(&app.root_dir.join(file)));
        if let Some(file) = entry {
            app.entry_module = artifacts::module_for(file).to_string();
        }
        self.register(&mut index, &mut app)?;

        let mut outcome = WorkflowOutcome::new(name, Stage::Uninitialized);
        self.prepare_runtime(&app, &mut outcome).await;
        self.persist(&mut app)?;

        let Some(file) = entry else {
            outcome.warn(
                "entry.missing",
                format!(
                    "no entry point found (looked for {}); left uninitialized",
                    artifacts::ENTRY_POINT_CANDIDATES.join(", ")
                ),
            );
            return Ok(outcome);
        };
        self.reporter
            .success(&format!("imported '{name}' with entry point {file}"));

        if activate {
            let setup = self.full_setup(name, PortRequest::Keep).await?;
            outcome.absorb(setup.warnings);
            outcome.stage = setup.stage;
        }
        Ok(outcome)
    }

    /// Bring an application to `active`: resolve and persist its port, then
    /// install dependencies, rebuild the firewall, lay out the tree, apply
    /// the unit and site, and start the proxy followed by the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not registered, the port request is
    /// rejected, or a registry write fails.
    pub async fn full_setup(&self, name: &str, request: PortRequest) -> Result<WorkflowOutcome> {
        let index = self.registry.load_index()?;
        if !index.contains(name) {
            return Err(ApplicationError::NotFound(name.to_string()).into());
        }
        let mut app = self.registry.load_application(name)?;
        app.port = self.resolve_port(&app, &request)?;
        // Record the port before anything outside the registry changes.
        self.persist(&mut app)?;

        let mut outcome = WorkflowOutcome::new(name, app.stage);
        let host = self.host;

        self.reporter.step("installing system packages...");
        outcome.record(
            "packages.system",
            host.install_system_packages(&self.config.packages.system).await,
        );
        outcome.record("layout.root", self.fs.create_dir_all(&app.root_dir));
        self.prepare_runtime(&app, &mut outcome).await;

        self.reporter.step("rebuilding firewall...");
        let apps = port_allocator::snapshot(self.registry)?;
        let rebuild = fleet::rebuild_firewall(host, &apps, self.config.ports.ssh).await;
        outcome.absorb(rebuild.warnings);

        for dir in artifacts::STANDARD_SUBDIRS {
            outcome.record("layout.subdir", self.fs.create_dir_all(&app.root_dir.join(dir)));
        }
        let owner = self.config.owner(self.user);
        outcome.record("permissions.owner", host.set_owner(&app.root_dir, &owner).await);
        outcome.record(
            "permissions.mode",
            host.set_mode(&app.root_dir, "u=rwX,g=rX,o=").await,
        );

        if !self.fs.exists(&app.entry_file()) {
            outcome.warn(
                "entry.missing",
                format!("{} not found; the service will fail to start", app.entry_file().display()),
            );
        }

        self.reporter.step("applying service unit and proxy site...");
        provisioner::apply_service_unit(host, &app, &self.unit_context(), &mut outcome).await;
        provisioner::apply_proxy_site(host, &app, &self.config.host.nginx_log_dir, &mut outcome)
            .await;
        app.stage = Stage::Provisioned;
        self.persist(&mut app)?;

        self.reporter.step("starting proxy and service...");
        if outcome.record("proxy.status", host.proxy_active().await) == Some(true) {
            outcome.record("proxy.reload", host.reload_proxy().await);
        } else {
            outcome.record("proxy.start", host.start_proxy().await);
        }
        if outcome.record("service.status", host.unit_active(&app.service_id).await) == Some(true) {
            outcome.record("service.restart", host.restart_unit(&app.service_id).await);
        } else {
            outcome.record("service.start", host.start_unit(&app.service_id).await);
        }

        app.stage = Stage::Active;
        self.persist(&mut app)?;
        outcome.stage = Stage::Active;
        self.reporter.success(&format!(
            "'{name}' is active on 127.0.0.1:{} behind {}",
            app.port, app.server_name
        ));
        Ok(outcome)
    }

    /// Re-validate and record a new port, then rebuild the firewall.
    ///
    /// The service unit and proxy site are not regenerated.
    ///
    /// # Errors
    ///
    /// Returns an error if the application has no record, the port is
    /// rejected, or the registry write fails.
    pub async fn change_port(&self, name: &str, candidate: &str) -> Result<WorkflowOutcome> {
        let mut app = self.require_record(name)?;
        let apps = port_allocator::snapshot(self.registry)?;
        let port = port_allocator::validate(candidate, Some(name), &apps, self.probe)
            .into_result(candidate)?;

        let previous = app.port;
        app.port = port;
        self.persist(&mut app)?;

        let mut outcome = WorkflowOutcome::new(name, app.stage);
        let apps = port_allocator::snapshot(self.registry)?;
        let rebuild = fleet::rebuild_firewall(self.host, &apps, self.config.ports.ssh).await;
        outcome.absorb(rebuild.warnings);

        if app.stage.is_provisioned() && previous != port {
            outcome.warn(
                "artifacts.stale",
                format!(
                    "service unit and proxy site still target {previous}; run: appfleet setup {name}"
                ),
            );
        }
        self.reporter
            .success(&format!("'{name}' port changed {previous} → {port}"));
        Ok(outcome)
    }

    /// Switch the process manager. A provisioned application gets the new
    /// package, a regenerated unit, and a service restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the application has no record or the registry
    /// write fails.
    pub async fn change_flavor(&self, name: &str, flavor: RuntimeFlavor) -> Result<WorkflowOutcome> {
        let mut app = self.require_record(name)?;
        app.flavor = flavor;
        self.persist(&mut app)?;

        let mut outcome = WorkflowOutcome::new(name, app.stage);
        if app.stage.is_provisioned() {
            self.reporter.step(&format!("installing {flavor}..."));
            outcome.record(
                "runtime.install",
                self.host
                    .install_packages(&[flavor.package().to_string()], &app.runtime_dir)
                    .await,
            );
            provisioner::apply_service_unit(self.host, &app, &self.unit_context(), &mut outcome)
                .await;
            outcome.record("service.restart", self.host.restart_unit(&app.service_id).await);
        }
        self.reporter.success(&format!("'{name}' now runs under {flavor}"));
        Ok(outcome)
    }

    /// Tear an application down and drop it from the registry.
    ///
    /// Every removal is best-effort except the index update, which always
    /// runs so the index never names a removed application.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not registered, is the current
    /// selection, or the index write fails.
    pub async fn delete(&self, name: &str) -> Result<WorkflowOutcome> {
        let mut index = self.registry.load_index()?;
        if !index.contains(name) {
            return Err(ApplicationError::NotFound(name.to_string()).into());
        }
        if index.current == name {
            return Err(ApplicationError::DeleteCurrent(name.to_string()).into());
        }

        let app = self.registry.load_application(name)?;
        let mut outcome = WorkflowOutcome::new(name, app.stage);
        let host = self.host;

        self.reporter.step(&format!("stopping {}...", app.service_id));
        outcome.record("service.stop", host.stop_unit(&app.service_id).await);
        outcome.record("service.disable", host.disable_unit(&app.service_id).await);
        provisioner::remove_artifacts(host, &app, &mut outcome).await;

        outcome.record("registry.remove", self.registry.remove_application(name));
        if self.fs.exists(&app.runtime_dir) {
            outcome.record("runtime.remove", self.fs.remove_dir_all(&app.runtime_dir));
        }

        index.remove(name);
        self.registry
            .save_index(&index)
            .with_context(|| format!("removing '{name}' from the registry index"))?;
        outcome.stage = Stage::Uninitialized;

        self.reporter.step("reconciling firewall and daemons...");
        let apps = outcome
            .record("registry.snapshot", port_allocator::snapshot(self.registry))
            .unwrap_or_default();
        let rebuild = fleet::rebuild_firewall(host, &apps, self.config.ports.ssh).await;
        outcome.absorb(rebuild.warnings);
        outcome.record("service.reload", host.reload_units().await);
        outcome.record("proxy.reload", host.reload_proxy().await);

        self.reporter.success(&format!("'{name}' deleted"));
        Ok(outcome)
    }

    // ── Shared steps ────────────────────────────────────────────────────────

    pub(crate) fn require_record(&self, name: &str) -> Result<Application> {
        let index = self.registry.load_index()?;
        if !index.contains(name) {
            return Err(ApplicationError::NotFound(name.to_string()).into());
        }
        if !self.registry.has_application(name) {
            return Err(ApplicationError::NoRecord(name.to_string()).into());
        }
        self.registry.load_application(name)
    }

    pub(crate) fn persist(&self, app: &mut Application) -> Result<()> {
        app.updated_at = Utc::now();
        self.registry
            .save_application(app)
            .with_context(|| format!("saving record for '{}'", app.name))
    }

    pub(crate) fn unit_context(&self) -> UnitContext<'_> {
        UnitContext {
            user: self.run_user(),
            group: &self.config.host.run_group,
            workers: self.config.host.workers,
        }
    }

    fn run_user(&self) -> &str {
        if self.config.host.run_user.is_empty() {
            self.user
        } else {
            &self.config.host.run_user
        }
    }

    /// Create the isolated runtime and install the process manager, the
    /// configured Python packages, and `requirements.txt` when present.
    pub(crate) async fn prepare_runtime(&self, app: &Application, outcome: &mut WorkflowOutcome) {
        self.reporter.step("preparing isolated runtime...");
        outcome.record(
            "runtime.create",
            self.host.create_environment(&app.runtime_dir).await,
        );

        let mut packages = vec![app.flavor.package().to_string()];
        packages.extend(self.config.packages.python.iter().cloned());
        outcome.record(
            "runtime.install",
            self.host.install_packages(&packages, &app.runtime_dir).await,
        );

        let requirements = app.root_dir.join(artifacts::REQUIREMENTS_FILE);
        if self.fs.exists(&requirements) {
            outcome.record(
                "runtime.requirements",
                self.host
                    .install_requirements(&requirements, &app.runtime_dir)
                    .await,
            );
        }
    }

    fn check_new_name(&self, index: &RegistryIndex, name: &str) -> Result<()> {
        validate_application_name(name).map_err(|reason| ApplicationError::InvalidName {
            name: name.to_string(),
            reason,
        })?;
        if index.contains(name) || self.registry.has_application(name) {
            return Err(ApplicationError::AlreadyExists(name.to_string()).into());
        }
        Ok(())
    }

    fn allocate(&self, name: &str) -> Result<u16> {
        let apps = port_allocator::snapshot(self.registry)?;
        let ports = &self.config.ports;
        Ok(port_allocator::find_available(
            ports.range_start,
            ports.range_end,
            Some(name),
            &apps,
            self.probe,
        )?)
    }

    /// Persist the record, then add it to the index as the current selection.
    fn register(&self, index: &mut RegistryIndex, app: &mut Application) -> Result<()> {
        self.persist(app)?;
        index.insert(&app.name);
        index.current.clone_from(&app.name);
        self.registry.save_index(index)
    }

    fn resolve_port(&self, app: &Application, request: &PortRequest) -> Result<u16> {
        let apps = port_allocator::snapshot(self.registry)?;
        let name = Some(app.name.as_str());
        let recorded = app.port.to_string();
        let candidate = match request {
            PortRequest::Keep => recorded.as_str(),
            PortRequest::Explicit(candidate) => candidate.as_str(),
            PortRequest::Auto => {
                if port_allocator::validate(&recorded, name, &apps, self.probe).is_valid() {
                    return Ok(app.port);
                }
                let ports = &self.config.ports;
                return Ok(port_allocator::find_available(
                    ports.range_start,
                    ports.range_end,
                    name,
                    &apps,
                    self.probe,
                )?);
            }
        };
        Ok(port_allocator::validate(candidate, name, &apps, self.probe).into_result(candidate)?)
    }
}
