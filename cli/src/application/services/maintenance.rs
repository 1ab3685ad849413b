//! Operator use-cases layered on the orchestrator: service and proxy
//! control, system updates, repair, smoke testing, fleet views.

use anyhow::Result;
use serde::Serialize;

use crate::application::ports::{
    HostControl, LocalFs, NetworkProbe, PortProbe, ProgressReporter, RegistryStore,
};
use crate::application::services::fleet::{self, FirewallRebuild, PortUsage};
use crate::application::services::lifecycle::Orchestrator;
use crate::application::services::port_allocator;
use crate::domain::WorkflowOutcome;

/// Registry files are owner read/write only.
pub const REGISTRY_FILE_MODE: u32 = 0o600;
/// Registry directories are owner-only.
pub const REGISTRY_DIR_MODE: u32 = 0o700;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyAction {
    Test,
    Reload,
    Restart,
    Status,
    Sites,
}

/// One smoke-test probe.
#[derive(Debug, Clone, Serialize)]
pub struct SmokeCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl SmokeCheck {
    fn new(name: &'static str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed,
            detail: detail.into(),
        }
    }
}

impl<S, H, P, F, R> Orchestrator<'_, S, H, P, F, R>
where
    S: RegistryStore,
    H: HostControl,
    P: PortProbe,
    F: LocalFs,
    R: ProgressReporter,
{
    /// Start, stop, restart, or query the application's service.
    ///
    /// # Errors
    ///
    /// Returns an error if the application has no record or the supervisor
    /// command fails.
    pub async fn control_service(&self, name: &str, action: ServiceAction) -> Result<String> {
        let app = self.require_record(name)?;
        let id = app.service_id.as_str();
        match action {
            ServiceAction::Start => {
                self.host.start_unit(id).await?;
                Ok(format!("{id} started"))
            }
            ServiceAction::Stop => {
                self.host.stop_unit(id).await?;
                Ok(format!("{id} stopped"))
            }
            ServiceAction::Restart => {
                self.host.restart_unit(id).await?;
                Ok(format!("{id} restarted"))
            }
            ServiceAction::Status => self.host.unit_status(id).await,
        }
    }

    /// Upgrade host packages, then the packages inside the application's
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns an error only if the registry cannot be read.
    pub async fn update(&self, name: &str) -> Result<WorkflowOutcome> {
        let app = self.registry.load_application(name)?;
        let mut outcome = WorkflowOutcome::new(name, app.stage);

        self.reporter.step("updating system packages...");
        outcome.record("system.update", self.host.update_system().await);
        outcome.record(
            "packages.system",
            self.host
                .install_system_packages(&self.config.packages.system)
                .await,
        );

        if self.fs.exists(&app.runtime_dir) {
            self.reporter.step(&format!("upgrading packages in {}...", app.runtime_dir.display()));
            let mut packages = vec![app.flavor.package().to_string()];
            packages.extend(self.config.packages.python.iter().cloned());
            outcome.record(
                "runtime.upgrade",
                self.host.upgrade_packages(&packages, &app.runtime_dir).await,
            );
        } else {
            outcome.warn(
                "runtime.missing",
                format!("{} does not exist; run: appfleet repair", app.runtime_dir.display()),
            );
        }
        Ok(outcome)
    }

    /// Recreate a missing runtime, reinstall dependencies, and reset
    /// ownership and permissions on the application tree and the registry
    /// (directories 0700, files 0600).
    ///
    /// # Errors
    ///
    /// Returns an error if the application has no record.
    pub async fn repair(&self, name: &str) -> Result<WorkflowOutcome> {
        let app = self.require_record(name)?;
        let mut outcome = WorkflowOutcome::new(name, app.stage);

        if !self.fs.exists(&app.runtime_dir) {
            tracing::info!(app = name, "runtime missing, recreating");
        }
        self.prepare_runtime(&app, &mut outcome).await;

        let owner = self.config.owner(self.user);
        outcome.record("permissions.owner", self.host.set_owner(&app.root_dir, &owner).await);
        outcome.record(
            "permissions.mode",
            self.host.set_mode(&app.root_dir, "u=rwX,g=rX,o=").await,
        );

        for dir in self.registry.directories() {
            outcome.record("registry.mode", self.fs.set_permissions(&dir, REGISTRY_DIR_MODE));
        }
        if let Some(files) = outcome.record("registry.files", self.registry.files()) {
            for file in files {
                outcome.record(
                    "registry.mode",
                    self.fs.set_permissions(&file, REGISTRY_FILE_MODE),
                );
            }
        }
        Ok(outcome)
    }

    /// Check that the application is really serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the application has no record.
    pub async fn smoke_test(&self, name: &str, net: &impl NetworkProbe) -> Result<Vec<SmokeCheck>> {
        let app = self.require_record(name)?;
        let entry = app.entry_file();
        let mut checks = vec![SmokeCheck::new(
            "entry point",
            self.fs.exists(&entry),
            entry.display().to_string(),
        )];

        let active = self.host.unit_active(&app.service_id).await;
        checks.push(match active {
            Ok(active) => SmokeCheck::new(
                "service",
                active,
                if active { "active" } else { "inactive" },
            ),
            Err(e) => SmokeCheck::new("service", false, format!("{e:#}")),
        });

        let reachable = net.check_tcp_connectivity("127.0.0.1", app.port).await;
        checks.push(match reachable {
            Ok(ok) => SmokeCheck::new(
                "port",
                ok,
                format!(
                    "127.0.0.1:{} {}",
                    app.port,
                    if ok { "accepts connections" } else { "refused" }
                ),
            ),
            Err(e) => SmokeCheck::new("port", false, format!("{e:#}")),
        });

        checks.push(match self.host.test_config().await {
            Ok(()) => SmokeCheck::new("proxy config", true, "syntax ok"),
            Err(e) => SmokeCheck::new("proxy config", false, format!("{e:#}")),
        });

        for check in checks.iter().filter(|c| !c.passed) {
            tracing::warn!(app = name, check = check.name, detail = %check.detail, "smoke check failed");
        }
        Ok(checks)
    }

    /// Proxy daemon administration.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy command fails.
    pub async fn proxy_admin(&self, action: ProxyAction) -> Result<String> {
        match action {
            ProxyAction::Test => {
                self.host.test_config().await?;
                Ok("proxy configuration syntax is ok".to_string())
            }
            ProxyAction::Reload => {
                self.host.reload_proxy().await?;
                Ok("proxy reloaded".to_string())
            }
            ProxyAction::Restart => {
                self.host.restart_proxy().await?;
                Ok("proxy restarted".to_string())
            }
            ProxyAction::Status => self.host.proxy_status().await,
            ProxyAction::Sites => Ok(self.host.enabled_sites().await?.join("\n")),
        }
    }

    /// Force a full firewall rebuild from the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    pub async fn rebuild_firewall(&self) -> Result<FirewallRebuild> {
        let apps = port_allocator::snapshot(self.registry)?;
        Ok(fleet::rebuild_firewall(self.host, &apps, self.config.ports.ssh).await)
    }

    /// # Errors
    ///
    /// Returns an error if the firewall status query fails.
    pub async fn firewall_status(&self) -> Result<String> {
        self.host.firewall_status().await
    }

    /// Port usage for every indexed application.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    pub fn fleet_status(&self) -> Result<Vec<PortUsage>> {
        fleet::port_snapshot(self.registry, self.probe)
    }
}
