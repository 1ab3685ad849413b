//! Fleet Coordinator — fleet-wide state derived from the whole registry.

use anyhow::Result;
use appfleet_common::{Application, RuntimeFlavor, Stage};
use serde::Serialize;

use crate::application::ports::{FirewallController, PortProbe, RegistryStore};
use crate::domain::firewall::{self, FirewallRule};
use crate::domain::{StepWarning, tolerate};

/// Result of a firewall rebuild.
#[derive(Debug, Default, Serialize)]
pub struct FirewallRebuild {
    /// Rules that were requested, in application order.
    pub rules: Vec<FirewallRule>,
    pub warnings: Vec<StepWarning>,
}

/// Reset the firewall to deny-inbound and re-add the full allow-list
/// computed from `apps`. Never incremental.
pub async fn rebuild_firewall(
    host: &impl FirewallController,
    apps: &[Application],
    ssh_port: u16,
) -> FirewallRebuild {
    let rules = firewall::plan(ssh_port, apps);
    let mut warnings = Vec::new();

    tolerate(&mut warnings, "fleet", "firewall.reset", host.reset_firewall().await);
    for rule in &rules {
        tolerate(
            &mut warnings,
            "fleet",
            "firewall.allow",
            host.allow_port(rule.port, &rule.tag).await,
        );
    }
    tolerate(&mut warnings, "fleet", "firewall.enable", host.enable_firewall().await);

    tracing::info!(rules = rules.len(), failed = warnings.len(), "firewall rebuilt");
    FirewallRebuild { rules, warnings }
}

/// One row of the fleet overview.
#[derive(Debug, Clone, Serialize)]
pub struct PortUsage {
    pub name: String,
    pub port: u16,
    pub flavor: RuntimeFlavor,
    pub stage: Stage,
    pub current: bool,
    /// Whether a record has been persisted for this name.
    pub recorded: bool,
    /// Whether some process is bound to the port right now.
    pub bound: bool,
}

/// Per-application port usage across every indexed name.
///
/// # Errors
///
/// Returns an error if the index or a record cannot be read.
pub fn port_snapshot(
    registry: &impl RegistryStore,
    probe: &impl PortProbe,
) -> Result<Vec<PortUsage>> {
    let index = registry.load_index()?;
    index
        .applications
        .iter()
        .map(|name| {
            let app = registry.load_application(name)?;
            Ok(PortUsage {
                current: *name == index.current,
                recorded: registry.has_application(name),
                bound: probe.is_bound(app.port),
                name: app.name,
                port: app.port,
                flavor: app.flavor,
                stage: app.stage,
            })
        })
        .collect()
}
