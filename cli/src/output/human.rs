//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::services::fleet::{FirewallRebuild, PortUsage};
use crate::application::services::maintenance::SmokeCheck;
use crate::domain::{FleetConfig, WorkflowOutcome};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the fleet overview table.
    pub fn render_fleet(&self, rows: &[PortUsage]) {
        if self.ctx.quiet {
            return;
        }
        println!(
            "  {}",
            format!(
                "{:<2} {:<20} {:>5}  {:<9} {:<14} {}",
                "", "APPLICATION", "PORT", "FLAVOR", "STAGE", "LISTENING"
            )
            .style(self.ctx.styles.dim)
        );
        for row in rows {
            let marker = if row.current { "*" } else { "" };
            let stage = if row.recorded {
                row.stage.as_str()
            } else {
                "(no record)"
            };
            let listening = if row.bound { "yes" } else { "no" };
            println!(
                "  {marker:<2} {:<20} {:>5}  {:<9} {stage:<14} {listening}",
                row.name, row.port, row.flavor.as_str()
            );
        }
        println!();
        self.ctx.info("* marks the current application");
    }

    /// Render a workflow's tolerated failures and final stage.
    pub fn render_outcome(&self, outcome: &WorkflowOutcome) {
        for warning in &outcome.warnings {
            self.ctx
                .warn(&format!("{}: {}", warning.step, warning.message));
        }
        if outcome.is_clean() {
            self.ctx.kv("Stage:", outcome.stage.as_str());
        } else {
            self.ctx.kv(
                "Stage:",
                &format!(
                    "{} ({} step(s) need attention, safe to re-run)",
                    outcome.stage,
                    outcome.warnings.len()
                ),
            );
        }
    }

    /// Render the result of a firewall rebuild.
    pub fn render_firewall(&self, rebuild: &FirewallRebuild) {
        for rule in &rebuild.rules {
            self.ctx.kv(&format!("{:>5}/tcp", rule.port), &rule.tag);
        }
        for warning in &rebuild.warnings {
            self.ctx
                .warn(&format!("{}: {}", warning.step, warning.message));
        }
    }

    /// Render smoke-test results.
    pub fn render_smoke(&self, checks: &[SmokeCheck]) {
        for check in checks {
            let line = format!("{}: {}", check.name, check.detail);
            if check.passed {
                self.ctx.success(&line);
            } else {
                self.ctx.error(&line);
            }
        }
    }

    /// Render the effective configuration.
    pub fn render_config(&self, config: &FleetConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        let rows = [
            ("registry_dir:", config.registry_dir.display().to_string()),
            ("backup_dir:", config.backup_dir.display().to_string()),
            ("apps_root:", config.apps_root.display().to_string()),
            ("default_flavor:", config.default_flavor.to_string()),
            (
                "ports:",
                format!(
                    "{}-{} ({:?}, ssh {})",
                    config.ports.range_start,
                    config.ports.range_end,
                    config.ports.selection,
                    config.ports.ssh
                ),
            ),
            ("host.use_sudo:", config.host.use_sudo.to_string()),
            ("host.run_group:", config.host.run_group.clone()),
            (
                "timeouts:",
                format!(
                    "{}s commands, {}s installs",
                    config.timeouts.command_secs, config.timeouts.install_secs
                ),
            ),
        ];
        for (key, value) in rows {
            println!("  {key:<20} {value}");
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["APPFLEET_CONFIG", "APPFLEET_LOG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}
