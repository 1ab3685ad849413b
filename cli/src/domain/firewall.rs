//! Fleet-wide firewall plan — pure function of the registry snapshot.

use std::collections::HashSet;

use appfleet_common::Application;
use serde::Serialize;

pub const HTTP_PORT: u16 = 80;
pub const HTTPS_PORT: u16 = 443;

/// Prefix of the comment attached to per-application allow rules.
pub const RULE_TAG_PREFIX: &str = "appfleet:";

/// One inbound TCP allow rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    pub port: u16,
    pub tag: String,
}

impl FirewallRule {
    fn new(port: u16, tag: impl Into<String>) -> Self {
        Self {
            port,
            tag: tag.into(),
        }
    }
}

/// Tag identifying the rule that belongs to `application`.
#[must_use]
pub fn rule_tag(application: &str) -> String {
    format!("{RULE_TAG_PREFIX}{application}")
}

/// Full allow-list applied on top of the deny-inbound baseline: SSH, HTTP
/// and HTTPS first, then one rule per registered application in registry
/// order. A port appears at most once; the first claimant keeps the rule.
#[must_use]
pub fn plan(ssh_port: u16, applications: &[Application]) -> Vec<FirewallRule> {
    let baseline = [
        FirewallRule::new(ssh_port, "ssh"),
        FirewallRule::new(HTTP_PORT, "http"),
        FirewallRule::new(HTTPS_PORT, "https"),
    ];
    let per_app = applications
        .iter()
        .map(|app| FirewallRule::new(app.port, rule_tag(&app.name)));

    let mut seen = HashSet::new();
    baseline
        .into_iter()
        .chain(per_app)
        .filter(|rule| seen.insert(rule.port))
        .collect()
}
