//! Resource Provisioner — applies the service unit and proxy site for one
//! application.
//!
//! Artifact content comes from `crate::domain::artifacts`, so re-applying an
//! unchanged record writes identical files. Every host call is best-effort:
//! failures land in the outcome and the sequence continues.

use std::path::Path;

use appfleet_common::Application;

use crate::application::ports::{ProxyController, ServiceController};
use crate::domain::WorkflowOutcome;
use crate::domain::artifacts::{self, UnitContext};

/// Write the unit, reload the supervisor, enable the unit. Does not start it.
pub async fn apply_service_unit(
    host: &impl ServiceController,
    app: &Application,
    ctx: &UnitContext<'_>,
    outcome: &mut WorkflowOutcome,
) {
    let unit = artifacts::service_unit(app, ctx);
    outcome.record("service.write", host.write_unit(&app.service_id, &unit).await);
    outcome.record("service.reload", host.reload_units().await);
    outcome.record("service.enable", host.enable_unit(&app.service_id).await);
}

/// Write the available site, link it into the enabled set, then run a
/// syntax check whose failure is only reported.
pub async fn apply_proxy_site(
    host: &impl ProxyController,
    app: &Application,
    log_dir: &Path,
    outcome: &mut WorkflowOutcome,
) {
    let site = artifacts::proxy_site(app, log_dir);
    outcome.record("proxy.write", host.write_site(&app.proxy_config, &site).await);
    outcome.record(
        "proxy.link",
        host.link_site(&app.proxy_config, &app.service_id).await,
    );
    if outcome.record("proxy.test", host.test_config().await).is_none() {
        outcome.warn(
            "proxy.test.hint",
            "fix the proxy configuration, then run: appfleet proxy reload",
        );
    }
}

/// Remove the unit and both site files for `app`.
pub async fn remove_artifacts<H>(host: &H, app: &Application, outcome: &mut WorkflowOutcome)
where
    H: ServiceController + ProxyController,
{
    outcome.record("proxy.unlink", host.unlink_site(&app.service_id).await);
    outcome.record("proxy.remove", host.remove_site(&app.proxy_config).await);
    outcome.record("service.remove", host.remove_unit(&app.service_id).await);
}
