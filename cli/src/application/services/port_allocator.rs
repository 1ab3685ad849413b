//! Port Allocator — validation and search against the registry snapshot and
//! the live OS port table. Nothing here mutates state.

use anyhow::Result;
use appfleet_common::Application;

use crate::application::ports::{PortProbe, RegistryStore};
use crate::domain::PortError;
use crate::domain::port::{self, PortVerdict};

/// Every persisted record named by the index, in index order.
///
/// Index entries without a persisted record (the first-run placeholder)
/// claim no port.
///
/// # Errors
///
/// Returns an error if the index or a record cannot be read.
pub fn snapshot(registry: &impl RegistryStore) -> Result<Vec<Application>> {
    let index = registry.load_index()?;
    let mut apps = Vec::with_capacity(index.applications.len());
    for name in &index.applications {
        if registry.has_application(name) {
            apps.push(registry.load_application(name)?);
        }
    }
    Ok(apps)
}

/// Check `candidate` for assignment to `excluding` (or to a new application
/// when `None`).
///
/// When the excluded application already holds the candidate and has been
/// provisioned, its own service is expected to be bound there, so the OS
/// check is skipped for that port.
#[must_use]
pub fn validate(
    candidate: &str,
    excluding: Option<&str>,
    apps: &[Application],
    probe: &impl PortProbe,
) -> PortVerdict {
    let own_port = excluding
        .and_then(|name| apps.iter().find(|app| app.name == name))
        .filter(|app| app.stage.is_provisioned())
        .map(|app| app.port);
    port::evaluate(candidate, apps, excluding, |p| {
        own_port != Some(p) && probe.is_bound(p)
    })
}

/// First port in `[start, end]` that validates, scanning ascending.
///
/// # Errors
///
/// Returns `PortError::RangeExhausted` when no port in the range is free.
pub fn find_available(
    start: u16,
    end: u16,
    excluding: Option<&str>,
    apps: &[Application],
    probe: &impl PortProbe,
) -> Result<u16, PortError> {
    (start..=end)
        .find(|p| validate(&p.to_string(), excluding, apps, probe).is_valid())
        .ok_or(PortError::RangeExhausted { start, end })
}
