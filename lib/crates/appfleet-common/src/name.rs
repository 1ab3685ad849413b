//! Application name rules shared by the registry and every workflow.

use std::sync::LazyLock;

use regex::Regex;

/// Pattern every application name must match in full.
pub const NAME_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: compile-time constant pattern.
    #[allow(clippy::expect_used)]
    Regex::new(NAME_PATTERN).expect("valid regex")
});

/// Validate an application name before it is used in any path, unit name,
/// or firewall tag.
/// Returns Ok(()) if valid, Err with description if invalid.
pub fn validate_application_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("application name must not be empty");
    }
    if !NAME_RE.is_match(name) {
        return Err("application name may only contain letters, digits, '_' and '-'");
    }
    Ok(())
}
