//! Startup privilege check.

use crate::domain::StartupError;

/// Refuse to run with an effective uid of 0.
///
/// # Errors
///
/// Returns `StartupError::RunningAsRoot` when running as root.
pub fn refuse_root() -> Result<(), StartupError> {
    if nix::unistd::Uid::effective().is_root() {
        return Err(StartupError::RunningAsRoot);
    }
    Ok(())
}

/// Login name of the invoking user, falling back to `$USER`.
#[must_use]
pub fn current_user() -> String {
    nix::unistd::User::from_uid(nix::unistd::Uid::current())
        .ok()
        .flatten()
        .map(|u| u.name)
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "nobody".to_string())
}
