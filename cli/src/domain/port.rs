//! Port claim rules — pure functions, no I/O.
//!
//! A port is claimed if any registered application other than the one being
//! excluded holds it, or if the host reports it bound. The host query is
//! passed in as a closure so this module stays free of `std::net`.

use appfleet_common::Application;

use crate::domain::error::PortError;

/// Lowest assignable port (everything below needs privileges).
pub const MIN_PORT: u16 = 1024;
/// Highest assignable port.
pub const MAX_PORT: u16 = 65535;

/// Result of checking one candidate port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortVerdict {
    Valid(u16),
    InvalidFormat,
    OutOfRange(i64),
    UsedByOtherApplication { port: u16, owner: String },
    UsedByOs(u16),
}

impl PortVerdict {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Convert into the assignable port or the matching typed error.
    ///
    /// # Errors
    ///
    /// Returns the `PortError` corresponding to any non-valid verdict.
    pub fn into_result(self, candidate: &str) -> Result<u16, PortError> {
        match self {
            Self::Valid(port) => Ok(port),
            Self::InvalidFormat => Err(PortError::InvalidFormat(candidate.to_string())),
            Self::OutOfRange(n) => Err(PortError::OutOfRange(n)),
            Self::UsedByOtherApplication { port, owner } => {
                Err(PortError::UsedByOtherApplication { port, owner })
            }
            Self::UsedByOs(port) => Err(PortError::UsedByOs(port)),
        }
    }
}

/// Parse operator input into a port number within `[MIN_PORT, MAX_PORT]`.
///
/// # Errors
///
/// Returns `PortVerdict::InvalidFormat` for anything but an optionally
/// negative run of decimal digits, and `PortVerdict::OutOfRange` for integers
/// outside the range. Integers too large for `i64` saturate.
pub fn parse_port(candidate: &str) -> Result<u16, PortVerdict> {
    let trimmed = candidate.trim();
    let negative = trimmed.starts_with('-');
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PortVerdict::InvalidFormat);
    }
    let n: i64 = trimmed
        .parse()
        .unwrap_or(if negative { i64::MIN } else { i64::MAX });
    if n < i64::from(MIN_PORT) || n > i64::from(MAX_PORT) {
        return Err(PortVerdict::OutOfRange(n));
    }
    u16::try_from(n).map_err(|_| PortVerdict::OutOfRange(n))
}

/// Name of the registered application holding `port`, ignoring `excluding`.
#[must_use]
pub fn registry_owner<'a>(
    port: u16,
    applications: &'a [Application],
    excluding: Option<&str>,
) -> Option<&'a str> {
    applications
        .iter()
        .filter(|app| Some(app.name.as_str()) != excluding)
        .find(|app| app.port == port)
        .map(|app| app.name.as_str())
}

/// Evaluate a candidate against the registry snapshot and the host.
///
/// `os_bound` is only consulted once the registry check has passed.
pub fn evaluate(
    candidate: &str,
    applications: &[Application],
    excluding: Option<&str>,
    os_bound: impl FnOnce(u16) -> bool,
) -> PortVerdict {
    let port = match parse_port(candidate) {
        Ok(port) => port,
        Err(verdict) => return verdict,
    };
    if let Some(owner) = registry_owner(port, applications, excluding) {
        return PortVerdict::UsedByOtherApplication {
            port,
            owner: owner.to_string(),
        };
    }
    if os_bound(port) {
        return PortVerdict::UsedByOs(port);
    }
    PortVerdict::Valid(port)
}
