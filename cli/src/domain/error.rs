//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

/// Error taxonomy used for reporting and JSON error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input: nothing was mutated, the operation was aborted.
    InputValidation,
    /// The registry is not in a state that allows the operation.
    Precondition,
    /// A host command failed; logged, never aborts a workflow.
    ExternalCommand,
    /// The process refused to start.
    FatalStartup,
}

impl ErrorCategory {
    /// Stable kebab-case name used in JSON error output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "input-validation",
            Self::Precondition => "precondition",
            Self::ExternalCommand => "external-command",
            Self::FatalStartup => "fatal-startup",
        }
    }
}

// ── Application errors ────────────────────────────────────────────────────────

/// Errors related to registry membership and application selection.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Invalid application name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Application '{0}' already exists.")]
    AlreadyExists(String),

    #[error("Application '{0}' is not registered. List applications with: appfleet status")]
    NotFound(String),

    #[error("Application '{0}' is the current selection. Switch first: appfleet switch <other>")]
    DeleteCurrent(String),

    #[error("Selection '{selection}' is out of range (1-{count}) and matches no application name.")]
    InvalidSelection { selection: String, count: usize },

    #[error("Application '{0}' has no persisted record. Create or import it first.")]
    NoRecord(String),

    #[error("Import source '{0}' is not a directory.")]
    ImportSourceMissing(String),
}

impl ApplicationError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName { .. }
            | Self::AlreadyExists(_)
            | Self::InvalidSelection { .. }
            | Self::ImportSourceMissing(_) => ErrorCategory::InputValidation,
            Self::NotFound(_) | Self::DeleteCurrent(_) | Self::NoRecord(_) => {
                ErrorCategory::Precondition
            }
        }
    }

    /// Stable machine-readable code used in JSON error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName { .. } => "INVALID_NAME",
            Self::AlreadyExists(_) => "DUPLICATE_NAME",
            Self::NotFound(_) => "NOT_FOUND",
            Self::DeleteCurrent(_) => "DELETE_CURRENT",
            Self::InvalidSelection { .. } => "INVALID_SELECTION",
            Self::NoRecord(_) => "NO_RECORD",
            Self::ImportSourceMissing(_) => "IMPORT_SOURCE_MISSING",
        }
    }
}

// ── Port errors ───────────────────────────────────────────────────────────────

/// Errors produced when a port cannot be assigned.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("'{0}' is not a valid port number.")]
    InvalidFormat(String),

    #[error("Port {0} is out of range (1024-65535).")]
    OutOfRange(i64),

    #[error("Port {port} is already assigned to application '{owner}'.")]
    UsedByOtherApplication { port: u16, owner: String },

    #[error("Port {0} is already bound by another process on this host.")]
    UsedByOs(u16),

    #[error("No free port between {start} and {end}.")]
    RangeExhausted { start: u16, end: u16 },

    #[error(
        "Configured port range {start}-{end} is invalid; it must be ascending and start at 1024 or above."
    )]
    InvalidRange { start: u16, end: u16 },
}

impl PortError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::InputValidation
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "INVALID_PORT",
            Self::OutOfRange(_) => "PORT_OUT_OF_RANGE",
            Self::UsedByOtherApplication { .. } => "PORT_USED_BY_APPLICATION",
            Self::UsedByOs(_) => "PORT_USED_BY_OS",
            Self::RangeExhausted { .. } => "PORT_RANGE_EXHAUSTED",
            Self::InvalidRange { .. } => "INVALID_PORT_RANGE",
        }
    }
}

// ── Startup errors ────────────────────────────────────────────────────────────

/// Conditions that stop the process before any state is touched.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(
        "Refusing to run as root. Run appfleet as a regular user; privileged steps use sudo."
    )]
    RunningAsRoot,

    #[error("Registry is locked by another appfleet process ({holder}). Lock file: {path}")]
    RegistryLocked { holder: String, path: String },
}

impl StartupError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::FatalStartup
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RunningAsRoot => "RUNNING_AS_ROOT",
            Self::RegistryLocked { .. } => "REGISTRY_LOCKED",
        }
    }
}

/// Classify an `anyhow::Error` by walking its chain for a typed domain error.
///
/// Anything untyped is reported as an external-command failure.
#[must_use]
pub fn classify(err: &anyhow::Error) -> (ErrorCategory, &'static str) {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ApplicationError>() {
            return (e.category(), e.code());
        }
        if let Some(e) = cause.downcast_ref::<PortError>() {
            return (e.category(), e.code());
        }
        if let Some(e) = cause.downcast_ref::<StartupError>() {
            return (e.category(), e.code());
        }
    }
    (ErrorCategory::ExternalCommand, "COMMAND_FAILED")
}
