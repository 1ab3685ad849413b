//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out; the
//! only side effect is `tracing` output for tolerated step failures.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod firewall;
pub mod outcome;
pub mod port;

pub use config::{FleetConfig, PortSelection};
pub use error::{ApplicationError, ErrorCategory, PortError, StartupError, classify};
pub use firewall::FirewallRule;
pub use outcome::{StepWarning, WorkflowOutcome, tolerate};
pub use port::PortVerdict;
