//! Unit tests for the appfleet CLI
//!
//! Workflows run against in-memory fakes and never touch the host.

mod architecture;
mod helpers;
mod lifecycle;
mod port_allocation;
