//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! registry files, host daemons, sockets, config loading, and backups.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod backup;
pub mod command_runner;
pub mod config;
pub mod fs;
pub mod host;
pub mod lock;
pub mod network;
pub mod privilege;
pub mod registry;
