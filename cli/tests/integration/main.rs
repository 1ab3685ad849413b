//! Integration tests for the appfleet CLI
//!
//! These tests spawn the actual binary and check end-to-end behavior that
//! needs no host privileges.
