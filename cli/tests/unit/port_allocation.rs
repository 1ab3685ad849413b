//! Port uniqueness and allocation across the fleet.

#![allow(clippy::unwrap_used)]

use appfleet_cli::application::services::lifecycle::PortRequest;
use appfleet_cli::application::services::port_allocator;
use appfleet_cli::domain::{ErrorCategory, PortVerdict, classify};

use crate::helpers::{Fleet, test_config};

#[tokio::test]
async fn created_applications_never_share_a_port() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    for name in ["a", "b", "c", "d"] {
        orch.create(name, None).await.unwrap();
    }
    let mut ports: Vec<u16> = ["a", "b", "c", "d"]
        .iter()
        .map(|n| fleet.registry.record(n).unwrap().port)
        .collect();
    assert_eq!(ports, vec![5000, 5001, 5002, 5003]);
    ports.dedup();
    assert_eq!(ports.len(), 4);
}

#[tokio::test]
async fn allocation_skips_ports_bound_on_the_host() {
    let fleet = Fleet::new();
    fleet.probe.bind(5000);
    fleet.probe.bind(5002);
    let orch = fleet.orchestrator();
    orch.create("a", None).await.unwrap();
    orch.create("b", None).await.unwrap();
    assert_eq!(fleet.registry.record("a").unwrap().port, 5001);
    assert_eq!(fleet.registry.record("b").unwrap().port, 5003);
}

#[tokio::test]
async fn exhausted_range_rejects_creation_without_registering() {
    let mut config = test_config();
    config.ports.range_end = 5001;
    let fleet = Fleet::with_config(config);
    let orch = fleet.orchestrator();
    orch.create("a", None).await.unwrap();
    orch.create("b", None).await.unwrap();

    let err = orch.create("c", None).await.unwrap_err();
    assert_eq!(
        classify(&err),
        (ErrorCategory::InputValidation, "PORT_RANGE_EXHAUSTED")
    );
    assert!(!fleet.registry.index().contains("c"));
    assert!(fleet.registry.record("c").is_none());
}

#[tokio::test]
async fn auto_setup_reports_exhaustion_when_every_port_is_taken() {
    let mut config = test_config();
    config.ports.range_end = 5000;
    let fleet = Fleet::with_config(config);
    let orch = fleet.orchestrator();
    orch.create("a", None).await.unwrap();
    fleet.probe.bind(5000);

    let err = orch.full_setup("a", PortRequest::Auto).await.unwrap_err();
    assert_eq!(classify(&err).1, "PORT_RANGE_EXHAUSTED");
}

#[tokio::test]
async fn unpersisted_placeholder_claims_no_port() {
    let fleet = Fleet::new();
    // "default" is listed in the index with the range start as its
    // materialized port, but has never been saved.
    let apps = port_allocator::snapshot(&fleet.registry).unwrap();
    assert!(apps.is_empty());
    let verdict = port_allocator::validate("5000", None, &apps, &fleet.probe);
    assert_eq!(verdict, PortVerdict::Valid(5000));
}

#[tokio::test]
async fn own_port_is_exempt_from_the_host_check_once_provisioned() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("a", None).await.unwrap();
    fleet.probe.bind(5000);

    let apps = port_allocator::snapshot(&fleet.registry).unwrap();
    // Uninitialized: whoever is bound there is not us.
    assert_eq!(
        port_allocator::validate("5000", Some("a"), &apps, &fleet.probe),
        PortVerdict::UsedByOs(5000)
    );

    fleet.probe.bound.borrow_mut().clear();
    orch.full_setup("a", PortRequest::Keep).await.unwrap();
    fleet.probe.bind(5000);
    let apps = port_allocator::snapshot(&fleet.registry).unwrap();
    assert_eq!(
        port_allocator::validate("5000", Some("a"), &apps, &fleet.probe),
        PortVerdict::Valid(5000)
    );
    // Another application still sees the port as taken.
    assert!(matches!(
        port_allocator::validate("5000", Some("b"), &apps, &fleet.probe),
        PortVerdict::UsedByOtherApplication { .. }
    ));
}
