//! Lifecycle workflows: create, full setup, switch, change port/flavor,
//! import, delete.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;

use appfleet_cli::application::ports::RegistryStore as _;
use appfleet_cli::application::services::lifecycle::PortRequest;
use appfleet_cli::domain::{ErrorCategory, classify};
use appfleet_common::{RuntimeFlavor, Stage};

use crate::helpers::Fleet;

fn explicit(port: &str) -> PortRequest {
    PortRequest::Explicit(port.to_string())
}

#[tokio::test]
async fn create_registers_allocates_and_becomes_current() {
    let fleet = Fleet::new();
    let outcome = fleet.orchestrator().create("shop", None).await.unwrap();

    assert!(outcome.is_clean(), "{:?}", outcome.warnings);
    assert_eq!(outcome.stage, Stage::Uninitialized);
    let index = fleet.registry.index();
    assert_eq!(index.applications, vec!["default", "shop"]);
    assert_eq!(index.current, "shop");

    let record = fleet.registry.record("shop").expect("record persisted");
    assert_eq!(record.port, 5000);
    assert_eq!(record.flavor, RuntimeFlavor::Gunicorn);
    assert!(fleet.fs.read(Path::new("/home/ops/apps/shop/app.py")).is_some());
    assert!(fleet.fs.read(Path::new("/home/ops/apps/shop/requirements.txt")).is_some());
    assert_eq!(fleet.host.count("create_environment"), 1);
}

#[tokio::test]
async fn create_rejects_duplicates_and_bad_names_without_mutation() {
    let fleet = Fleet::new();
    fleet.orchestrator().create("shop", None).await.unwrap();
    fleet.host.clear_calls();

    let err = fleet.orchestrator().create("shop", None).await.unwrap_err();
    assert_eq!(classify(&err), (ErrorCategory::InputValidation, "DUPLICATE_NAME"));

    let err = fleet.orchestrator().create("my shop", None).await.unwrap_err();
    assert_eq!(classify(&err), (ErrorCategory::InputValidation, "INVALID_NAME"));

    assert!(fleet.host.calls.borrow().is_empty());
    assert_eq!(fleet.registry.index().applications, vec!["default", "shop"]);
}

#[tokio::test]
async fn full_setup_reaches_active_with_artifacts_applied() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();

    let outcome = orch.full_setup("shop", explicit("5000")).await.unwrap();

    assert!(outcome.is_clean(), "{:?}", outcome.warnings);
    assert_eq!(outcome.stage, Stage::Active);
    let record = fleet.registry.record("shop").unwrap();
    assert_eq!(record.stage, Stage::Active);
    assert_eq!(record.port, 5000);

    let units = fleet.host.units.borrow();
    let unit = units.get("appfleet-shop").expect("unit written");
    assert!(unit.contains("--bind 127.0.0.1:5000"));
    let sites = fleet.host.sites.borrow();
    let site = sites.get(&record.proxy_config).expect("site written");
    assert!(site.contains("proxy_pass http://127.0.0.1:5000;"));
    assert!(fleet.host.enabled_sites.borrow().contains("appfleet-shop"));
    assert!(fleet.host.running.borrow().contains("appfleet-shop"));
    assert!(fleet.host.proxy_running.get());
    assert_eq!(fleet.host.allowed_ports(), vec![22, 80, 443, 5000]);
    assert!(fleet.host.firewall_enabled.get());
    assert!(fleet.fs.is_dir_path("/home/ops/apps/shop/static"));
}

#[tokio::test]
async fn full_setup_twice_converges_to_the_same_host_state() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    orch.full_setup("shop", explicit("5000")).await.unwrap();

    let units = fleet.host.units.borrow().clone();
    let sites = fleet.host.sites.borrow().clone();
    let rules = fleet.host.firewall_rules.borrow().clone();
    // The service now owns its port on the host.
    fleet.probe.bind(5000);

    let again = orch.full_setup("shop", explicit("5000")).await.unwrap();
    assert!(again.is_clean(), "{:?}", again.warnings);
    assert_eq!(*fleet.host.units.borrow(), units);
    assert_eq!(*fleet.host.sites.borrow(), sites);
    assert_eq!(*fleet.host.firewall_rules.borrow(), rules);
    assert_eq!(fleet.host.count("restart_unit"), 1);
    assert_eq!(fleet.host.count("reload_proxy"), 1);
}

#[tokio::test]
async fn full_setup_continues_past_failing_host_steps() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    fleet.host.fail_on("install_packages");
    fleet.host.fail_on("test_config");
    fleet.host.fail_on("allow_port");

    let outcome = orch.full_setup("shop", explicit("5000")).await.unwrap();

    assert_eq!(outcome.stage, Stage::Active);
    assert!(outcome.has_warning("runtime.install"));
    assert!(outcome.has_warning("proxy.test"));
    assert!(outcome.has_warning("proxy.test.hint"));
    assert!(outcome.has_warning("firewall.allow"));
    // Steps after the failures still ran.
    assert!(fleet.host.units.borrow().contains_key("appfleet-shop"));
    assert!(fleet.host.running.borrow().contains("appfleet-shop"));
    assert_eq!(fleet.registry.record("shop").unwrap().stage, Stage::Active);
}

#[tokio::test]
async fn full_setup_rejects_a_port_held_by_another_application() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    orch.create("blog", None).await.unwrap();
    fleet.host.clear_calls();

    let err = orch.full_setup("blog", explicit("5000")).await.unwrap_err();
    assert_eq!(
        classify(&err),
        (ErrorCategory::InputValidation, "PORT_USED_BY_APPLICATION")
    );
    assert!(err.to_string().contains("shop"), "{err}");
    assert_eq!(fleet.registry.record("blog").unwrap().port, 5001);
    assert!(fleet.host.calls.borrow().is_empty());
}

#[tokio::test]
async fn full_setup_of_unknown_application_is_a_precondition_error() {
    let fleet = Fleet::new();
    let err = fleet
        .orchestrator()
        .full_setup("ghost", PortRequest::Auto)
        .await
        .unwrap_err();
    assert_eq!(classify(&err), (ErrorCategory::Precondition, "NOT_FOUND"));
}

#[tokio::test]
async fn auto_setup_keeps_a_still_valid_recorded_port() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    orch.full_setup("shop", PortRequest::Auto).await.unwrap();
    assert_eq!(fleet.registry.record("shop").unwrap().port, 5000);
}

#[tokio::test]
async fn auto_setup_moves_off_a_port_taken_by_the_host() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    fleet.probe.bind(5000);
    orch.full_setup("shop", PortRequest::Auto).await.unwrap();
    assert_eq!(fleet.registry.record("shop").unwrap().port, 5001);
}

#[tokio::test]
async fn switch_accepts_names_and_positions() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();

    assert_eq!(orch.switch("1").unwrap(), "default");
    assert_eq!(fleet.registry.index().current, "default");
    assert_eq!(orch.switch("shop").unwrap(), "shop");

    let err = orch.switch("3").unwrap_err();
    assert_eq!(classify(&err), (ErrorCategory::InputValidation, "INVALID_SELECTION"));
    assert_eq!(fleet.registry.index().current, "shop");
}

#[tokio::test]
async fn create_setup_delete_round_trip_leaves_only_the_code() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    orch.full_setup("shop", explicit("5000")).await.unwrap();

    let err = orch.delete("shop").await.unwrap_err();
    assert_eq!(classify(&err), (ErrorCategory::Precondition, "DELETE_CURRENT"));
    assert!(fleet.host.units.borrow().contains_key("appfleet-shop"));

    orch.switch("default").unwrap();
    let outcome = orch.delete("shop").await.unwrap();
    assert!(outcome.is_clean(), "{:?}", outcome.warnings);

    let index = fleet.registry.index();
    assert_eq!(index.applications, vec!["default"]);
    assert!(!fleet.registry.has_application("shop"));
    assert!(fleet.host.units.borrow().is_empty());
    assert!(fleet.host.sites.borrow().is_empty());
    assert!(fleet.host.enabled_sites.borrow().is_empty());
    assert!(!fleet.host.running.borrow().contains("appfleet-shop"));
    assert_eq!(fleet.host.allowed_ports(), vec![22, 80, 443]);
    assert!(!fleet.fs.is_dir_path("/home/ops/apps/shop/venv"));
    assert!(fleet.fs.read(Path::new("/home/ops/apps/shop/app.py")).is_some());
}

#[tokio::test]
async fn delete_propagates_an_index_write_failure() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    orch.switch("default").unwrap();
    fleet.registry.fail_index_save.set(true);

    let err = orch.delete("shop").await.unwrap_err();
    assert!(format!("{err:#}").contains("disk full"));
}

#[tokio::test]
async fn delete_survives_a_host_that_refuses_everything() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    orch.switch("default").unwrap();
    for op in ["stop_unit", "disable_unit", "unlink_site", "remove_site", "remove_unit", "reset_firewall"] {
        fleet.host.fail_on(op);
    }

    let outcome = orch.delete("shop").await.unwrap();
    assert!(outcome.has_warning("service.stop"));
    assert!(outcome.has_warning("firewall.reset"));
    assert_eq!(fleet.registry.index().applications, vec!["default"]);
}

#[tokio::test]
async fn change_port_updates_record_and_firewall_and_flags_stale_artifacts() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    orch.full_setup("shop", explicit("5000")).await.unwrap();

    let outcome = orch.change_port("shop", "8000").await.unwrap();

    assert_eq!(fleet.registry.record("shop").unwrap().port, 8000);
    assert_eq!(fleet.host.allowed_ports(), vec![22, 80, 443, 8000]);
    assert!(outcome.has_warning("artifacts.stale"));
}

#[tokio::test]
async fn change_port_rejects_malformed_and_out_of_range_candidates() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();

    let err = orch.change_port("shop", "80a").await.unwrap_err();
    assert_eq!(classify(&err).1, "INVALID_PORT");
    let err = orch.change_port("shop", "1023").await.unwrap_err();
    assert_eq!(classify(&err).1, "PORT_OUT_OF_RANGE");
    let err = orch.change_port("shop", "65536").await.unwrap_err();
    assert_eq!(classify(&err).1, "PORT_OUT_OF_RANGE");
    assert_eq!(fleet.registry.record("shop").unwrap().port, 5000);
}

#[tokio::test]
async fn change_port_requires_a_persisted_record() {
    let fleet = Fleet::new();
    let err = fleet
        .orchestrator()
        .change_port("default", "5005")
        .await
        .unwrap_err();
    assert_eq!(classify(&err), (ErrorCategory::Precondition, "NO_RECORD"));
}

#[tokio::test]
async fn change_flavor_regenerates_the_unit_of_a_provisioned_application() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    orch.full_setup("shop", explicit("5000")).await.unwrap();

    orch.change_flavor("shop", RuntimeFlavor::Uwsgi).await.unwrap();

    assert_eq!(fleet.registry.record("shop").unwrap().flavor, RuntimeFlavor::Uwsgi);
    let units = fleet.host.units.borrow();
    assert!(units["appfleet-shop"].contains("venv/bin/uwsgi"));
    assert!(fleet.host.calls.borrow().contains(&"install_packages uwsgi".to_string()));
}

#[tokio::test]
async fn change_flavor_of_an_uninitialized_application_only_records_it() {
    let fleet = Fleet::new();
    let orch = fleet.orchestrator();
    orch.create("shop", None).await.unwrap();
    fleet.host.clear_calls();

    orch.change_flavor("shop", RuntimeFlavor::Uwsgi).await.unwrap();
    assert_eq!(fleet.registry.record("shop").unwrap().flavor, RuntimeFlavor::Uwsgi);
    assert!(fleet.host.calls.borrow().is_empty());
}

#[tokio::test]
async fn import_copies_the_tree_and_detects_the_entry_point() {
    let fleet = Fleet::new();
    fleet.fs.add_file("/srv/legacy/wsgi.py", "app = None\n");
    fleet.fs.add_file("/srv/legacy/requirements.txt", "flask\n");

    let outcome = fleet
        .orchestrator()
        .import("legacy", Path::new("/srv/legacy"), Some(RuntimeFlavor::Uwsgi), false)
        .await
        .unwrap();

    assert!(outcome.is_clean(), "{:?}", outcome.warnings);
    let record = fleet.registry.record("legacy").unwrap();
    assert_eq!(record.entry_module, "wsgi");
    assert_eq!(record.flavor, RuntimeFlavor::Uwsgi);
    assert!(fleet.fs.read(Path::new("/home/ops/apps/legacy/wsgi.py")).is_some());
    assert_eq!(fleet.host.count("install_requirements"), 1);
    assert_eq!(fleet.registry.index().current, "legacy");
}

#[tokio::test]
async fn import_with_activate_runs_full_setup() {
    let fleet = Fleet::new();
    fleet.fs.add_file("/srv/legacy/app.py", "app = None\n");

    let outcome = fleet
        .orchestrator()
        .import("legacy", Path::new("/srv/legacy"), None, true)
        .await
        .unwrap();

    assert_eq!(outcome.stage, Stage::Active);
    assert!(fleet.host.running.borrow().contains("appfleet-legacy"));
}

#[tokio::test]
async fn import_without_an_entry_point_stays_uninitialized() {
    let fleet = Fleet::new();
    fleet.fs.add_file("/srv/legacy/README", "hello\n");

    let outcome = fleet
        .orchestrator()
        .import("legacy", Path::new("/srv/legacy"), None, true)
        .await
        .unwrap();

    assert_eq!(outcome.stage, Stage::Uninitialized);
    assert!(outcome.has_warning("entry.missing"));
    assert_eq!(fleet.host.count("start_unit"), 0);
}

#[tokio::test]
async fn import_of_a_missing_directory_is_rejected() {
    let fleet = Fleet::new();
    let err = fleet
        .orchestrator()
        .import("legacy", Path::new("/nowhere"), None, false)
        .await
        .unwrap_err();
    assert_eq!(classify(&err).1, "IMPORT_SOURCE_MISSING");
    assert!(!fleet.registry.index().contains("legacy"));
}
