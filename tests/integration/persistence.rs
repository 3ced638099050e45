//! Snapshot persistence across process runs

use std::path::Path;

use tempfile::TempDir;
use tether::state::{Address, AddressState, Scope};
use tether::storage::DocumentStore;
use tether::{State, TetherConfig, Value};

// ============================================================================
// Helpers
// ============================================================================

/// Open the environment described by a config file the way the CLI does.
fn open(config: &TetherConfig) -> State {
    let store = DocumentStore::open_snapshot(&config.snapshot_path()).unwrap();
    State::open(store, config).unwrap()
}

fn config_in(dir: &Path) -> TetherConfig {
    let path = dir.join(tether::state::CONFIG_FILE_NAME);
    TetherConfig::write_default_if_missing(&path).unwrap();
    let mut config = TetherConfig::from_file(&path).unwrap();
    config.environment = Some(uuid::Uuid::new_v4().to_string());
    config.data_dir = dir.join("data");
    std::fs::create_dir_all(&config.data_dir).unwrap();
    config
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn services_units_and_actions_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());

    let st = open(&config);
    let unit = st.add_service("mysql").unwrap().add_unit().unwrap();
    let queued = st
        .enqueue_action(&unit.tag().unwrap(), "backup", Value::Null)
        .unwrap();
    st.store().save_snapshot(&config.snapshot_path()).unwrap();
    drop(st);

    let st = open(&config);
    let svc = st.service("mysql").unwrap();
    let units = svc.all_units().unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name(), "mysql/0");

    let reloaded = st.action(queued.id()).unwrap();
    assert_eq!(reloaded.name(), "backup");
    assert_eq!(reloaded.parameters(), &Value::Object(Default::default()));

    // The unit sequence continues where it left off.
    assert_eq!(svc.add_unit().unwrap().name(), "mysql/1");
}

#[test]
fn ip_address_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());

    let st = open(&config);
    let mut addr = st
        .add_ip_address(Address::new("10.0.0.1", Scope::CloudLocal), "subnet-0")
        .unwrap();
    addr.allocate_to("machine-0", "eth0").unwrap();
    addr.set_state(AddressState::Allocated).unwrap();
    st.store().save_snapshot(&config.snapshot_path()).unwrap();

    let st = open(&config);
    let addr = st.ip_address("10.0.0.1").unwrap();
    assert_eq!(addr.state(), AddressState::Allocated);
    assert_eq!(addr.machine_id(), "machine-0");
    assert_eq!(addr.interface_id(), "eth0");
    assert_eq!(addr.scope(), Scope::CloudLocal);
    assert_eq!(st.allocated_ip_addresses("machine-0").unwrap().len(), 1);
}

#[test]
fn revision_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());

    let st = open(&config);
    st.add_service("mysql").unwrap();
    st.add_service("wordpress").unwrap();
    let revision = st.store().current_revision();
    st.store().save_snapshot(&config.snapshot_path()).unwrap();

    let st = open(&config);
    assert_eq!(st.store().current_revision(), revision);
}

#[test]
fn missing_snapshot_opens_empty() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());

    let st = open(&config);
    assert!(st.all_services().unwrap().is_empty());
    assert_eq!(st.store().current_revision(), 0);
}
