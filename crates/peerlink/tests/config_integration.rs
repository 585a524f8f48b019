//! Integration tests for config-driven wiring.
//!
//! A config file on disk is the only input the host binary needs; these
//! tests check that a file written by hand loads into a working simulated
//! radio, permission gate and orchestrator.

use std::sync::Arc;
use std::time::Duration;

use peerlink::application::orchestrator::Orchestrator;
use peerlink::application::permissions::PermissionGate;
use peerlink::application::transport::RadioTransport;
use peerlink::infrastructure::{
    permissions::StaticPermissionGate,
    radio::simulated::SimulatedRadio,
    storage::config::{load_config_from, save_config_to, AppConfig},
};
use peerlink_core::{Capability, ScanState, ServiceId};
use uuid::Uuid;

const SAMPLE: &str = r#"
[host]
scan_window_secs = 1

[radio]
event_channel_capacity = 8

[permissions]
connect_devices = false

[simulation]
advertise_interval_ms = 1

[[simulation.peers]]
address = "aa:bb:cc:00:00:01"
name = "Sensor"

[[simulation.peers]]
address = "aa:bb:cc:00:00:02"
bonded = true
"#;

#[tokio::test]
async fn test_sample_config_drives_a_scan() {
    // Arrange
    let dir = std::env::temp_dir().join(format!("peerlink_it_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    // Act
    let cfg = load_config_from(&path).expect("sample config loads");
    let radio: Arc<dyn RadioTransport> = Arc::new(SimulatedRadio::from_config(&cfg.simulation));
    let gate = Arc::new(StaticPermissionGate::from_config(&cfg.permissions));
    assert!(!gate.has_capability(Capability::ConnectDevices));
    let (orchestrator, _rx) = Orchestrator::new(
        radio,
        gate,
        cfg.orchestrator_config().expect("valid radio section"),
    );
    orchestrator.on_scan_requested().expect("scan starts");
    for _ in 0..100 {
        if orchestrator.scan_state() == ScanState::Idle {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Assert
    assert_eq!(orchestrator.config().service_id, ServiceId::SERIAL_PORT);
    assert_eq!(orchestrator.config().event_channel_capacity, 8);
    let listed = orchestrator.registry_snapshot();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].address().as_str(), "AA:BB:CC:00:00:01");
    assert_eq!(listed[0].display_name(), "Sensor");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_saved_default_config_reloads_identically() {
    // Arrange
    let dir = std::env::temp_dir().join(format!("peerlink_it_{}", Uuid::new_v4()));
    let path = dir.join("config.toml");

    // Act
    save_config_to(&path, &AppConfig::default()).unwrap();
    let reloaded = load_config_from(&path).unwrap();

    // Assert
    assert_eq!(reloaded, AppConfig::default());
    std::fs::remove_dir_all(&dir).ok();
}
