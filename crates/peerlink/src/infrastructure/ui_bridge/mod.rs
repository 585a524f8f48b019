//! Host command bridge: exposes orchestrator operations to a front end.
//!
//! Each command takes the shared [`Orchestrator`] and returns a
//! [`CommandResult`], so every response has the same JSON shape:
//! `{ success: bool, data: T | null, error: string | null }`.  The front end
//! can always inspect `result.success` without special-casing failures.
//!
//! # Data Transfer Objects
//!
//! Domain types (`DeviceRecord`, `ConnectionState`) carry invariants and
//! enums that a front end should not have to mirror.  The DTOs here flatten
//! them to plain strings and options.
//!
//! # Presentation sink
//!
//! [`LoggingPresentationSink`] is the presentation layer of the headless
//! host: it renders every notification as a `tracing` line, including the
//! "Connected to X" / "Failed to connect to X" status messages.

use async_trait::async_trait;
use peerlink_core::{Address, BondState, ConnectionState, DeviceRecord, ScanState};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::orchestrator::Orchestrator;
use crate::application::presentation::{PresentationSink, Rejection};

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// One discovered device as shown in a device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDto {
    pub address: String,
    pub name: Option<String>,
    /// Name, or "Unknown Device".
    pub display_name: String,
    pub bond_state: String,
}

impl From<&DeviceRecord> for DeviceDto {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            address: record.address().to_string(),
            name: record.name().map(str::to_string),
            display_name: record.display_name().to_string(),
            bond_state: match record.bond_state() {
                BondState::Bonded => "bonded",
                BondState::NotBonded => "not_bonded",
                BondState::Unknown => "unknown",
            }
            .to_string(),
        }
    }
}

/// Snapshot of the connection session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatusDto {
    /// `"no_session"`, `"connecting"`, `"connected"` or `"failed"`.
    pub state: String,
    pub device: Option<DeviceDto>,
    pub session_id: Option<u64>,
    /// Operator-facing status line, absent when there is no session.
    pub message: Option<String>,
    /// Failure reason when `state == "failed"`.
    pub error: Option<String>,
}

impl ConnectionStatusDto {
    fn new(state: &ConnectionState, session_id: Option<u64>) -> Self {
        let label = match state {
            ConnectionState::NoSession => "no_session",
            ConnectionState::Connecting(_) => "connecting",
            ConnectionState::Connected(_) => "connected",
            ConnectionState::Failed { .. } => "failed",
        };
        let error = match state {
            ConnectionState::Failed { reason, .. } => Some(reason.to_string()),
            _ => None,
        };
        Self {
            state: label.to_string(),
            device: state.device().map(DeviceDto::from),
            session_id,
            message: status_message(state),
            error,
        }
    }
}

/// Unified response wrapper used by host commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Operator-facing line for a connection state.
pub fn status_message(state: &ConnectionState) -> Option<String> {
    match state {
        ConnectionState::NoSession => None,
        ConnectionState::Connecting(d) => Some(format!("Connecting to {}...", d.display_name())),
        ConnectionState::Connected(d) => Some(format!("Connected to {}", d.display_name())),
        ConnectionState::Failed { device, .. } => {
            Some(format!("Failed to connect to {}", device.display_name()))
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Starts a scan.
pub fn request_scan(orchestrator: &Orchestrator) -> CommandResult<()> {
    match orchestrator.on_scan_requested() {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Stops the running scan, if any.
pub fn request_stop(orchestrator: &Orchestrator) -> CommandResult<()> {
    orchestrator.on_stop_requested();
    CommandResult::ok(())
}

/// Connects to a device from the current list, addressed by its transport
/// address (case-insensitive).  Returns the new session id.
pub fn select_device(orchestrator: &Orchestrator, address: &str) -> CommandResult<u64> {
    let wanted = Address::new(address);
    let record = orchestrator
        .registry_snapshot()
        .into_iter()
        .find(|r| r.address() == &wanted);

    match record {
        Some(record) => CommandResult::ok(orchestrator.on_device_selected(record).0),
        None => CommandResult::err(format!("device {wanted} is not in the discovered list")),
    }
}

/// Returns the discovered devices in discovery order.
pub fn list_devices(orchestrator: &Orchestrator) -> CommandResult<Vec<DeviceDto>> {
    let dtos = orchestrator
        .registry_snapshot()
        .iter()
        .map(DeviceDto::from)
        .collect();
    CommandResult::ok(dtos)
}

/// Returns the connection session's current state.
pub fn connection_status(orchestrator: &Orchestrator) -> CommandResult<ConnectionStatusDto> {
    let session_id = orchestrator.current_session().map(|id| id.0);
    CommandResult::ok(ConnectionStatusDto::new(
        &orchestrator.connection_state(),
        session_id,
    ))
}

// ── Presentation sink ─────────────────────────────────────────────────────────

/// Renders notifications as log lines.
#[derive(Debug, Default)]
pub struct LoggingPresentationSink;

#[async_trait]
impl PresentationSink for LoggingPresentationSink {
    async fn on_registry_changed(&self, records: Vec<DeviceRecord>) {
        match records.last() {
            Some(latest) => info!("{} device(s) listed; latest: {latest}", records.len()),
            None => info!("device list cleared"),
        }
    }

    async fn on_scan_state_changed(&self, state: ScanState) {
        match state {
            ScanState::Scanning => info!("scanning for devices"),
            ScanState::Idle => info!("scan stopped"),
        }
    }

    async fn on_connection_state_changed(&self, state: ConnectionState) {
        let Some(message) = status_message(&state) else {
            info!("no connection");
            return;
        };
        match &state {
            ConnectionState::Failed { reason, .. } => warn!("{message}: {reason}"),
            _ => info!("{message}"),
        }
    }

    async fn on_operation_rejected(&self, rejection: Rejection) {
        match rejection {
            Rejection::RadioDisabled => warn!("radio is off; enable it and scan again"),
            Rejection::PermissionDenied(cap) => warn!("permission {cap} is required"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
