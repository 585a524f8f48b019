//! Link state: scan state, connection state, and why a connection failed.
//!
//! # Connection lifecycle (for beginners)
//!
//! Every operator selection creates a brand-new connection attempt:
//!
//! ```text
//! NoSession  ──select──►  Connecting  ──►  Connected
//!                              │
//!                              └──────►  Failed(reason)
//! ```
//!
//! `Connected` and `Failed` are terminal for that attempt.  There is no
//! automatic retry; the operator selects the device again to try again.
//! Each attempt carries a [`SessionId`] (a generation number) so that a late
//! result from a superseded attempt can be recognised and dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::device::DeviceRecord;

/// Whether discovery is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
}

/// A capability the permission gate must grant before a radio operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Required to start or cancel discovery.
    ScanDevices,
    /// Required to open a stream connection (and to prompt for radio enable).
    ConnectDevices,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ScanDevices => f.write_str("scan-devices"),
            Capability::ConnectDevices => f.write_str("connect-devices"),
        }
    }
}

/// Failure reported by the radio transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer did not answer within the transport's timeout.
    #[error("connection attempt timed out")]
    Timeout,
    /// The peer refused the service connection.
    #[error("connection refused by peer")]
    Refused,
    /// The peer is out of range or switched off.
    #[error("device unreachable")]
    Unreachable,
    /// The link dropped while the connection was being established.
    #[error("link lost")]
    LinkLost,
    /// The local radio is switched off.
    #[error("radio is disabled")]
    RadioDisabled,
    /// Any other I/O level failure.
    #[error("transport I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut => TransportError::Timeout,
            std::io::ErrorKind::ConnectionRefused => TransportError::Refused,
            std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
                TransportError::LinkLost
            }
            _ => TransportError::Io(e.to_string()),
        }
    }
}

/// Why a connection attempt ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The `ConnectDevices` capability was not granted; the transport was never called.
    #[error("permission denied: {0} capability missing")]
    PermissionDenied(Capability),
    /// The transport attempted the connection and failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Generation number identifying one connection attempt.
///
/// Strictly increasing per `ConnectionSession`; a result tagged with anything
/// other than the current id is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// State of the (single) connection session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No attempt has been made, or the last one was cancelled.
    #[default]
    NoSession,
    /// A connect call to this device is in flight.
    Connecting(DeviceRecord),
    /// The stream is established.
    Connected(DeviceRecord),
    /// The attempt ended without a stream.
    Failed {
        device: DeviceRecord,
        reason: FailureReason,
    },
}

impl ConnectionState {
    /// `Connected` and `Failed` are terminal for an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Connected(_) | ConnectionState::Failed { .. })
    }

    /// The device this state refers to, if any.
    pub fn device(&self) -> Option<&DeviceRecord> {
        match self {
            ConnectionState::NoSession => None,
            ConnectionState::Connecting(d) | ConnectionState::Connected(d) => Some(d),
            ConnectionState::Failed { device, .. } => Some(device),
        }
    }
}

/// Well-known identifier of the service endpoint opened on the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(Uuid);

impl ServiceId {
    /// Serial Port Profile: `00001101-0000-1000-8000-00805F9B34FB`.
    pub const SERIAL_PORT: ServiceId =
        ServiceId(Uuid::from_u128(0x0000_1101_0000_1000_8000_0080_5f9b_34fb));

    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ServiceId {
    fn default() -> Self {
        Self::SERIAL_PORT
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for ServiceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::{Address, BondState};

    fn device() -> DeviceRecord {
        DeviceRecord::new(Address::new("00:11:22:33:44:55"), None, BondState::NotBonded)
    }

    #[test]
    fn test_serial_port_service_id_matches_well_known_uuid() {
        // Arrange
        let expected: ServiceId = "00001101-0000-1000-8000-00805F9B34FB".parse().unwrap();

        // Act / Assert
        assert_eq!(ServiceId::SERIAL_PORT, expected);
        assert_eq!(ServiceId::default(), expected);
        assert_eq!(
            ServiceId::SERIAL_PORT.to_string(),
            "00001101-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_service_id_rejects_malformed_uuid() {
        assert!("not-a-uuid".parse::<ServiceId>().is_err());
    }

    #[test]
    fn test_scan_state_default_is_idle() {
        assert_eq!(ScanState::default(), ScanState::Idle);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ConnectionState::NoSession.is_terminal());
        assert!(!ConnectionState::Connecting(device()).is_terminal());
        assert!(ConnectionState::Connected(device()).is_terminal());
        assert!(ConnectionState::Failed {
            device: device(),
            reason: FailureReason::Transport(TransportError::Refused),
        }
        .is_terminal());
    }

    #[test]
    fn test_connection_state_device_accessor() {
        assert!(ConnectionState::NoSession.device().is_none());
        assert_eq!(ConnectionState::Connected(device()).device(), Some(&device()));
    }

    #[test]
    fn test_io_error_kinds_map_to_transport_errors() {
        use std::io::{Error, ErrorKind};

        assert_eq!(TransportError::from(Error::from(ErrorKind::TimedOut)), TransportError::Timeout);
        assert_eq!(
            TransportError::from(Error::from(ErrorKind::ConnectionRefused)),
            TransportError::Refused
        );
        assert_eq!(
            TransportError::from(Error::from(ErrorKind::ConnectionReset)),
            TransportError::LinkLost
        );
        assert!(matches!(
            TransportError::from(Error::new(ErrorKind::Other, "boom")),
            TransportError::Io(msg) if msg.contains("boom")
        ));
    }

    #[test]
    fn test_failure_reason_messages_name_the_cause() {
        let denied = FailureReason::PermissionDenied(Capability::ConnectDevices);
        assert_eq!(
            denied.to_string(),
            "permission denied: connect-devices capability missing"
        );

        let transport = FailureReason::from(TransportError::Unreachable);
        assert_eq!(transport.to_string(), "device unreachable");
    }
}
