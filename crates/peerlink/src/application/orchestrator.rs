//! Orchestrator: the single owner of discovery and the connection session.
//!
//! Operator intents (scan, stop, select, radio toggled, shutdown) arrive
//! here and are translated into calls on [`DiscoveryController`] and
//! [`ConnectionSession`].  The orchestrator also owns the sending half of the
//! notification channel; the receiving half is returned from
//! [`Orchestrator::new`] for the presentation layer.
//!
//! Discovery and connecting are mutually exclusive: selecting a device always
//! stops discovery before the connection attempt begins.

use std::sync::Arc;

use peerlink_core::{
    Capability, ConnectionState, DeviceRecord, ScanState, ServiceId, SessionId,
};
use tokio::sync::mpsc;
use tracing::info;

use super::connect_session::ConnectionSession;
use super::discovery::{DiscoveryController, DiscoveryError, DEFAULT_EVENT_CHANNEL_CAPACITY};
use super::permissions::PermissionGate;
use super::presentation::{emit, Notification, NotificationReceiver, NotificationSender, Rejection};
use super::transport::{EstablishedChannel, RadioTransport};

/// Tunables for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Service endpoint opened on the selected peer.
    pub service_id: ServiceId,
    /// Capacity of the bounded discovery event channel.
    pub event_channel_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            service_id: ServiceId::SERIAL_PORT,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

pub struct Orchestrator {
    transport: Arc<dyn RadioTransport>,
    permissions: Arc<dyn PermissionGate>,
    notifier: NotificationSender,
    discovery: DiscoveryController,
    session: ConnectionSession,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Builds the orchestrator and returns the notification stream the
    /// presentation layer should consume.
    pub fn new(
        transport: Arc<dyn RadioTransport>,
        permissions: Arc<dyn PermissionGate>,
        config: OrchestratorConfig,
    ) -> (Self, NotificationReceiver) {
        let (notifier, rx) = mpsc::unbounded_channel();
        let discovery = DiscoveryController::new(
            Arc::clone(&transport),
            Arc::clone(&permissions),
            notifier.clone(),
            config.event_channel_capacity,
        );
        let session = ConnectionSession::new(
            Arc::clone(&transport),
            Arc::clone(&permissions),
            notifier.clone(),
            config.service_id,
        );
        let orchestrator = Self {
            transport,
            permissions,
            notifier,
            discovery,
            session,
            config,
        };
        (orchestrator, rx)
    }

    /// Operator asked for a scan.
    ///
    /// A rejection is also reported on the notification channel.  When the
    /// radio is off and connecting is permitted, the platform is asked to
    /// enable the radio; the operator retries once it is on.  A live
    /// connection attempt is left alone.
    ///
    /// # Errors
    ///
    /// Whatever [`DiscoveryController::start`] returns.
    pub fn on_scan_requested(&self) -> Result<(), DiscoveryError> {
        let result = self.discovery.start();
        match &result {
            Err(DiscoveryError::RadioDisabled) => {
                emit(
                    &self.notifier,
                    Notification::OperationRejected(Rejection::RadioDisabled),
                );
                if self.permissions.has_capability(Capability::ConnectDevices) {
                    info!("requesting radio enable");
                    self.transport.request_enable();
                }
            }
            Err(DiscoveryError::PermissionDenied(capability)) => {
                emit(
                    &self.notifier,
                    Notification::OperationRejected(Rejection::PermissionDenied(*capability)),
                );
            }
            Err(DiscoveryError::Transport(_)) | Ok(()) => {}
        }
        result
    }

    pub fn on_stop_requested(&self) {
        self.discovery.stop();
    }

    /// Operator picked a device: stop discovery, then start a fresh attempt.
    pub fn on_device_selected(&self, device: DeviceRecord) -> SessionId {
        self.discovery.stop();
        self.session.select(device)
    }

    /// The platform reported a radio on/off transition.
    pub fn on_radio_state_changed(&self, enabled: bool) {
        if enabled {
            info!("radio enabled");
        } else {
            info!("radio disabled");
            self.discovery.on_radio_disabled();
        }
    }

    /// Application teardown: stop discovery and drop any connection.
    pub fn shutdown(&self) {
        info!("shutting down");
        self.discovery.stop();
        self.session.cancel();
    }

    pub fn registry_snapshot(&self) -> Vec<DeviceRecord> {
        self.discovery.snapshot()
    }

    pub fn scan_state(&self) -> ScanState {
        self.discovery.state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.session.current_session()
    }

    /// Takes ownership of the established stream, if connected.
    pub fn take_established_channel(&self) -> Option<EstablishedChannel> {
        self.session.take_channel()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
