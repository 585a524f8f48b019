//! Notifications for the presentation layer.
//!
//! Every state change inside the core becomes a [`Notification`] pushed onto
//! an unbounded Tokio channel.  Emitting never blocks, so discovery and
//! connection workers can report from any context, including while they hold
//! the registry lock (which is what keeps notification order identical to
//! the order changes were applied).
//!
//! A host either reads the channel itself or hands it to
//! [`spawn_presentation_pump`], which forwards each notification, in order,
//! to a [`PresentationSink`].

use std::sync::Arc;

use async_trait::async_trait;
use peerlink_core::{Capability, ConnectionState, DeviceRecord, ScanState};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

/// Why an operator request was not carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The named capability is not granted; the transport was not called.
    PermissionDenied(Capability),
    /// The radio is off; the operator must enable it first.
    RadioDisabled,
}

/// A state change reported to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The discovered-device list changed; carries the full ordered list.
    RegistryChanged(Vec<DeviceRecord>),
    ScanStateChanged(ScanState),
    ConnectionStateChanged(ConnectionState),
    OperationRejected(Rejection),
}

pub type NotificationSender = mpsc::UnboundedSender<Notification>;
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Sends `notification`, ignoring a closed channel (the host has gone away).
pub(crate) fn emit(tx: &NotificationSender, notification: Notification) {
    if tx.send(notification).is_err() {
        debug!("notification dropped: presentation receiver closed");
    }
}

/// Presentation surface driven by the core.
#[async_trait]
pub trait PresentationSink: Send + Sync {
    async fn on_registry_changed(&self, records: Vec<DeviceRecord>);

    async fn on_scan_state_changed(&self, state: ScanState);

    async fn on_connection_state_changed(&self, state: ConnectionState);

    /// Called when a scan request was refused.  Defaults to doing nothing.
    async fn on_operation_rejected(&self, _rejection: Rejection) {}
}

/// Forwards notifications to `sink` in arrival order until the channel closes.
pub fn spawn_presentation_pump(
    mut rx: NotificationReceiver,
    sink: Arc<dyn PresentationSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            dispatch(sink.as_ref(), notification).await;
        }
        debug!("presentation pump stopped");
    })
}

async fn dispatch(sink: &dyn PresentationSink, notification: Notification) {
    match notification {
        Notification::RegistryChanged(records) => sink.on_registry_changed(records).await,
        Notification::ScanStateChanged(state) => sink.on_scan_state_changed(state).await,
        Notification::ConnectionStateChanged(state) => {
            sink.on_connection_state_changed(state).await
        }
        Notification::OperationRejected(rejection) => sink.on_operation_rejected(rejection).await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
