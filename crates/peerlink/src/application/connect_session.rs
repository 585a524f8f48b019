//! ConnectionSession: one connection attempt at a time, supersedable.
//!
//! # How supersession works (for beginners)
//!
//! A `connect` call on a real radio can block for many seconds.  While it is
//! in flight the operator may pick a different device, or cancel.  We cannot
//! interrupt the blocking call, so instead every attempt gets a fresh
//! [`SessionId`] (a generation number).  When the blocking worker finishes it
//! hands its result back together with the id it was started under; the
//! result is applied only if that id is still the current attempt.
//! Otherwise the result is stale and is discarded, and a stale `Ok` channel
//! is dropped so the transport can release it.
//!
//! ```text
//! select(A) ─► id 1 ─► connect(A) … … … … … ─► Ok(chan)   (id 1 stale: dropped)
//! select(B) ─► id 2 ─► connect(B) … ─► Ok(chan)          (id 2 current: Connected(B))
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use peerlink_core::{
    Capability, ConnectionState, DeviceRecord, FailureReason, ServiceId, SessionId,
    TransportError,
};
use tracing::{debug, info, warn};

use super::permissions::PermissionGate;
use super::presentation::{emit, Notification, NotificationSender};
use super::transport::{EstablishedChannel, RadioTransport};

/// The attempt currently owned by the session.
struct Attempt {
    id: SessionId,
    state: ConnectionState,
    channel: Option<EstablishedChannel>,
}

#[derive(Default)]
struct SessionSlot {
    next_id: u64,
    current: Option<Attempt>,
}

fn lock(slot: &Mutex<SessionSlot>) -> MutexGuard<'_, SessionSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Manages the single outbound connection.
pub struct ConnectionSession {
    transport: Arc<dyn RadioTransport>,
    permissions: Arc<dyn PermissionGate>,
    notifier: NotificationSender,
    service_id: ServiceId,
    slot: Arc<Mutex<SessionSlot>>,
}

impl ConnectionSession {
    pub fn new(
        transport: Arc<dyn RadioTransport>,
        permissions: Arc<dyn PermissionGate>,
        notifier: NotificationSender,
        service_id: ServiceId,
    ) -> Self {
        Self {
            transport,
            permissions,
            notifier,
            service_id,
            slot: Arc::new(Mutex::new(SessionSlot::default())),
        }
    }

    /// Starts a fresh connection attempt to `device`, superseding any previous
    /// attempt (in flight or finished) and dropping its established channel.
    ///
    /// Emits `Connecting(device)` immediately.  The blocking connect runs on
    /// Tokio's blocking pool, so this must be called from within a runtime.
    pub fn select(&self, device: DeviceRecord) -> SessionId {
        let (id, superseded) = {
            let mut slot = lock(&self.slot);
            slot.next_id += 1;
            let id = SessionId(slot.next_id);
            let state = ConnectionState::Connecting(device.clone());
            let previous = slot.current.replace(Attempt {
                id,
                state: state.clone(),
                channel: None,
            });
            emit(&self.notifier, Notification::ConnectionStateChanged(state));
            (id, previous)
        };
        if let Some(previous) = superseded {
            debug!("{} superseded by {id}", previous.id);
        }
        info!("{id}: connecting to {device}");

        if !self.permissions.has_capability(Capability::ConnectDevices) {
            warn!("{id}: {} permission not granted", Capability::ConnectDevices);
            complete(
                &self.slot,
                &self.notifier,
                id,
                &device,
                Err(FailureReason::PermissionDenied(Capability::ConnectDevices)),
            );
            return id;
        }

        let transport = Arc::clone(&self.transport);
        let slot = Arc::clone(&self.slot);
        let notifier = self.notifier.clone();
        let service = self.service_id;
        tokio::spawn(async move {
            let address = device.address().clone();
            let joined =
                tokio::task::spawn_blocking(move || transport.connect(&address, service)).await;
            let outcome = match joined {
                Ok(result) => result.map_err(FailureReason::from),
                Err(e) => Err(FailureReason::Transport(TransportError::Io(format!(
                    "connect worker failed: {e}"
                )))),
            };
            complete(&slot, &notifier, id, &device, outcome);
        });

        id
    }

    /// Abandons the current attempt.  Emits `NoSession` only if an attempt
    /// existed; calling it again is a no-op.
    pub fn cancel(&self) {
        let cancelled = {
            let mut slot = lock(&self.slot);
            let taken = slot.current.take();
            if taken.is_some() {
                emit(
                    &self.notifier,
                    Notification::ConnectionStateChanged(ConnectionState::NoSession),
                );
            }
            taken
        };
        if let Some(attempt) = cancelled {
            info!("{} cancelled", attempt.id);
        }
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.slot)
            .current
            .as_ref()
            .map(|a| a.state.clone())
            .unwrap_or_default()
    }

    /// Id of the current attempt, if any.
    pub fn current_session(&self) -> Option<SessionId> {
        lock(&self.slot).current.as_ref().map(|a| a.id)
    }

    /// Hands the established stream to the caller.  Returns `None` unless the
    /// current attempt is `Connected` and the channel has not been taken yet.
    pub fn take_channel(&self) -> Option<EstablishedChannel> {
        lock(&self.slot)
            .current
            .as_mut()
            .and_then(|a| a.channel.take())
    }
}

/// Applies the outcome of attempt `id` if it is still current.
fn complete(
    slot: &Mutex<SessionSlot>,
    notifier: &NotificationSender,
    id: SessionId,
    device: &DeviceRecord,
    outcome: Result<EstablishedChannel, FailureReason>,
) {
    let stale = {
        let mut guard = lock(slot);
        match guard.current.as_mut() {
            Some(attempt)
                if attempt.id == id
                    && matches!(attempt.state, ConnectionState::Connecting(_)) =>
            {
                attempt.state = match outcome {
                    Ok(channel) => {
                        info!("{id}: connected to {device}");
                        attempt.channel = Some(channel);
                        ConnectionState::Connected(device.clone())
                    }
                    Err(reason) => {
                        warn!("{id}: connection to {device} failed: {reason}");
                        ConnectionState::Failed {
                            device: device.clone(),
                            reason,
                        }
                    }
                };
                emit(
                    notifier,
                    Notification::ConnectionStateChanged(attempt.state.clone()),
                );
                None
            }
            _ => Some(outcome),
        }
    };

    // Dropped outside the lock: closing a stale channel may block briefly.
    if let Some(outcome) = stale {
        debug!("{id}: discarding stale connect result ({})", describe(&outcome));
        drop(outcome);
    }
}

fn describe(outcome: &Result<EstablishedChannel, FailureReason>) -> String {
    match outcome {
        Ok(channel) => format!("channel to {}", channel.peer()),
        Err(reason) => reason.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
