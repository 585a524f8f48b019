//! DiscoveryController: scan lifecycle and the registry's single mutation point.
//!
//! ```text
//!          start()                     stop() / radio lost / scan finished
//! Idle  ──────────►  Scanning  ──────────────────────────────────────────►  Idle
//! ```
//!
//! # Event flow
//!
//! `start()` hands the transport the sending half of a bounded Tokio channel
//! and spawns a pump task that owns the receiving half.  The pump is the only
//! code that inserts into the registry; it applies reports strictly in
//! arrival order, under the same lock that `stop()` takes.
//!
//! # Freezing on stop
//!
//! Each scan gets an *epoch* number.  `stop()` bumps the epoch under the
//! lock, and the pump re-checks the epoch under the lock before every
//! insertion.  So once `stop()` returns, no report can reach the registry,
//! even if it was already queued in the channel or the radio keeps
//! delivering for a moment after `cancel_discovery`.
//!
//! Freezing also wakes the pump through a [`Notify`], so the pump exits and
//! drops its receiver even when the transport never lets go of its sender.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use peerlink_core::{
    Capability, DeviceFoundEvent, DeviceRecord, DeviceRegistry, ScanState, TransportError,
};
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use super::permissions::PermissionGate;
use super::presentation::{emit, Notification, NotificationSender};
use super::transport::RadioTransport;

/// Default capacity of the bounded discovery event channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Why a scan could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// The scan capability is not granted; the transport was not called.
    #[error("permission denied: {0} capability missing")]
    PermissionDenied(Capability),
    /// The radio is switched off.
    #[error("radio is disabled")]
    RadioDisabled,
    /// The transport refused to begin discovery.
    #[error("transport refused to start discovery: {0}")]
    Transport(#[from] TransportError),
}

/// State shared between the controller and its pump task.
#[derive(Debug, Default)]
struct ScanShared {
    state: ScanState,
    epoch: u64,
    registry: DeviceRegistry,
    /// Wakes the running epoch's pump when the scan is frozen.
    halt: Option<Arc<Notify>>,
}

fn lock(shared: &Mutex<ScanShared>) -> MutexGuard<'_, ScanShared> {
    // Every critical section leaves the state consistent, so a poisoned lock
    // still guards valid data.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the scan state and the device registry.
pub struct DiscoveryController {
    transport: Arc<dyn RadioTransport>,
    permissions: Arc<dyn PermissionGate>,
    notifier: NotificationSender,
    event_capacity: usize,
    shared: Arc<Mutex<ScanShared>>,
}

impl DiscoveryController {
    pub fn new(
        transport: Arc<dyn RadioTransport>,
        permissions: Arc<dyn PermissionGate>,
        notifier: NotificationSender,
        event_capacity: usize,
    ) -> Self {
        Self {
            transport,
            permissions,
            notifier,
            event_capacity: event_capacity.max(1),
            shared: Arc::new(Mutex::new(ScanShared::default())),
        }
    }

    /// Starts a new scan.
    ///
    /// Already scanning is a no-op.  On success the registry has been cleared
    /// and `RegistryChanged([])` then `ScanStateChanged(Scanning)` have been
    /// emitted.
    ///
    /// Must be called from within a Tokio runtime (the event pump is spawned
    /// onto it).
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::RadioDisabled`] if the radio is off.
    /// - [`DiscoveryError::PermissionDenied`] if scanning is not permitted.
    /// - [`DiscoveryError::Transport`] if the transport refuses to start.
    ///
    /// In every error case the registry is left untouched, except for the
    /// transport refusal, which happens after the registry was cleared.
    pub fn start(&self) -> Result<(), DiscoveryError> {
        if self.state() == ScanState::Scanning {
            debug!("scan requested while already scanning; ignoring");
            return Ok(());
        }
        if !self.transport.is_enabled() {
            warn!("scan rejected: radio is disabled");
            return Err(DiscoveryError::RadioDisabled);
        }
        if !self.permissions.has_capability(Capability::ScanDevices) {
            warn!("scan rejected: {} permission not granted", Capability::ScanDevices);
            return Err(DiscoveryError::PermissionDenied(Capability::ScanDevices));
        }

        let (tx, rx) = mpsc::channel(self.event_capacity);
        let halt = Arc::new(Notify::new());
        let epoch = {
            let mut shared = lock(&self.shared);
            if shared.state == ScanState::Scanning {
                return Ok(());
            }
            shared.registry.clear();
            emit(&self.notifier, Notification::RegistryChanged(Vec::new()));
            shared.epoch += 1;
            shared.state = ScanState::Scanning;
            shared.halt = Some(Arc::clone(&halt));
            emit(&self.notifier, Notification::ScanStateChanged(ScanState::Scanning));
            shared.epoch
        };

        tokio::spawn(run_event_pump(
            Arc::clone(&self.shared),
            self.notifier.clone(),
            rx,
            halt,
            epoch,
        ));

        if let Err(e) = self.transport.start_discovery(tx) {
            warn!("transport refused to start discovery: {e}");
            self.freeze();
            return Err(DiscoveryError::Transport(e));
        }

        info!("discovery started (epoch {epoch})");
        Ok(())
    }

    /// Stops the current scan.  Safe to call at any time; calling it while
    /// idle emits nothing.
    ///
    /// The registry is frozen before this returns.  The transport is asked to
    /// cancel only if scanning is permitted and the radio reports discovery
    /// as running.
    pub fn stop(&self) {
        if self.freeze() {
            info!("discovery stopped");
        }

        if !self.permissions.has_capability(Capability::ScanDevices) {
            debug!("not cancelling transport discovery: {} not granted", Capability::ScanDevices);
            return;
        }
        if self.transport.is_discovering() {
            self.transport.cancel_discovery();
        }
    }

    /// The radio was switched off: freeze without calling the transport.
    pub fn on_radio_disabled(&self) {
        if self.freeze() {
            info!("discovery stopped: radio disabled");
        }
    }

    pub fn state(&self) -> ScanState {
        lock(&self.shared).state
    }

    /// Ordered copy of the registry.
    pub fn snapshot(&self) -> Vec<DeviceRecord> {
        lock(&self.shared).registry.snapshot()
    }

    /// Moves to `Idle` and invalidates the running epoch.  Returns `true` if
    /// a scan was actually running.
    fn freeze(&self) -> bool {
        let mut shared = lock(&self.shared);
        if shared.state != ScanState::Scanning {
            return false;
        }
        shared.state = ScanState::Idle;
        shared.epoch += 1;
        if let Some(halt) = shared.halt.take() {
            // Stores a permit if the pump is not parked yet.
            halt.notify_one();
        }
        emit(&self.notifier, Notification::ScanStateChanged(ScanState::Idle));
        true
    }
}

/// What the pump should do after handling one report.
enum PumpStep {
    Continue,
    Stale,
}

/// Applies discovery reports for one scan epoch until the transport closes
/// the channel or the epoch is superseded.
async fn run_event_pump(
    shared: Arc<Mutex<ScanShared>>,
    notifier: NotificationSender,
    mut rx: mpsc::Receiver<DeviceFoundEvent>,
    halt: Arc<Notify>,
    epoch: u64,
) {
    loop {
        let received = tokio::select! {
            _ = halt.notified() => {
                debug!("scan epoch {epoch} frozen; releasing discovery stream");
                return;
            }
            received = rx.recv() => received,
        };
        let Some(event) = received else { break };
        if let PumpStep::Stale = apply_event(&shared, &notifier, event, epoch) {
            debug!("scan epoch {epoch} ended; dropping remaining discovery reports");
            return;
        }
    }

    let mut guard = lock(&shared);
    if guard.epoch == epoch && guard.state == ScanState::Scanning {
        guard.state = ScanState::Idle;
        guard.epoch += 1;
        guard.halt = None;
        emit(&notifier, Notification::ScanStateChanged(ScanState::Idle));
        info!("discovery finished ({} device(s) listed)", guard.registry.len());
    }
}

fn apply_event(
    shared: &Mutex<ScanShared>,
    notifier: &NotificationSender,
    event: DeviceFoundEvent,
    epoch: u64,
) -> PumpStep {
    let mut guard = lock(shared);
    if guard.epoch != epoch || guard.state != ScanState::Scanning {
        debug!("dropping stale discovery report for {}", event.address);
        return PumpStep::Stale;
    }

    let record = DeviceRecord::from(event);
    let label = record.to_string();
    if guard.registry.try_add(record) {
        debug!("device listed: {label}");
        emit(notifier, Notification::RegistryChanged(guard.registry.snapshot()));
    }
    PumpStep::Continue
}

// ── Tests ─────────────────────────────────────────────────────────────────────
