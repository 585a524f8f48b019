//! Test doubles shared by the application-layer unit tests.
//!
//! - [`ScriptedRadio`] records every transport call, lets a test push
//!   discovery reports by hand, and holds `connect` calls behind per-address
//!   gates so tests decide exactly when (and how) each attempt resolves.
//! - [`FixedPermissions`] grants capabilities from two flags.
//!
//! Tests wait on observable conditions ([`next`], [`wait_until`]) rather
//! than sleeping for a fixed time.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::time::Duration;

use peerlink_core::{
    Address, BondState, Capability, DeviceFoundEvent, DeviceRecord, ServiceId, TransportError,
};
use tokio::sync::mpsc;

use super::permissions::PermissionGate;
use super::presentation::{Notification, NotificationReceiver};
use super::transport::{EstablishedChannel, RadioTransport, StreamChannel};

/// How long a gated `connect` waits for its release before giving up.
const GATE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long [`wait_until`] polls before failing the test.
const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// A transport call observed by [`ScriptedRadio`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RadioCall {
    RequestEnable,
    StartDiscovery,
    CancelDiscovery,
    Connect(Address, ServiceId),
}

enum ConnectScript {
    Immediate(Result<(), TransportError>),
    Gated(std_mpsc::Receiver<Result<(), TransportError>>),
}

pub(crate) struct ScriptedRadio {
    enabled: AtomicBool,
    start_error: Mutex<Option<TransportError>>,
    calls: Mutex<Vec<RadioCall>>,
    events: Mutex<Option<mpsc::Sender<DeviceFoundEvent>>>,
    scripts: Mutex<HashMap<Address, ConnectScript>>,
    returned: Mutex<Vec<Address>>,
    released: Arc<AtomicUsize>,
}

impl ScriptedRadio {
    pub(crate) fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            start_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(None),
            scripts: Mutex::new(HashMap::new()),
            returned: Mutex::new(Vec::new()),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_start(&self, error: TransportError) {
        *self.start_error.lock().unwrap() = Some(error);
    }

    pub(crate) fn calls(&self) -> Vec<RadioCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: &RadioCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// Queues a discovery report without yielding.  Returns `false` when no
    /// discovery is running.
    pub(crate) fn inject(&self, event: DeviceFoundEvent) -> bool {
        match self.events.lock().unwrap().as_ref() {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Clone of the live discovery sender, to keep pushing after a cancel.
    pub(crate) fn event_sender(&self) -> Option<mpsc::Sender<DeviceFoundEvent>> {
        self.events.lock().unwrap().clone()
    }

    /// `true` once no live receiver is attached to the discovery stream the
    /// radio holds (or it holds none).
    pub(crate) fn stream_closed(&self) -> bool {
        self.events
            .lock()
            .unwrap()
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }

    /// Ends discovery from the radio side, as if the scan window elapsed.
    pub(crate) fn finish_discovery(&self) {
        self.events.lock().unwrap().take();
    }

    /// Makes `connect(address)` resolve immediately with `outcome`.
    pub(crate) fn script_connect(&self, address: &str, outcome: Result<(), TransportError>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(Address::new(address), ConnectScript::Immediate(outcome));
    }

    /// Makes `connect(address)` block until the returned sender is used.
    pub(crate) fn gate_connect(
        &self,
        address: &str,
    ) -> std_mpsc::Sender<Result<(), TransportError>> {
        let (tx, rx) = std_mpsc::channel();
        self.scripts
            .lock()
            .unwrap()
            .insert(Address::new(address), ConnectScript::Gated(rx));
        tx
    }

    /// Addresses whose `connect` call has returned, in completion order.
    pub(crate) fn returned(&self) -> Vec<Address> {
        self.returned.lock().unwrap().clone()
    }

    /// Number of channels handed out by `connect` that have since been dropped.
    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl RadioTransport for ScriptedRadio {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn request_enable(&self) {
        self.calls.lock().unwrap().push(RadioCall::RequestEnable);
    }

    fn start_discovery(
        &self,
        events: mpsc::Sender<DeviceFoundEvent>,
    ) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(RadioCall::StartDiscovery);
        if let Some(err) = self.start_error.lock().unwrap().take() {
            return Err(err);
        }
        *self.events.lock().unwrap() = Some(events);
        Ok(())
    }

    fn cancel_discovery(&self) {
        self.calls.lock().unwrap().push(RadioCall::CancelDiscovery);
        self.events.lock().unwrap().take();
    }

    fn is_discovering(&self) -> bool {
        self.events.lock().unwrap().is_some()
    }

    fn connect(
        &self,
        address: &Address,
        service: ServiceId,
    ) -> Result<EstablishedChannel, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push(RadioCall::Connect(address.clone(), service));

        let script = self.scripts.lock().unwrap().remove(address);
        let outcome = match script {
            Some(ConnectScript::Immediate(outcome)) => outcome,
            Some(ConnectScript::Gated(rx)) => rx
                .recv_timeout(GATE_TIMEOUT)
                .unwrap_or(Err(TransportError::Timeout)),
            None => Err(TransportError::Unreachable),
        };

        self.returned.lock().unwrap().push(address.clone());
        let released = Arc::clone(&self.released);
        outcome.map(|()| {
            Box::new(NullChannel {
                peer: address.clone(),
                released,
            }) as EstablishedChannel
        })
    }
}

/// Stream that reads nothing and swallows writes.  Counts itself on drop.
pub(crate) struct NullChannel {
    peer: Address,
    released: Arc<AtomicUsize>,
}

impl Drop for NullChannel {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl Read for NullChannel {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Ok(0)
    }
}

impl Write for NullChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StreamChannel for NullChannel {
    fn peer(&self) -> &Address {
        &self.peer
    }
}

pub(crate) struct FixedPermissions {
    pub scan: AtomicBool,
    pub connect: AtomicBool,
}

impl FixedPermissions {
    pub(crate) fn granted() -> Self {
        Self {
            scan: AtomicBool::new(true),
            connect: AtomicBool::new(true),
        }
    }
}

impl PermissionGate for FixedPermissions {
    fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::ScanDevices => self.scan.load(Ordering::SeqCst),
            Capability::ConnectDevices => self.connect.load(Ordering::SeqCst),
        }
    }
}

pub(crate) fn found(address: &str, name: Option<&str>, bond: BondState) -> DeviceFoundEvent {
    DeviceFoundEvent::new(address, name, bond)
}

pub(crate) fn device(address: &str) -> DeviceRecord {
    DeviceRecord::new(Address::new(address), Some(format!("peer-{address}")), BondState::NotBonded)
}

/// Waits for the next notification, failing the test after two seconds.
pub(crate) async fn next(rx: &mut NotificationReceiver) -> Notification {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a notification")
        .expect("notification channel closed")
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub(crate) async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting until {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Collects everything currently queued without waiting.
pub(crate) fn drain(rx: &mut NotificationReceiver) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}
