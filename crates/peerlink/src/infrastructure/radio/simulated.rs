//! In-memory radio for headless runs and tests.
//!
//! # What it simulates
//!
//! - **Discovery**: `start_discovery` spawns an advertiser thread that reports
//!   each configured peer once, pausing `advertise_interval` before every
//!   report.  When the list is exhausted the thread drops its sender, which
//!   the core sees as "discovery finished".  `cancel_discovery` wakes the
//!   advertiser out of its pause, so every sender is gone and the stream
//!   closes right away.
//! - **Connecting**: `connect` sleeps for the peer's configured delay, then
//!   returns a loopback [`SimulatedChannel`] (bytes written are read back) or
//!   [`TransportError::Unreachable`].
//! - **Radio power**: the enabled flag can be toggled; `request_enable`
//!   switches it on, as if the operator accepted the system prompt.
//!
//! Tests can push extra reports through [`SimulatedRadio::inject`] while a
//! discovery is running, and watch channel lifetimes through
//! [`SimulatedRadio::channels_opened`] and [`SimulatedRadio::open_channels`].

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use peerlink_core::{Address, BondState, DeviceFoundEvent, ServiceId, TransportError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::transport::{EstablishedChannel, RadioTransport, StreamChannel};
use crate::infrastructure::storage::config::{SimulatedPeerConfig, SimulationConfig};

/// A peer the simulated radio knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedPeer {
    pub address: Address,
    pub name: Option<String>,
    pub bond_state: BondState,
    /// Whether `connect` succeeds.
    pub reachable: bool,
    /// How long `connect` blocks before resolving.
    pub connect_delay: Duration,
}

impl SimulatedPeer {
    /// A reachable, unbonded peer that connects instantly.
    pub fn new(address: impl Into<Address>, name: Option<&str>) -> Self {
        Self {
            address: address.into(),
            name: name.map(str::to_string),
            bond_state: BondState::NotBonded,
            reachable: true,
            connect_delay: Duration::ZERO,
        }
    }

    pub fn bonded(mut self) -> Self {
        self.bond_state = BondState::Bonded;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    fn found_event(&self) -> DeviceFoundEvent {
        DeviceFoundEvent::new(self.address.clone(), self.name.as_deref(), self.bond_state)
    }
}

impl From<&SimulatedPeerConfig> for SimulatedPeer {
    fn from(cfg: &SimulatedPeerConfig) -> Self {
        Self {
            address: Address::new(&cfg.address),
            name: cfg.name.clone(),
            bond_state: if cfg.bonded {
                BondState::Bonded
            } else {
                BondState::NotBonded
            },
            reachable: cfg.reachable,
            connect_delay: Duration::from_millis(cfg.connect_delay_ms),
        }
    }
}

/// The discovery currently running, if any.
struct ActiveDiscovery {
    generation: u64,
    events: mpsc::Sender<DeviceFoundEvent>,
    /// Dropping this wakes and stops the advertiser thread.
    _stop: std_mpsc::Sender<()>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SimulatedRadio {
    enabled: AtomicBool,
    peers: Vec<SimulatedPeer>,
    advertise_interval: Duration,
    generation: AtomicU64,
    discovery: Arc<Mutex<Option<ActiveDiscovery>>>,
    opened: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl SimulatedRadio {
    pub fn new(peers: Vec<SimulatedPeer>, advertise_interval: Duration) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            peers,
            advertise_interval,
            generation: AtomicU64::new(0),
            discovery: Arc::new(Mutex::new(None)),
            opened: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Builds the radio described by the `[simulation]` config section.
    pub fn from_config(cfg: &SimulationConfig) -> Self {
        let radio = Self::new(
            cfg.peers.iter().map(SimulatedPeer::from).collect(),
            Duration::from_millis(cfg.advertise_interval_ms),
        );
        radio.set_enabled(cfg.radio_enabled);
        radio
    }

    /// Switches the radio on or off.  Switching off ends a running discovery.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::SeqCst);
        if was && !enabled {
            info!("simulated radio switched off");
            self.end_discovery();
        }
    }

    pub fn peers(&self) -> &[SimulatedPeer] {
        &self.peers
    }

    /// Pushes an extra discovery report.  Returns `false` when no discovery is
    /// running or the core's queue is full.
    pub fn inject(&self, event: DeviceFoundEvent) -> bool {
        match lock(&self.discovery).as_ref() {
            Some(active) => active.events.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Channels handed out by successful `connect` calls so far.
    pub fn channels_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Channels handed out and not yet dropped.
    pub fn open_channels(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn end_discovery(&self) {
        if let Some(active) = lock(&self.discovery).take() {
            debug!("simulated discovery #{} ended", active.generation);
        }
    }

    fn peer(&self, address: &Address) -> Option<&SimulatedPeer> {
        self.peers.iter().find(|p| &p.address == address)
    }
}

impl RadioTransport for SimulatedRadio {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn request_enable(&self) {
        info!("simulated radio: enable request accepted");
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn start_discovery(
        &self,
        events: mpsc::Sender<DeviceFoundEvent>,
    ) -> Result<(), TransportError> {
        if !self.is_enabled() {
            return Err(TransportError::RadioDisabled);
        }
        self.end_discovery();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (stop_tx, stop_rx) = std_mpsc::channel();
        *lock(&self.discovery) = Some(ActiveDiscovery {
            generation,
            events: events.clone(),
            _stop: stop_tx,
        });

        let peers = self.peers.clone();
        let interval = self.advertise_interval;
        let slot = Arc::clone(&self.discovery);
        let spawned = thread::Builder::new()
            .name(format!("sim-advertiser-{generation}"))
            .spawn(move || advertise(peers, interval, events, stop_rx, slot, generation));

        if let Err(e) = spawned {
            self.end_discovery();
            return Err(TransportError::from(e));
        }
        info!("simulated discovery #{generation} started");
        Ok(())
    }

    fn cancel_discovery(&self) {
        self.end_discovery();
    }

    fn is_discovering(&self) -> bool {
        lock(&self.discovery).is_some()
    }

    fn connect(
        &self,
        address: &Address,
        service: ServiceId,
    ) -> Result<EstablishedChannel, TransportError> {
        if !self.is_enabled() {
            return Err(TransportError::RadioDisabled);
        }
        let Some(peer) = self.peer(address) else {
            warn!("simulated connect: {address} is not in range");
            return Err(TransportError::Unreachable);
        };

        thread::sleep(peer.connect_delay);
        if !peer.reachable {
            return Err(TransportError::Unreachable);
        }
        info!("simulated connect: opened {service} on {address}");
        let channel = SimulatedChannel::tracked(address.clone(), Arc::clone(&self.live));
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(channel))
    }
}

fn advertise(
    peers: Vec<SimulatedPeer>,
    interval: Duration,
    events: mpsc::Sender<DeviceFoundEvent>,
    stop: std_mpsc::Receiver<()>,
    slot: Arc<Mutex<Option<ActiveDiscovery>>>,
    generation: u64,
) {
    for peer in &peers {
        // Only a timeout means "keep going"; a dropped stop sender ends the scan.
        if !matches!(stop.recv_timeout(interval), Err(std_mpsc::RecvTimeoutError::Timeout)) {
            debug!("simulated discovery #{generation}: advertiser stopped");
            return;
        }
        if events.blocking_send(peer.found_event()).is_err() {
            debug!("simulated discovery #{generation}: receiver gone");
            return;
        }
    }

    // Finished naturally: release the shared sender so the stream closes.
    let mut guard = lock(&slot);
    if guard.as_ref().is_some_and(|a| a.generation == generation) {
        guard.take();
        debug!("simulated discovery #{generation} finished");
    }
}

/// Loopback stream: whatever is written can be read back.
pub struct SimulatedChannel {
    peer: Address,
    buffer: VecDeque<u8>,
    live: Arc<AtomicUsize>,
}

impl SimulatedChannel {
    pub fn new(peer: Address) -> Self {
        Self::tracked(peer, Arc::new(AtomicUsize::new(0)))
    }

    /// A channel counted in `live` until it is dropped.
    fn tracked(peer: Address, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            peer,
            buffer: VecDeque::new(),
            live,
        }
    }
}

impl Drop for SimulatedChannel {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Read for SimulatedChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.buffer.len());
        for (dst, src) in buf.iter_mut().zip(self.buffer.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for SimulatedChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StreamChannel for SimulatedChannel {
    fn peer(&self) -> &Address {
        &self.peer
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
