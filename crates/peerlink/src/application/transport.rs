//! Radio transport abstraction.
//!
//! The application layer never talks to a radio stack directly.  Everything
//! it needs is expressed by [`RadioTransport`]; infrastructure provides the
//! implementation (the in-memory `SimulatedRadio`, or an adapter over a real
//! Bluetooth stack).
//!
//! # Threading contract
//!
//! - `start_discovery` / `cancel_discovery` must only *issue* the request and
//!   return promptly.  Found devices are pushed into the supplied bounded
//!   channel from whatever thread the stack reports them on.
//! - `connect` is a **blocking** call.  The application layer always runs it
//!   on a dedicated blocking worker, never on the caller's thread.

use std::io::{Read, Write};

use peerlink_core::{Address, DeviceFoundEvent, ServiceId, TransportError};
use tokio::sync::mpsc;

/// An established, bidirectional byte stream to a peer.
///
/// The core treats it as opaque; reading and writing is the host's business.
pub trait StreamChannel: Read + Write + Send {
    /// The peer at the other end of the stream.
    fn peer(&self) -> &Address;
}

/// Boxed channel handed to the host once a connection succeeds.
pub type EstablishedChannel = Box<dyn StreamChannel>;

/// Operations the core needs from the radio.
pub trait RadioTransport: Send + Sync {
    /// Whether the local radio is switched on.
    fn is_enabled(&self) -> bool;

    /// Asks the platform to switch the radio on.  Fire-and-forget: the
    /// outcome is observed later through `is_enabled` / radio-state events.
    fn request_enable(&self);

    /// Begins discovery.  Every device report is sent on `events` in the
    /// order the radio produced it.  The transport drops `events` when
    /// discovery ends, either after `cancel_discovery` or on its own.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the radio refuses to start discovery.
    fn start_discovery(&self, events: mpsc::Sender<DeviceFoundEvent>)
        -> Result<(), TransportError>;

    /// Requests that discovery stop.
    fn cancel_discovery(&self);

    /// Whether the radio reports discovery as running.
    fn is_discovering(&self) -> bool;

    /// Opens a stream to the `service` endpoint on the peer at `address`.
    ///
    /// Blocks until the stream is established or the attempt fails.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing why the connection failed.
    fn connect(
        &self,
        address: &Address,
        service: ServiceId,
    ) -> Result<EstablishedChannel, TransportError>;
}
