//! # peerlink-core
//!
//! Shared domain library for PeerLink: the records produced by wireless
//! discovery, the deduplicated registry that holds them, and the state values
//! that describe a scan and a stream connection.
//!
//! This crate has zero dependencies on OS APIs, async runtimes, or radio
//! stacks.  The `peerlink` crate drives these types from its application
//! layer and adapts them to a concrete transport.
//!
//! # Architecture overview (for beginners)
//!
//! PeerLink lets a single operator find nearby peer devices and open one
//! reliable stream connection (an RFCOMM-style serial link) to the device they
//! pick.  The domain is small:
//!
//! - **`domain::device`** – What a discovered peer looks like: its transport
//!   address, optional name, and bond (pairing) state.
//!
//! - **`domain::registry`** – The ordered, duplicate-free list of unbonded
//!   peers found during the current scan.
//!
//! - **`domain::link`** – Scan and connection state machines' state values,
//!   the failure taxonomy, and the well-known service identifier used to open
//!   the stream.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `peerlink_core::DeviceRecord` instead of `peerlink_core::domain::device::DeviceRecord`.
pub use domain::device::{Address, BondState, DeviceFoundEvent, DeviceRecord, UNKNOWN_DEVICE_NAME};
pub use domain::link::{
    Capability, ConnectionState, FailureReason, ScanState, ServiceId, SessionId, TransportError,
};
pub use domain::registry::DeviceRegistry;
