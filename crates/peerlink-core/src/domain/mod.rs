//! Domain entities for PeerLink.
//!
//! This module contains pure business rules with no infrastructure
//! dependencies.  Everything here can be compiled and tested on any platform
//! without a radio, a runtime, or a UI.
//!
//! Code in outer layers (application, infrastructure) depends on the domain,
//! but the domain never depends on them.

/// Discovered peer devices and their addresses.
pub mod device;

/// Scan state, connection state, and the transport failure taxonomy.
pub mod link;

/// The ordered, deduplicated registry of discovered devices.
///
/// See [`registry::DeviceRegistry`] for the main type.
pub mod registry;
