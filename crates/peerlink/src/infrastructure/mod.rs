//! Infrastructure layer for PeerLink.
//!
//! Contains the adapters behind the application traits: the simulated radio
//! transport, the config-driven permission gate, TOML config storage, and
//! the host command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `peerlink_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod permissions;
pub mod radio;
pub mod storage;
pub mod ui_bridge;
