//! Application layer use cases for peerlink.
//!
//! Use cases in this layer orchestrate domain objects from `peerlink_core`
//! and depend only on traits for the outside world (the radio, the permission
//! prompt, the presentation surface).  They contain no OS calls.
//!
//! # Sub-modules
//!
//! - **`transport`**   – The `RadioTransport` and `StreamChannel` traits the
//!   radio stack must implement.
//!
//! - **`permissions`** – The `PermissionGate` queried before every radio
//!   operation.
//!
//! - **`presentation`** – The `Notification` values emitted to the UI and the
//!   `PresentationSink` pump that delivers them.
//!
//! - **`discovery`**   – `DiscoveryController`: scan lifecycle and the
//!   registry's single mutation point.
//!
//! - **`connect_session`** – `ConnectionSession`: one connect attempt at a
//!   time, with stale results dropped by generation.
//!
//! - **`orchestrator`** – `Orchestrator`: sequences discovery and connection
//!   and owns the notification channel.

pub mod connect_session;
pub mod discovery;
pub mod orchestrator;
pub mod permissions;
pub mod presentation;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
