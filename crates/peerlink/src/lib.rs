//! peerlink library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does peerlink do? (for beginners)
//!
//! peerlink is the engine behind a "find a nearby device and connect to it"
//! screen.  A host UI calls into the [`application::orchestrator::Orchestrator`]
//! and listens on its notification channel; the orchestrator:
//!
//! 1. Runs radio discovery and keeps a live, duplicate-free list of unbonded
//!    peers.
//! 2. When the operator picks a peer, stops discovery and opens one stream
//!    connection to it on a worker thread.
//! 3. Reports every change (list updated, scan started/stopped, connecting,
//!    connected, failed) back to the UI in order.
//!
//! The radio itself and the permission prompts are injected through traits,
//! so the same engine runs against a real radio stack or the in-memory
//! simulated radio used by the `peerlink-host` binary and the tests.

/// Application layer: collaborator traits and the discovery/connection use cases.
pub mod application;

/// Infrastructure layer: simulated radio, permissions, configuration, and UI bridge.
pub mod infrastructure;
