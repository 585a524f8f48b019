//! Radio transport implementations.
//!
//! - **`simulated`** – in-memory radio driven by the `[simulation]` config
//!   section.  Advertises configured peers on a background thread and opens
//!   loopback stream channels.  Used by the host binary and integration tests.

pub mod simulated;
