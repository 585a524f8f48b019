//! Runtime permission gate.
//!
//! The operating system may withhold radio permissions at any time.  The core
//! asks the gate before every radio operation and treats a denial as "do not
//! touch the transport": scans are rejected, connection attempts fail
//! immediately with `FailureReason::PermissionDenied`.

use peerlink_core::Capability;

/// Answers whether the host currently holds a capability.
///
/// Implementations must be cheap; the core calls this on the foreground path.
#[cfg_attr(test, mockall::automock)]
pub trait PermissionGate: Send + Sync {
    fn has_capability(&self, capability: Capability) -> bool;
}
