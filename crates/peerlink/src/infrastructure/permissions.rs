//! Config-driven permission gate.
//!
//! A headless host has no runtime permission prompt, so grants come from the
//! `[permissions]` config section.  They can be revoked or granted while the
//! host runs (e.g. from a command handler), which is how a platform would
//! report the operator toggling a permission in system settings.

use std::sync::atomic::{AtomicBool, Ordering};

use peerlink_core::Capability;
use tracing::info;

use crate::application::permissions::PermissionGate;
use crate::infrastructure::storage::config::PermissionsConfig;

#[derive(Debug)]
pub struct StaticPermissionGate {
    scan_devices: AtomicBool,
    connect_devices: AtomicBool,
}

impl StaticPermissionGate {
    pub fn new(scan_devices: bool, connect_devices: bool) -> Self {
        Self {
            scan_devices: AtomicBool::new(scan_devices),
            connect_devices: AtomicBool::new(connect_devices),
        }
    }

    /// Grants everything.
    pub fn allow_all() -> Self {
        Self::new(true, true)
    }

    pub fn from_config(cfg: &PermissionsConfig) -> Self {
        Self::new(cfg.scan_devices, cfg.connect_devices)
    }

    pub fn set(&self, capability: Capability, granted: bool) {
        info!("permission {capability} {}", if granted { "granted" } else { "revoked" });
        self.flag(capability).store(granted, Ordering::SeqCst);
    }

    fn flag(&self, capability: Capability) -> &AtomicBool {
        match capability {
            Capability::ScanDevices => &self.scan_devices,
            Capability::ConnectDevices => &self.connect_devices,
        }
    }
}

impl PermissionGate for StaticPermissionGate {
    fn has_capability(&self, capability: Capability) -> bool {
        self.flag(capability).load(Ordering::SeqCst)
    }
}
