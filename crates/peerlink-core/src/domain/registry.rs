//! DeviceRegistry: the ordered, duplicate-free list of discovered peers.
//!
//! The registry is what the operator sees while a scan runs.  It obeys two
//! rules:
//!
//! - **No duplicates.**  The radio reports the same peer many times during a
//!   scan; only the first report for an address is kept.
//! - **No bonded peers.**  Devices that are already paired with this host are
//!   not candidates and are filtered out at insertion time.  The filter is
//!   never re-evaluated later, so a peer that was bonded when first seen stays
//!   out of the list for the rest of the scan.
//!
//! # Vec + HashSet choice
//!
//! Entries live in a `Vec` so the presentation layer sees them in discovery
//! order.  A `HashSet<Address>` sits alongside it for O(1) membership tests.
//! A second set remembers addresses first reported as bonded; both sets are
//! reset by [`DeviceRegistry::clear`] at the start of every scan.
//! Registries hold tens of devices at most, so the index is a convenience
//! rather than a necessity.
//!
//! The registry is a plain value.  Concurrency (one discovery writer, many
//! readers) is handled by the owner, which keeps it behind a single lock.

use std::collections::HashSet;

use tracing::trace;

use super::device::{Address, DeviceRecord};

#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    entries: Vec<DeviceRecord>,
    index: HashSet<Address>,
    excluded: HashSet<Address>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every entry.  Calling it on an empty registry is a no-op.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.excluded.clear();
    }

    /// Inserts `record` if it is not bonded and its address is new.
    ///
    /// An address whose first report was bonded stays excluded until the
    /// next [`clear`](Self::clear), whatever later reports say.
    ///
    /// Returns `true` when the record was appended.
    pub fn try_add(&mut self, record: DeviceRecord) -> bool {
        if self.excluded.contains(record.address()) {
            trace!("skipping device {} first seen as bonded", record.address());
            return false;
        }
        if !record.bond_state().is_listable() {
            if !self.index.contains(record.address()) {
                self.excluded.insert(record.address().clone());
            }
            trace!("skipping bonded device {}", record.address());
            return false;
        }
        if !self.index.insert(record.address().clone()) {
            trace!("skipping duplicate device {}", record.address());
            return false;
        }
        self.entries.push(record);
        true
    }

    /// Returns a copy of the entries in insertion order.
    pub fn snapshot(&self) -> Vec<DeviceRecord> {
        self.entries.clone()
    }

    /// Borrows the entries in insertion order.
    pub fn records(&self) -> &[DeviceRecord] {
        &self.entries
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.index.contains(address)
    }

    pub fn get(&self, address: &Address) -> Option<&DeviceRecord> {
        if !self.contains(address) {
            return None;
        }
        self.entries.iter().find(|r| r.address() == address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
