//! Discovered peer devices.
//!
//! A [`DeviceRecord`] is built once from a transport [`DeviceFoundEvent`] and
//! never mutated afterwards.  Its [`Address`] is the unique key used by the
//! registry for deduplication.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name shown for a device that did not advertise one.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

/// Stable transport address of a peer (e.g. `"00:11:22:AA:BB:CC"`).
///
/// Addresses are normalised on construction: surrounding whitespace is
/// trimmed and ASCII letters are upper-cased, so two reports of the same
/// hardware address always compare equal regardless of how the radio stack
/// formatted them.  Deserialising goes through the same normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Creates a normalised address.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    /// Returns the normalised address text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Long-term pairing relationship between this host and a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondState {
    /// A pairing/trust relationship already exists.
    Bonded,
    /// No pairing exists.
    NotBonded,
    /// The radio stack could not report a bond state.
    Unknown,
}

impl BondState {
    /// Returns `true` when a record with this state may enter the registry.
    pub fn is_listable(self) -> bool {
        !matches!(self, BondState::Bonded)
    }
}

/// Raw "device found" payload delivered by the radio transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFoundEvent {
    pub address: Address,
    pub name: Option<String>,
    pub bond_state: BondState,
}

impl DeviceFoundEvent {
    pub fn new(address: impl Into<Address>, name: Option<&str>, bond_state: BondState) -> Self {
        Self {
            address: address.into(),
            name: name.map(str::to_string),
            bond_state,
        }
    }
}

/// An immutable record of one discovered peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "DeviceRecordFields")]
pub struct DeviceRecord {
    address: Address,
    name: Option<String>,
    bond_state: BondState,
}

impl DeviceRecord {
    /// Creates a record.  An empty or whitespace-only name is treated as absent.
    pub fn new(address: Address, name: Option<String>, bond_state: BondState) -> Self {
        let name = name.filter(|n| !n.trim().is_empty());
        Self {
            address,
            name,
            bond_state,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The advertised name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The advertised name, or [`UNKNOWN_DEVICE_NAME`] when the peer sent none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_DEVICE_NAME)
    }

    pub fn bond_state(&self) -> BondState {
        self.bond_state
    }
}

/// Wire shape of a [`DeviceRecord`]; deserialised records pass through
/// [`DeviceRecord::new`].
#[derive(Deserialize)]
struct DeviceRecordFields {
    address: Address,
    #[serde(default)]
    name: Option<String>,
    bond_state: BondState,
}

impl From<DeviceRecordFields> for DeviceRecord {
    fn from(fields: DeviceRecordFields) -> Self {
        Self::new(fields.address, fields.name, fields.bond_state)
    }
}

impl From<DeviceFoundEvent> for DeviceRecord {
    fn from(event: DeviceFoundEvent) -> Self {
        Self::new(event.address, event.name, event.bond_state)
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.address)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalises_case_and_whitespace() {
        // Arrange / Act
        let a = Address::new("  aa:bb:cc:dd:ee:ff ");
        let b = Address::new("AA:BB:CC:DD:EE:FF");

        // Assert
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_address_parses_from_str() {
        let addr: Address = "01:02:03:04:05:0a".parse().unwrap();
        assert_eq!(addr.to_string(), "01:02:03:04:05:0A");
    }

    #[test]
    fn test_display_name_falls_back_to_unknown_device() {
        // Arrange
        let record = DeviceRecord::new(Address::new("00:00:00:00:00:01"), None, BondState::NotBonded);

        // Act / Assert
        assert_eq!(record.display_name(), UNKNOWN_DEVICE_NAME);
        assert_eq!(record.name(), None);
    }

    #[test]
    fn test_empty_name_is_treated_as_absent() {
        let record = DeviceRecord::new(
            Address::new("00:00:00:00:00:02"),
            Some("   ".to_string()),
            BondState::Unknown,
        );
        assert_eq!(record.name(), None);
        assert_eq!(record.display_name(), "Unknown Device");
    }

    #[test]
    fn test_record_from_event_keeps_all_fields() {
        // Arrange
        let event = DeviceFoundEvent::new("11:22:33:44:55:66", Some("Printer"), BondState::NotBonded);

        // Act
        let record = DeviceRecord::from(event);

        // Assert
        assert_eq!(record.address().as_str(), "11:22:33:44:55:66");
        assert_eq!(record.display_name(), "Printer");
        assert_eq!(record.bond_state(), BondState::NotBonded);
    }

    #[test]
    fn test_only_bonded_state_is_unlistable() {
        assert!(!BondState::Bonded.is_listable());
        assert!(BondState::NotBonded.is_listable());
        assert!(BondState::Unknown.is_listable());
    }

    #[test]
    fn test_record_display_includes_name_and_address() {
        let record = DeviceRecord::new(
            Address::new("00:11:22:33:44:55"),
            Some("Headset".to_string()),
            BondState::NotBonded,
        );
        assert_eq!(record.to_string(), "Headset (00:11:22:33:44:55)");
    }

    #[test]
    fn test_address_serializes_as_plain_string() {
        let json = serde_json::to_string(&Address::new("ab:cd")).unwrap();
        assert_eq!(json, "\"AB:CD\"");
    }

    #[test]
    fn test_deserialized_address_is_normalised() {
        // Arrange / Act
        let addr: Address = serde_json::from_str("\" aa:bb \"").unwrap();

        // Assert – dedups against the constructed form
        assert_eq!(addr, Address::new("AA:BB"));
    }

    #[test]
    fn test_deserialized_record_applies_constructor_rules() {
        // Arrange
        let json = r#"{"address":"cc:dd","name":"  ","bond_state":"NotBonded"}"#;

        // Act
        let record: DeviceRecord = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(record.address().as_str(), "CC:DD");
        assert_eq!(record.name(), None);
        assert_eq!(record.display_name(), UNKNOWN_DEVICE_NAME);
    }
}
