//! TOML-based configuration for the PeerLink host.
//!
//! Reads and writes [`AppConfig`] at the platform-appropriate location:
//! - Windows:  `%APPDATA%\PeerLink\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/peerlink/config.toml` or `~/.config/peerlink/config.toml`
//! - macOS:    `~/Library/Application Support/PeerLink/config.toml`
//!
//! # Layout
//!
//! ```toml
//! [host]
//! log_level = "info"
//! scan_window_secs = 12
//!
//! [radio]
//! service_uuid = "00001101-0000-1000-8000-00805f9b34fb"
//! event_channel_capacity = 64
//!
//! [permissions]
//! scan_devices = true
//! connect_devices = true
//!
//! [simulation]
//! radio_enabled = true
//! advertise_interval_ms = 250
//!
//! [[simulation.peers]]
//! address = "00:11:22:33:44:55"
//! name = "Headset"
//! ```
//!
//! Every field has a `#[serde(default = ...)]`, so a missing file, a missing
//! section, or a missing key all fall back to the built-in defaults.

use std::path::{Path, PathBuf};

use peerlink_core::ServiceId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::orchestrator::OrchestratorConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `radio.service_uuid` is not a valid UUID.
    #[error("invalid service uuid {value:?}: {source}")]
    InvalidServiceUuid {
        value: String,
        #[source]
        source: uuid::Error,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How long the host scans before picking a device.
    #[serde(default = "default_scan_window_secs")]
    pub scan_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadioConfig {
    /// Service endpoint opened on the selected peer.
    #[serde(default = "default_service_uuid")]
    pub service_uuid: String,
    /// Bound on queued discovery reports.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PermissionsConfig {
    #[serde(default = "default_true")]
    pub scan_devices: bool,
    #[serde(default = "default_true")]
    pub connect_devices: bool,
}

/// Settings for the in-memory radio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_true")]
    pub radio_enabled: bool,
    /// Pause between two advertised peers.
    #[serde(default = "default_advertise_interval_ms")]
    pub advertise_interval_ms: u64,
    #[serde(default = "default_peers")]
    pub peers: Vec<SimulatedPeerConfig>,
}

/// One peer the simulated radio advertises.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatedPeerConfig {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub bonded: bool,
    #[serde(default = "default_true")]
    pub reachable: bool,
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_scan_window_secs() -> u64 {
    12
}
fn default_service_uuid() -> String {
    ServiceId::SERIAL_PORT.to_string()
}
fn default_event_channel_capacity() -> usize {
    64
}
fn default_true() -> bool {
    true
}
fn default_advertise_interval_ms() -> u64 {
    250
}
fn default_connect_delay_ms() -> u64 {
    300
}
fn default_peers() -> Vec<SimulatedPeerConfig> {
    vec![
        SimulatedPeerConfig {
            address: "00:11:22:33:44:55".to_string(),
            name: Some("Headset".to_string()),
            bonded: false,
            reachable: true,
            connect_delay_ms: default_connect_delay_ms(),
        },
        SimulatedPeerConfig {
            address: "00:11:22:33:44:66".to_string(),
            name: Some("Car Kit".to_string()),
            bonded: true,
            reachable: true,
            connect_delay_ms: default_connect_delay_ms(),
        },
        SimulatedPeerConfig {
            address: "00:11:22:33:44:77".to_string(),
            name: None,
            bonded: false,
            reachable: false,
            connect_delay_ms: default_connect_delay_ms(),
        },
    ]
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            scan_window_secs: default_scan_window_secs(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            service_uuid: default_service_uuid(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            scan_devices: true,
            connect_devices: true,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            radio_enabled: true,
            advertise_interval_ms: default_advertise_interval_ms(),
            peers: default_peers(),
        }
    }
}

impl RadioConfig {
    /// Parses `service_uuid`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidServiceUuid`] if the string is not a UUID.
    pub fn service_id(&self) -> Result<ServiceId, ConfigError> {
        self.service_uuid
            .parse()
            .map_err(|source| ConfigError::InvalidServiceUuid {
                value: self.service_uuid.clone(),
                source,
            })
    }
}

impl AppConfig {
    /// Orchestrator tunables derived from the `[radio]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidServiceUuid`] for a malformed service uuid.
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig, ConfigError> {
        Ok(OrchestratorConfig {
            service_id: self.radio.service_id()?,
            event_channel_capacity: self.radio.event_channel_capacity.max(1),
        })
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config from the platform location.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to the platform location.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&config_file_path()?, config)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("PeerLink"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("peerlink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("PeerLink")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
