//! PeerLink host entry point.
//!
//! Headless driver for the orchestrator, running against the simulated radio
//! described by the config file:
//!
//! ```text
//! main()
//!  └─ load config, init tracing
//!  └─ SimulatedRadio + StaticPermissionGate + Orchestrator
//!  └─ presentation pump (LoggingPresentationSink)
//!  └─ scan for the scan window (or until discovery finishes)
//!  └─ select the first listed device, wait for Connected / Failed
//!  └─ exchange a greeting over the established stream, shut down
//! ```
//!
//! Ctrl-C at any point shuts the orchestrator down cleanly.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use peerlink::application::{
    discovery::DiscoveryError,
    orchestrator::Orchestrator,
    presentation::{spawn_presentation_pump, PresentationSink},
};
use peerlink::infrastructure::{
    permissions::StaticPermissionGate,
    radio::simulated::SimulatedRadio,
    storage::config::{load_config, load_config_from, AppConfig},
    ui_bridge::{list_devices, LoggingPresentationSink},
};
use peerlink_core::{ConnectionState, ScanState};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(name = "peerlink-host", version, about = "Discover a nearby peer and open a stream to it")]
struct Args {
    /// Config file to use instead of the platform default.
    #[arg(long, env = "PEERLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds to scan before selecting a device.
    #[arg(long, env = "PEERLINK_SCAN_SECS")]
    scan_secs: Option<u64>,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, env = "PEERLINK_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // An explicit path must load; the platform default falls back to defaults.
    let (config, config_warning) = match &args.config {
        Some(path) => (
            load_config_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None,
        ),
        None => match load_config() {
            Ok(cfg) => (cfg, None),
            Err(e) => (AppConfig::default(), Some(e)),
        },
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.host.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!("PeerLink host starting");
    if let Some(e) = config_warning {
        warn!("using default config: {e}");
    }

    let orchestrator_config = config.orchestrator_config()?;
    let radio = Arc::new(SimulatedRadio::from_config(&config.simulation));
    let permissions = Arc::new(StaticPermissionGate::from_config(&config.permissions));
    let (orchestrator, notifications) = Orchestrator::new(radio, permissions, orchestrator_config);
    let sink: Arc<dyn PresentationSink> = Arc::new(LoggingPresentationSink);
    let pump = spawn_presentation_pump(notifications, sink);

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    run(&orchestrator, &running, args.scan_secs.unwrap_or(config.host.scan_window_secs)).await;

    orchestrator.shutdown();
    drop(orchestrator);
    if tokio::time::timeout(Duration::from_secs(2), pump).await.is_err() {
        warn!("presentation pump did not drain in time");
    }
    info!("PeerLink host stopped");
    Ok(())
}

async fn run(orchestrator: &Orchestrator, running: &AtomicBool, scan_secs: u64) {
    // ── Scan ──────────────────────────────────────────────────────────────────
    match orchestrator.on_scan_requested() {
        Ok(()) => {}
        // The orchestrator already asked the radio to switch on; try once more.
        Err(DiscoveryError::RadioDisabled) => {
            if let Err(e) = orchestrator.on_scan_requested() {
                error!("cannot scan: {e}");
                return;
            }
        }
        Err(e) => {
            error!("cannot scan: {e}");
            return;
        }
    }

    let deadline = Instant::now() + Duration::from_secs(scan_secs);
    let finished = wait_until(running, || {
        orchestrator.scan_state() == ScanState::Idle || Instant::now() >= deadline
    })
    .await;
    if !finished {
        return;
    }
    orchestrator.on_stop_requested();

    // ── Select ────────────────────────────────────────────────────────────────
    let devices = list_devices(orchestrator).data.unwrap_or_default();
    info!("{} device(s) available", devices.len());
    let Some(first) = orchestrator.registry_snapshot().into_iter().next() else {
        warn!("no unbonded devices found");
        return;
    };
    orchestrator.on_device_selected(first);

    if !wait_until(running, || orchestrator.connection_state().is_terminal()).await {
        return;
    }

    // ── Use the stream ────────────────────────────────────────────────────────
    if let ConnectionState::Connected(device) = orchestrator.connection_state() {
        if let Some(mut channel) = orchestrator.take_established_channel() {
            let mut reply = [0u8; 64];
            let exchanged = channel
                .write_all(b"hello from peerlink")
                .and_then(|()| channel.flush())
                .and_then(|()| channel.read(&mut reply));
            match exchanged {
                Ok(n) => info!(
                    "{device} answered {:?}",
                    String::from_utf8_lossy(&reply[..n])
                ),
                Err(e) => warn!("stream to {device} failed: {e}"),
            }
        }
    }
}

/// Polls `condition` until it holds (`true`) or Ctrl-C is pressed (`false`).
async fn wait_until(running: &AtomicBool, condition: impl Fn() -> bool) -> bool {
    loop {
        if !running.load(Ordering::Relaxed) {
            return false;
        }
        if condition() {
            return true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
