//! # Padwatch
//!
//! Console monitor for game controllers.
//!
//! Enumerates connected gamepads and prints every state change of the first one
//! as a JSON line until Ctrl+C.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use padwatch::config::{Config, LoggingConfig};
use padwatch::controller::{enumerate_slots, SessionOptions};
use padwatch::error::PadwatchError;
use padwatch::source::evdev::EvdevSource;
use padwatch::source::StateSource;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for Padwatch
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults if the file does not exist)
///    - Set up logging to the console and, optionally, a daily log file
///    - Open the evdev backend and enumerate gamepads
///
/// 2. **Main Loop**
///    - Print each state change of the first gamepad as a JSON line
///    - Print key transitions when `polling.keystrokes` is enabled
///    - Wait for Ctrl+C
///
/// 3. **Graceful Shutdown**
///    - Stop every session and wait for its loop to exit
///
/// # Errors
///
/// Returns error if the configuration is invalid or the input devices
/// cannot be read.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=padwatch=debug cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// {"timestamp":"2024-05-01T12:00:00.000Z","snapshot":{"slot":0,"sequence":1,...}}
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let (config, loaded) = load_config(&config_path)?;

    let _guard = init_logging(&config.logging)?;

    info!("Padwatch v{} starting...", env!("CARGO_PKG_VERSION"));
    if !loaded {
        warn!("Config file {} not found, using defaults", config_path);
    }

    let source: Arc<dyn StateSource> = match EvdevSource::open() {
        Ok(source) => Arc::new(source),
        Err(PadwatchError::ControllerNotFound) => {
            println!("No gamepads connected");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to open input devices"),
    };

    let options = SessionOptions::from_config(&config);
    let sessions = enumerate_slots(source, &options, 0..config.polling.max_slots)?;

    let Some(first) = sessions.first() else {
        println!("No gamepads connected");
        return Ok(());
    };

    match first.battery() {
        Ok(battery) => info!(slot = first.slot(), "Battery: {:?}", battery),
        Err(e) => info!(slot = first.slot(), "Battery unavailable: {}", e),
    }

    first.subscribe(|pad| {
        let line = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "snapshot": pad.snapshot(),
        });
        println!("{}", line);
    });

    if options.keystrokes {
        first.subscribe_keys(|pad, event| {
            let line = json!({
                "timestamp": Utc::now().to_rfc3339(),
                "slot": pad.slot(),
                "key": event,
            });
            println!("{}", line);
        });
    }

    info!("Watching slot {}. Press Ctrl+C to exit", first.slot());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, shutting down...");

    for session in sessions {
        session.shutdown().await;
    }

    Ok(())
}

/// Loads `path`, or the defaults if it does not exist. The flag tells which.
fn load_config(path: &str) -> Result<(Config, bool)> {
    if !Path::new(path).exists() {
        return Ok((Config::default(), false));
    }
    let config = Config::load(path).with_context(|| format!("Invalid config file {}", path))?;
    Ok((config, true))
}

/// Console logging plus an optional daily file.
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the
/// file writer and must live until exit.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log filter")?;

    let (file_layer, guard) = if logging.directory.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}
