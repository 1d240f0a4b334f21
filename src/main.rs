//! # Tello Pad
//!
//! Fly a Tello drone with a gamepad.
//!
//! ## Controls
//!
//! - START: takeoff
//! - SELECT: land
//! - Left stick: climb/descend and rotate
//! - Right stick: move forward/back and left/right
//! - D-Pad (8BitDo layout): flips

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tello_pad::config::{Config, LoggingConfig};
use tello_pad::controller::events::{describe_event, PadEvent};
use tello_pad::controller::gamepad::Gamepad;
use tello_pad::controller::layout::{Layout, LayoutRegistry};
use tello_pad::controller::translator::ControlSession;
use tello_pad::drone::tello::TelloLink;
use tello_pad::pilot::{Flow, Pilot};
use tello_pad::telemetry;

/// File name prefix for the daily application log.
const LOG_FILE_PREFIX: &str = "tello-pad.log";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller layout, e.g. "default" or "8bitdo" (overrides the config file)
    #[arg(short, long)]
    layout: Option<String>,

    /// Input event device, e.g. /dev/input/event5 (auto-detected if omitted)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Print gamepad events with their layout names instead of flying
    #[arg(long)]
    probe: bool,
}

/// Main entry point for Tello Pad
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration and apply command line overrides
///    - Reject unknown layouts before touching any device
///    - Open the gamepad and connect to the drone
///
/// 2. **Main Loop**
///    - Gamepad events update the control session as they arrive
///    - A fixed-rate tick sends the current velocities while armed
///    - Ctrl+C or losing the gamepad ends the loop
///
/// 3. **Graceful Shutdown**
///    - Land if still armed
///    - Log totals
///
/// # Errors
///
/// Returns error if the configuration is invalid, no gamepad is found, or
/// the drone does not answer the SDK handshake.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config.logging);

    info!("Tello Pad v{} starting...", env!("CARGO_PKG_VERSION"));

    let registry = LayoutRegistry::builtin();

    apply_overrides(&mut config, &args);
    config.validate_with(&registry)?;

    let layout = registry.get(&config.controller.layout)?.clone();
    info!("Controller layout: {}", layout.id());

    let gamepad = if config.controller.device_path.is_empty() {
        Gamepad::open()?
    } else {
        Gamepad::open_path(&config.controller.device_path)?
    };

    if args.probe {
        return run_probe(gamepad, &layout).await;
    }

    let transport = TelloLink::connect(&config.drone).await?;

    let telemetry_task = if config.telemetry.enabled {
        Some(telemetry::spawn(config.telemetry.clone()))
    } else {
        None
    };

    let mut events = gamepad.into_stream()?;
    let mut pilot = Pilot::new(ControlSession::new(layout), transport);

    let mut tick = interval(Duration::from_millis(config.tick_period_ms()));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Control loop running at {}Hz", config.control.tick_rate_hz);
    info!("START takes off, SELECT lands. Press Ctrl+C to exit");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                pilot.on_tick().await;
            }

            event = events.next_event() => {
                let event = event.unwrap_or_else(|e| {
                    error!("Gamepad lost: {}", e);
                    PadEvent::Quit
                });

                if pilot.handle_event(event).await == Flow::Stop {
                    info!("Quit requested, shutting down...");
                    break;
                }
            }

            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let stats = pilot.shutdown().await;
    info!(
        "Total velocity commands sent: {} ({} failed), actions sent: {} ({} failed)",
        stats.commands_sent, stats.send_failures, stats.actions_sent, stats.action_failures
    );

    if let Some(task) = telemetry_task {
        task.abort();
    }

    Ok(())
}

/// Command line values win over the config file.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(layout) = &args.layout {
        config.controller.layout = layout.clone();
    }
    if let Some(device) = &args.device {
        config.controller.device_path = device.to_string_lossy().to_string();
    }
}

/// Console logging, plus a daily-rolling file when `[logging] dir` is set.
///
/// The returned guard must live until exit so buffered file lines are flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = if config.dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Logs every gamepad event with its semantic name until Ctrl+C.
async fn run_probe(gamepad: Gamepad, layout: &Layout) -> Result<()> {
    info!("Gamepad: {}", gamepad.name().unwrap_or("unnamed"));
    info!("  Number of axes: {}", gamepad.index_map().axis_count());
    info!("  Number of buttons: {}", gamepad.index_map().button_count());
    info!("Listening for gamepad events... Press Ctrl+C to exit.");

    let mut events = gamepad.into_stream()?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.next_event() => match event {
                Ok(event) => info!("{}", describe_event(layout, &event)),
                Err(e) => {
                    error!("Gamepad lost: {}", e);
                    break;
                }
            },

            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}
