//! # Telemetry Module
//!
//! Receives Tello state broadcasts and logs them to JSONL files with rotation.
//!
//! This module handles:
//! - Receiving state datagrams on UDP port 8890
//! - Parsing them into [`TelloState`](state::TelloState)
//! - Reporting battery level changes through the application log
//! - Writing timestamped records to rotating log files
//!
//! Telemetry runs as its own task and never touches control state.

pub mod logger;
pub mod state;

use chrono::Local;
use serde::Serialize;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;
use logger::TelemetryLogger;
use state::TelloState;

/// Battery percentage at or below which a warning is logged.
pub const LOW_BATTERY_PERCENT: i32 = 20;

/// Largest state datagram we expect.
const STATE_BUFFER_SIZE: usize = 1024;

/// One line of the telemetry log.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord<'a> {
    /// RFC 3339 local time of reception.
    pub timestamp: String,
    #[serde(flatten)]
    pub state: &'a TelloState,
}

impl<'a> TelemetryRecord<'a> {
    /// Stamps `state` with the current local time.
    #[must_use]
    pub fn now(state: &'a TelloState) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            state,
        }
    }
}

/// A battery reading worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReport {
    pub percent: i32,
    pub low: bool,
}

/// Tracks the battery level and reports only changes.
#[derive(Debug, Default)]
pub struct BatteryMonitor {
    last: Option<i32>,
}

impl BatteryMonitor {
    /// Records a reading. Returns a report when the level changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_pad::telemetry::BatteryMonitor;
    ///
    /// let mut monitor = BatteryMonitor::default();
    /// assert!(monitor.observe(80).is_some());
    /// assert!(monitor.observe(80).is_none());
    /// assert!(monitor.observe(15).unwrap().low);
    /// ```
    pub fn observe(&mut self, percent: i32) -> Option<BatteryReport> {
        if self.last == Some(percent) {
            return None;
        }
        self.last = Some(percent);
        Some(BatteryReport {
            percent,
            low: percent <= LOW_BATTERY_PERCENT,
        })
    }

    /// Records the battery level of a state packet, if it carried one.
    ///
    /// Packets without a readable `bat` field leave the last reading alone.
    pub fn observe_state(&mut self, state: &TelloState) -> Option<BatteryReport> {
        state.bat.and_then(|percent| self.observe(percent))
    }

    /// Last reported level.
    #[must_use]
    pub fn last(&self) -> Option<i32> {
        self.last
    }
}

/// Binds the state port and starts the telemetry task.
///
/// Failures are logged; flying continues without telemetry.
pub fn spawn(config: TelemetryConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let socket = match UdpSocket::bind(("0.0.0.0", config.state_port)).await {
            Ok(socket) => socket,
            Err(e) => {
                warn!("Telemetry disabled, failed to bind UDP port {}: {}", config.state_port, e);
                return;
            }
        };

        if let Err(e) = run(socket, config).await {
            warn!("Telemetry stopped: {}", e);
        }
    })
}

/// Receives state datagrams from `socket` until an I/O error occurs.
///
/// # Errors
///
/// Returns `Telemetry` if the log directory cannot be created, or
/// `Io` if the socket fails.
pub async fn run(socket: UdpSocket, config: TelemetryConfig) -> Result<()> {
    let mut logger = TelemetryLogger::new(
        &config.log_dir,
        config.max_records_per_file,
        config.max_files_to_keep,
    )?;
    let log_interval = Duration::from_millis(config.log_interval_ms);
    let mut last_write: Option<Instant> = None;
    let mut battery = BatteryMonitor::default();
    let mut buf = [0u8; STATE_BUFFER_SIZE];

    info!("Listening for drone state on {}", socket.local_addr()?);

    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;

        let state = match TelloState::parse(&String::from_utf8_lossy(&buf[..len])) {
            Ok(state) => state,
            Err(e) => {
                debug!("Dropping datagram from {}: {}", from, e);
                continue;
            }
        };

        if let Some(report) = battery.observe_state(&state) {
            if report.low {
                warn!("Battery low: {}%", report.percent);
            } else {
                info!("Battery: {}%", report.percent);
            }
        }

        let due = last_write.map_or(true, |t| t.elapsed() >= log_interval);
        if due {
            if let Err(e) = logger.write(&TelemetryRecord::now(&state)) {
                warn!("Failed to write telemetry record: {}", e);
            }
            last_write = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelloPadError;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> TelemetryConfig {
        TelemetryConfig {
            log_dir: dir.path().to_string_lossy().to_string(),
            log_interval_ms: 1,
            ..TelemetryConfig::default()
        }
    }

    #[test]
    fn test_battery_monitor_reports_changes_only() {
        let mut monitor = BatteryMonitor::default();
        assert_eq!(monitor.observe(90), Some(BatteryReport { percent: 90, low: false }));
        assert_eq!(monitor.observe(90), None);
        assert_eq!(monitor.observe(89), Some(BatteryReport { percent: 89, low: false }));
        assert_eq!(monitor.last(), Some(89));
    }

    #[test]
    fn test_battery_monitor_low_threshold() {
        let mut monitor = BatteryMonitor::default();
        assert!(!monitor.observe(21).unwrap().low);
        assert!(monitor.observe(20).unwrap().low);
        assert!(monitor.observe(5).unwrap().low);
    }

    #[test]
    fn test_battery_less_state_keeps_last_reading() {
        let mut monitor = BatteryMonitor::default();
        assert!(monitor.observe(87).is_some());

        let state = TelloState::parse("h:30;").unwrap();
        assert_eq!(monitor.observe_state(&state), None);

        let garbled = TelloState::parse("bat:abc;h:31;").unwrap();
        assert_eq!(monitor.observe_state(&garbled), None);
        assert_eq!(monitor.last(), Some(87));
    }

    #[test]
    fn test_record_flattens_state() {
        let state = TelloState::parse("bat:64;h:120;").unwrap();
        let record = TelemetryRecord::now(&state);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["bat"], 64);
        assert_eq!(json["h"], 120);
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn test_run_logs_received_state() {
        let dir = TempDir::new().unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let task = tokio::spawn(run(socket, test_config(&dir)));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"garbage", addr).await.unwrap();
        sender.send_to(b"pitch:0;roll:0;bat:77;h:10;", addr).await.unwrap();

        // Wait for the record to land on disk
        let mut contents = String::new();
        for _ in 0..100 {
            let files: Vec<_> = std::fs::read_dir(dir.path())
                .unwrap()
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .collect();
            if let Some(path) = files.first() {
                contents = std::fs::read_to_string(path).unwrap();
                if !contents.is_empty() {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        task.abort();

        let line = contents.lines().next().expect("telemetry record written");
        let json: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(json["bat"], 77);
        assert_eq!(json["h"], 10);
    }

    #[tokio::test]
    async fn test_run_fails_on_bad_log_dir() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("not_a_dir");
        std::fs::write(&file_path, "x").unwrap();

        let config = TelemetryConfig {
            log_dir: file_path.to_string_lossy().to_string(),
            ..TelemetryConfig::default()
        };
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let result = run(socket, config).await;
        assert!(matches!(result, Err(TelloPadError::Telemetry(_))));
    }
}
