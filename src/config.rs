//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) gives a
//! working setup for a Tello on its own access point.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::controller::layout::{LayoutRegistry, DEFAULT_LAYOUT};
use crate::drone::protocol::{SPEED_MAX, SPEED_MIN, TELLO_COMMAND_PORT, TELLO_HOST, TELLO_STATE_PORT};
use crate::error::{Result, TelloPadError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub drone: DroneConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    #[serde(default = "default_layout")]
    pub layout: String,

    /// Empty means auto-detect.
    #[serde(default)]
    pub device_path: String,
}

/// Drone link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DroneConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_command_port")]
    pub command_port: u16,

    /// 0 picks an ephemeral port.
    #[serde(default = "default_local_port")]
    pub local_port: u16,

    #[serde(default = "default_speed")]
    pub speed: u16,

    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_state_port")]
    pub state_port: u16,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Application log configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily log files. Empty logs to the console only.
    #[serde(default)]
    pub dir: String,
}

// Default value functions
fn default_layout() -> String { DEFAULT_LAYOUT.to_string() }

fn default_host() -> String { TELLO_HOST.to_string() }
fn default_command_port() -> u16 { TELLO_COMMAND_PORT }
fn default_local_port() -> u16 { TELLO_COMMAND_PORT }
fn default_speed() -> u16 { 10 }
fn default_response_timeout_ms() -> u64 { 7000 }

fn default_tick_rate_hz() -> u32 { 120 }

fn default_telemetry_enabled() -> bool { true }
fn default_state_port() -> u16 { TELLO_STATE_PORT }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 1000 }
fn default_log_format() -> String { "jsonl".to_string() }

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            device_path: String::new(),
        }
    }
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            command_port: default_command_port(),
            local_port: default_local_port(),
            speed: default_speed(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            state_port: default_state_port(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - A value is out of range
    ///
    /// The controller layout is checked later by [`Config::validate_with`],
    /// once the command line has had a chance to override it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tello_pad::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` for malformed TOML and `Configuration` for
    /// invalid values.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Tick period derived from `tick_rate_hz`, in whole milliseconds.
    ///
    /// Never returns zero.
    #[must_use]
    pub fn tick_period_ms(&self) -> u64 {
        (1000 / u64::from(self.control.tick_rate_hz.max(1))).max(1)
    }

    /// Validate configuration values and check the layout against `registry`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the layout is not registered or any value
    /// is out of its valid range.
    pub fn validate_with(&self, registry: &LayoutRegistry) -> Result<()> {
        registry.get(&self.controller.layout)?;
        self.validate()
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if any value is out of its valid range.
    pub fn validate(&self) -> Result<()> {
        // Validate drone link
        if self.drone.host.is_empty() {
            return Err(TelloPadError::config("drone host cannot be empty"));
        }

        if self.drone.command_port == 0 {
            return Err(TelloPadError::config("drone command_port cannot be 0"));
        }

        if !(SPEED_MIN..=SPEED_MAX).contains(&self.drone.speed) {
            return Err(TelloPadError::config(format!(
                "drone speed must be between {} and {}",
                SPEED_MIN, SPEED_MAX
            )));
        }

        if self.drone.response_timeout_ms == 0 || self.drone.response_timeout_ms > 60000 {
            return Err(TelloPadError::config("response_timeout_ms must be between 1 and 60000"));
        }

        // Validate control loop
        if self.control.tick_rate_hz == 0 || self.control.tick_rate_hz > 500 {
            return Err(TelloPadError::config("tick_rate_hz must be between 1 and 500"));
        }

        // Validate telemetry configuration
        if self.telemetry.enabled {
            if self.telemetry.log_dir.is_empty() {
                return Err(TelloPadError::config("telemetry log_dir cannot be empty when enabled"));
            }

            if self.telemetry.state_port == 0 {
                return Err(TelloPadError::config("telemetry state_port cannot be 0"));
            }
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(TelloPadError::config("log_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(TelloPadError::config("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(TelloPadError::config("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(TelloPadError::config("log format must be 'jsonl' (only supported format)"));
        }

        Ok(())
    }
}
