//! # Error Types
//!
//! Custom error types for Tello Pad using `thiserror`.

use thiserror::Error;

/// Main error type for Tello Pad
#[derive(Debug, Error)]
pub enum TelloPadError {
    /// Invalid configuration (unknown layout, out-of-range setting)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Gamepad access errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable gamepad was found under /dev/input
    #[error("No gamepad found")]
    ControllerNotFound,

    /// Drone link errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Telemetry file errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelloPadError {
    /// Builds a [`TelloPadError::Configuration`] from anything printable.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Result type alias for Tello Pad
pub type Result<T> = std::result::Result<T, TelloPadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let err = TelloPadError::config("unknown layout 'ps5'");
        assert_eq!(err.to_string(), "Configuration error: unknown layout 'ps5'");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TelloPadError = io.into();
        assert!(matches!(err, TelloPadError::Io(_)));
    }
}
