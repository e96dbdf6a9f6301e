//! # Error Types
//!
//! Custom error types for Padwatch using `thiserror`.

use thiserror::Error;

use crate::source::SourceError;

/// Main error type for Padwatch
#[derive(Debug, Error)]
pub enum PadwatchError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A raw device query failed
    #[error("Device query failed: {0}")]
    Source(#[from] SourceError),

    /// Battery level code outside the known table
    #[error("Unknown battery level code: {0:#04x}")]
    UnknownBatteryLevel(u8),

    /// Battery type code outside the known table
    #[error("Unknown battery type code: {0:#04x}")]
    UnknownBatteryType(u8),

    /// Device subtype code outside the known table
    #[error("Unknown device subtype code: {0:#04x}")]
    UnknownDeviceSubtype(u8),

    /// Sessions need a tokio runtime to spawn their observation loop
    #[error("No tokio runtime available to run the observation loop")]
    NoRuntime,

    /// No gamepad device found by the backend
    #[error("No gamepad found")]
    ControllerNotFound,
}

/// Result type alias for Padwatch
pub type Result<T> = std::result::Result<T, PadwatchError>;
