//! # Error Types
//!
//! Custom error types for the rain sensor using `thiserror`.

use thiserror::Error;

/// Main error type for the rain sensor
#[derive(Debug, Error)]
pub enum RainSensorError {
    /// Channel outside the 1..=15 range the packet nibble can carry
    #[error("Invalid channel {0}: must be between 1 and 15")]
    InvalidChannel(u8),

    /// Rolling code outside 0x01..=0xFE
    #[error("Invalid rolling code 0x{0:02X}: must be between 0x01 and 0xFE")]
    InvalidRollingCode(u8),

    /// Measurement with more decimal digits than its BCD field holds
    #[error("{field} value {value} exceeds maximum {max}")]
    MeasurementOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the rain sensor
pub type Result<T> = std::result::Result<T, RainSensorError>;
