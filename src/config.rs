//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{RainSensorError, Result};
use crate::osv3::protocol::{
    OSV3_CHANNEL_MAX, OSV3_CHANNEL_MIN, OSV3_PACKET_LEN, PCR800_RAIN_RATE_MAX,
    PCR800_TOTAL_RAIN_MAX,
};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub transmit: TransmitConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sensor identity
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_channel")]
    pub channel: u8,

    #[serde(default = "default_battery_ok")]
    pub battery_ok: bool,

    #[serde(default)]
    pub append_crc: bool,
}

/// Line and power timing
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_half_bit_us")]
    pub half_bit_us: u32,

    #[serde(default = "default_shorten_us")]
    pub shorten_us: u32,

    #[serde(default = "default_power_up_ms")]
    pub power_up_ms: u32,

    #[serde(default = "default_settle_us")]
    pub settle_us: u32,
}

/// Burst scheduling
#[derive(Debug, Deserialize, Clone)]
pub struct TransmitConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

/// Starting gauge readings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReadingConfig {
    /// Rain rate in 0.01 in/hr
    #[serde(default)]
    pub rain_rate: u32,

    /// Total rain in 0.001 in
    #[serde(default)]
    pub total_rain: u32,
}

/// Burst telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Application log output
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily log files; empty logs to stdout
    #[serde(default)]
    pub dir: String,
}

// Default value functions
fn default_channel() -> u8 { 1 }
fn default_battery_ok() -> bool { true }

fn default_half_bit_us() -> u32 { 490 }
fn default_shorten_us() -> u32 { 32 }
fn default_power_up_ms() -> u32 { 60 }
fn default_settle_us() -> u32 { 2000 }

fn default_interval_ms() -> u64 { 47000 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            battery_ok: default_battery_ok(),
            append_crc: false,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            half_bit_us: default_half_bit_us(),
            shorten_us: default_shorten_us(),
            power_up_ms: default_power_up_ms(),
            settle_us: default_settle_us(),
        }
    }
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl TimingConfig {
    /// Upper bound on one burst, from power-on to the end of the last cell
    pub fn burst_duration_us(&self) -> u64 {
        let cells = (OSV3_PACKET_LEN * 8) as u64;
        self.power_up_ms as u64 * 1000 + self.settle_us as u64 + cells * 2 * self.half_bit_us as u64
    }
}

fn invalid(message: impl std::fmt::Display) -> RainSensorError {
    RainSensorError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use osv3_rain_sensor::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if !(OSV3_CHANNEL_MIN..=OSV3_CHANNEL_MAX).contains(&self.sensor.channel) {
            return Err(invalid(format!(
                "channel must be between {} and {}",
                OSV3_CHANNEL_MIN, OSV3_CHANNEL_MAX
            )));
        }

        if self.timing.half_bit_us < 100 || self.timing.half_bit_us > 5000 {
            return Err(invalid("half_bit_us must be between 100 and 5000"));
        }

        if self.timing.shorten_us >= self.timing.half_bit_us {
            return Err(invalid("shorten_us must be less than half_bit_us"));
        }

        if self.timing.power_up_ms > 10000 {
            return Err(invalid("power_up_ms must be at most 10000"));
        }

        if self.timing.settle_us > 100_000 {
            return Err(invalid("settle_us must be at most 100000"));
        }

        if self.transmit.interval_ms < 1000 || self.transmit.interval_ms > 3_600_000 {
            return Err(invalid("interval_ms must be between 1000 and 3600000"));
        }

        if self.transmit.interval_ms * 1000 <= self.timing.burst_duration_us() {
            return Err(invalid(format!(
                "interval_ms must exceed the burst duration of {} us",
                self.timing.burst_duration_us()
            )));
        }

        if self.reading.rain_rate > PCR800_RAIN_RATE_MAX {
            return Err(invalid(format!("rain_rate must be at most {}", PCR800_RAIN_RATE_MAX)));
        }

        if self.reading.total_rain > PCR800_TOTAL_RAIN_MAX {
            return Err(invalid(format!("total_rain must be at most {}", PCR800_TOTAL_RAIN_MAX)));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }
}
