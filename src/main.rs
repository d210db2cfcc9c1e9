//! # OSv3 Rain Sensor
//!
//! Simulate an Oregon Scientific PCR800 rain gauge over a 433MHz OOK transmitter.
//!
//! The application loads its configuration, starts a sensor session with a
//! fresh rolling code, and transmits the simulated gauge reading at a fixed
//! interval until interrupted.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::{interval, Duration, Instant};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use osv3_rain_sensor::config::{Config, LoggingConfig};
use osv3_rain_sensor::radio::HostRadio;
use osv3_rain_sensor::sensor::gauge::RainGauge;
use osv3_rain_sensor::sensor::{RainSensor, SensorSettings};
use osv3_rain_sensor::telemetry::{BurstLogger, BurstRecord};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for daily application logs
const LOG_FILE_NAME: &str = "osv3-rain-sensor.log";

/// Number of bursts between status log messages
const LOG_INTERVAL_BURSTS: u64 = 10;

/// Main entry point for the rain sensor application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Start a sensor session with a rolling code from the OS RNG
///
/// 2. **Main Loop**
///    - Every `interval_ms`, advance the gauge and transmit one burst
///    - Append a telemetry record per burst when enabled
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid or the telemetry directory
/// cannot be created
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let (config, loaded) = load_config(&config_path)?;

    let _log_guard = init_logging(&config.logging);

    info!("OSv3 Rain Sensor v{} starting...", env!("CARGO_PKG_VERSION"));
    if loaded {
        info!("Loaded configuration from {}", config_path);
    } else {
        warn!("No configuration at {}, using defaults", config_path);
    }

    let settings = SensorSettings::from_config(&config);
    let mut sensor = RainSensor::new(HostRadio::new(), settings, &mut rand::rng())?;
    let mut gauge = RainGauge::new(config.reading.rain_rate, config.reading.total_rain);

    let mut telemetry = if config.telemetry.enabled {
        info!("Writing burst telemetry to {}", config.telemetry.log_dir);
        Some(BurstLogger::from_config(&config.telemetry)?)
    } else {
        None
    };

    let mut burst_interval = interval(Duration::from_millis(config.transmit.interval_ms));
    info!("Transmitting every {} ms on channel {}", config.transmit.interval_ms, sensor.channel());
    info!("Press Ctrl+C to exit");

    let mut last_tick: Option<Instant> = None;
    let mut burst_count: u64 = 0;

    loop {
        tokio::select! {
            tick = burst_interval.tick() => {
                if let Some(previous) = last_tick {
                    gauge.advance(tick.duration_since(previous));
                }
                last_tick = Some(tick);

                let rain_rate = gauge.rain_rate();
                let total_rain = gauge.total_rain();

                // Bursts busy-wait on the line timing; keep them off the async workers
                let report = match tokio::task::block_in_place(|| sensor.send(rain_rate, total_rain)) {
                    Ok(report) => report,
                    Err(e) => {
                        warn!("Failed to send burst: {}", e);
                        continue;
                    }
                };
                burst_count += 1;

                if let Some(logger) = telemetry.as_mut() {
                    let record = BurstRecord::from_report(
                        Utc::now(),
                        sensor.channel(),
                        sensor.rolling_code().value(),
                        rain_rate,
                        total_rain,
                        &report,
                    );
                    if let Err(e) = logger.log(&record) {
                        warn!("Failed to write burst telemetry: {}", e);
                    }
                }

                if burst_count % LOG_INTERVAL_BURSTS == 1 {
                    info!(
                        "Sent {} bursts (rate {}, total {}, last burst {} us)",
                        burst_count, rain_rate, total_rain, report.duration_us
                    );
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total bursts sent: {}", burst_count);
                break;
            }
        }
    }

    Ok(())
}

/// Load the configuration, falling back to defaults when the file is absent
///
/// Returns the configuration and whether it came from the file.
fn load_config(path: &str) -> Result<(Config, bool)> {
    if !Path::new(path).exists() {
        return Ok((Config::default(), false));
    }

    let config = Config::load(path).with_context(|| format!("Failed to load {}", path))?;
    Ok((config, true))
}

/// Initialize tracing to stdout, or to a daily file when a directory is set
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if config.dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_config_uses_defaults() {
        let (config, loaded) = load_config("/nonexistent/osv3/default.toml").unwrap();
        assert!(!loaded);
        assert_eq!(config.sensor.channel, 1);
        assert_eq!(config.transmit.interval_ms, 47000);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[sensor]\nchannel = 0\n").unwrap();
        file.flush().unwrap();

        let path = file.path().to_string_lossy().into_owned();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/", "config/default.toml");
        let (config, loaded) = load_config(path).unwrap();
        assert!(loaded);
        assert!(!config.telemetry.enabled);
        assert!(config.logging.dir.is_empty());
    }
}
