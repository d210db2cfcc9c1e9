//! Simulated rain gauge readings.
//!
//! Holds a constant rain rate and integrates it into total rain between
//! bursts, the way a tipping-bucket gauge would report a steady shower.

use std::time::Duration;

use crate::osv3::protocol::{PCR800_RAIN_RATE_MAX, PCR800_TOTAL_RAIN_MAX};

/// Total rain wraps here to stay within six BCD digits
const TOTAL_RAIN_WRAP: f64 = (PCR800_TOTAL_RAIN_MAX as f64) + 1.0;

/// 0.01 in/hr over one hour, expressed in 0.001 in
const TOTAL_UNITS_PER_RATE_HOUR: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RainGauge {
    rain_rate: u32,
    total_rain: f64,
}

impl RainGauge {
    /// Create a gauge; values beyond their fields are clamped
    pub fn new(rain_rate: u32, total_rain: u32) -> Self {
        Self {
            rain_rate: rain_rate.min(PCR800_RAIN_RATE_MAX),
            total_rain: total_rain.min(PCR800_TOTAL_RAIN_MAX) as f64,
        }
    }

    /// Rain rate in 0.01 in/hr
    pub fn rain_rate(&self) -> u32 {
        self.rain_rate
    }

    /// Total rain in 0.001 in
    pub fn total_rain(&self) -> u32 {
        self.total_rain as u32
    }

    /// Accumulate rain over `elapsed` at the current rate
    pub fn advance(&mut self, elapsed: Duration) {
        let hours = elapsed.as_secs_f64() / 3600.0;
        let added = self.rain_rate as f64 * TOTAL_UNITS_PER_RATE_HOUR * hours;
        self.total_rain = (self.total_rain + added) % TOTAL_RAIN_WRAP;
    }
}
