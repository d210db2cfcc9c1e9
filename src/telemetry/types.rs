//! Telemetry record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sensor::BurstReport;

/// One transmitted burst
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstRecord {
    pub timestamp: DateTime<Utc>,
    pub channel: u8,
    pub rolling_code: u8,
    /// 0.01 in/hr
    pub rain_rate: u32,
    /// 0.001 in
    pub total_rain: u32,
    /// Packet bytes as uppercase hex
    pub packet: String,
    pub checksum: u8,
    pub crc: u8,
    pub duration_us: u64,
}

impl BurstRecord {
    pub fn from_report(
        timestamp: DateTime<Utc>,
        channel: u8,
        rolling_code: u8,
        rain_rate: u32,
        total_rain: u32,
        report: &BurstReport,
    ) -> Self {
        Self {
            timestamp,
            channel,
            rolling_code,
            rain_rate,
            total_rain,
            packet: report.packet.to_hex(),
            checksum: report.packet.checksum_field(),
            crc: report.crc,
            duration_us: report.duration_us,
        }
    }
}
