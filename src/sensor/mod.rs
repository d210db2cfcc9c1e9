//! # Sensor Module
//!
//! A simulated PCR800 rain gauge bound to one transmitter.
//!
//! This module handles:
//! - Rolling code selection, once per session
//! - Input validation before packets are built
//! - Transmitter power sequencing around each burst
//! - Simulated rain accumulation between bursts

pub mod gauge;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{RainSensorError, Result};
use crate::osv3::crc::ChecksumEngine;
use crate::osv3::encoder::build_packet;
use crate::osv3::protocol::*;
use crate::radio::{LineLevel, LineTiming, ManchesterEncoder, RadioIo};

/// Rolling code bounds; 0x00 and 0xFF are never sent
const ROLLING_CODE_MIN: u8 = 0x01;
const ROLLING_CODE_MAX: u8 = 0xFE;

/// Rolling code identifying one sensor session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingCode(u8);

impl RollingCode {
    /// Use a fixed rolling code, e.g. one persisted from an earlier session
    ///
    /// # Errors
    ///
    /// Returns [`RainSensorError::InvalidRollingCode`] for 0x00 and 0xFF
    pub fn new(value: u8) -> Result<Self> {
        if !(ROLLING_CODE_MIN..=ROLLING_CODE_MAX).contains(&value) {
            return Err(RainSensorError::InvalidRollingCode(value));
        }
        Ok(Self(value))
    }

    /// Draw a rolling code from `rng`; 0xFE is valid but never drawn
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self(rng.random_range(ROLLING_CODE_MIN..ROLLING_CODE_MAX))
    }

    /// Draw a rolling code from a seeded generator
    pub fn from_seed(seed: u64) -> Self {
        Self::generate(&mut StdRng::seed_from_u64(seed))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transmitter powered off
    Idle,
    /// Transmitter powered on and clocking bits
    Transmitting,
}

/// Settings fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSettings {
    pub channel: u8,
    pub battery_ok: bool,
    /// Write the CRC into byte 14 before sending
    pub append_crc: bool,
    pub line: LineTiming,
    /// Wait after power-on before the line is driven
    pub power_up_us: u32,
    /// Wait with the line low before the first bit
    pub settle_us: u32,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            channel: 1,
            battery_ok: true,
            append_crc: false,
            line: LineTiming::default(),
            power_up_us: 60_000,
            settle_us: 2_000,
        }
    }
}

impl SensorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            channel: config.sensor.channel,
            battery_ok: config.sensor.battery_ok,
            append_crc: config.sensor.append_crc,
            line: LineTiming {
                half_bit_us: config.timing.half_bit_us,
                shorten_us: config.timing.shorten_us,
            },
            power_up_us: config.timing.power_up_ms.saturating_mul(1000),
            settle_us: config.timing.settle_us,
        }
    }
}

/// Outcome of one burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstReport {
    pub packet: Packet,
    /// CRC over the packet, whether or not it was written back
    pub crc: u8,
    /// From power-on to power-off
    pub duration_us: u64,
}

/// PCR800 rain gauge session
///
/// Owns the transmitter and the rolling code. Bursts block the calling
/// thread for their whole duration; `&mut self` rules out overlapping sends.
pub struct RainSensor<IO: RadioIo> {
    io: IO,
    settings: SensorSettings,
    rolling_code: RollingCode,
    engine: ChecksumEngine,
    encoder: ManchesterEncoder,
    state: SessionState,
}

impl<IO: RadioIo> std::fmt::Debug for RainSensor<IO> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RainSensor")
            .field("channel", &self.settings.channel)
            .field("rolling_code", &self.rolling_code)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<IO: RadioIo> RainSensor<IO> {
    /// Start a sensor session
    ///
    /// Configures the outputs, powers the transmitter off and draws the
    /// rolling code from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`RainSensorError::InvalidChannel`] if the channel is outside 1..=15
    ///
    /// # Examples
    ///
    /// ```
    /// use osv3_rain_sensor::radio::HostRadio;
    /// use osv3_rain_sensor::sensor::{RainSensor, SensorSettings};
    ///
    /// let settings = SensorSettings { channel: 3, ..SensorSettings::default() };
    /// let sensor = RainSensor::new(HostRadio::new(), settings, &mut rand::rng())?;
    /// assert_eq!(sensor.channel(), 3);
    /// # Ok::<(), osv3_rain_sensor::error::RainSensorError>(())
    /// ```
    pub fn new<R: Rng>(io: IO, settings: SensorSettings, rng: &mut R) -> Result<Self> {
        Self::with_rolling_code(io, settings, RollingCode::generate(rng))
    }

    /// Start a sensor session with a known rolling code
    pub fn with_rolling_code(mut io: IO, settings: SensorSettings, rolling_code: RollingCode) -> Result<Self> {
        if !(OSV3_CHANNEL_MIN..=OSV3_CHANNEL_MAX).contains(&settings.channel) {
            return Err(RainSensorError::InvalidChannel(settings.channel));
        }

        io.configure();
        io.set_power(false);
        let origin_us = io.now_micros();

        info!(
            "PCR800 sensor on channel {} with rolling code 0x{:02X}",
            settings.channel,
            rolling_code.value()
        );

        Ok(Self {
            io,
            settings,
            rolling_code,
            engine: ChecksumEngine::new(),
            encoder: ManchesterEncoder::new(settings.line, origin_us),
            state: SessionState::Idle,
        })
    }

    pub fn channel(&self) -> u8 {
        self.settings.channel
    }

    pub fn rolling_code(&self) -> RollingCode {
        self.rolling_code
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Build the packet for a reading without sending it
    pub fn packet_for(&self, rain_rate: u32, total_rain: u32) -> Packet {
        let mut packet = build_packet(
            &self.engine,
            self.settings.channel,
            self.rolling_code.value(),
            self.settings.battery_ok,
            rain_rate,
            total_rain,
        );
        if self.settings.append_crc {
            packet.set_crc(self.engine.crc8(&packet));
        }
        packet
    }

    /// Transmit one reading
    ///
    /// Powers the transmitter, waits for it to stabilise, sends the packet
    /// and powers down again with the line low.
    ///
    /// # Arguments
    ///
    /// * `rain_rate` - Rain rate in 0.01 in/hr (0 to 9999)
    /// * `total_rain` - Total rain in 0.001 in (0 to 999999)
    ///
    /// # Errors
    ///
    /// Returns [`RainSensorError::MeasurementOutOfRange`] if a value has more
    /// digits than its packet field. Nothing is transmitted in that case.
    pub fn send(&mut self, rain_rate: u32, total_rain: u32) -> Result<BurstReport> {
        check_range("rain_rate", rain_rate, PCR800_RAIN_RATE_MAX)?;
        check_range("total_rain", total_rain, PCR800_TOTAL_RAIN_MAX)?;

        let packet = self.packet_for(rain_rate, total_rain);
        let crc = self.engine.crc8(&packet);

        self.state = SessionState::Transmitting;
        let started_us = self.io.now_micros();
        self.io.set_power(true);
        self.io.sleep_micros(self.settings.power_up_us);

        self.io.set_line(LineLevel::Low);
        self.io.sleep_micros(self.settings.settle_us);

        self.encoder.encode_packet(&mut self.io, &packet);

        self.io.set_power(false);
        self.io.set_line(LineLevel::Low);
        let duration_us = self.io.now_micros().saturating_sub(started_us);
        self.state = SessionState::Idle;

        debug!(
            "Sent PCR800 packet {} (rate {}, total {}) in {} us",
            packet.to_hex(),
            rain_rate,
            total_rain,
            duration_us
        );

        Ok(BurstReport {
            packet,
            crc,
            duration_us,
        })
    }
}

fn check_range(field: &'static str, value: u32, max: u32) -> Result<()> {
    if value > max {
        return Err(RainSensorError::MeasurementOutOfRange { field, value, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::port_trait::mocks::{SimEvent, SimRadio};
    use crate::radio::port_trait::MockRadioIo;
    use mockall::predicate::eq;
    use mockall::Sequence;

    const T: u64 = 490;
    const HOLD: u64 = 458;

    fn settings(channel: u8) -> SensorSettings {
        SensorSettings {
            channel,
            ..SensorSettings::default()
        }
    }

    fn sensor(radio: &SimRadio) -> RainSensor<SimRadio> {
        RainSensor::with_rolling_code(radio.clone(), settings(3), RollingCode(0x5A)).unwrap()
    }

    #[test]
    fn test_rolling_code_range() {
        for seed in 0..2000 {
            let code = RollingCode::from_seed(seed).value();
            assert!((1..=253).contains(&code), "seed {} gave 0x{:02X}", seed, code);
        }
    }

    #[test]
    fn test_rolling_code_depends_on_seed() {
        assert_eq!(RollingCode::from_seed(42), RollingCode::from_seed(42));

        let distinct: std::collections::HashSet<u8> =
            (0..64).map(|seed| RollingCode::from_seed(seed).value()).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_invalid_channel_rejected() {
        for channel in [0, 16, 255] {
            let result = RainSensor::with_rolling_code(SimRadio::new(), settings(channel), RollingCode(1));
            assert!(matches!(result, Err(RainSensorError::InvalidChannel(c)) if c == channel));
        }
    }

    #[test]
    fn test_invalid_rolling_code_rejected() {
        for code in [0x00, 0xFF] {
            assert!(matches!(
                RollingCode::new(code),
                Err(RainSensorError::InvalidRollingCode(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_fixed_rolling_code_on_air() {
        for code in [0x01, 0x5A, 0xFE] {
            let radio = SimRadio::new();
            let rolling_code = RollingCode::new(code).unwrap();
            let mut sensor = RainSensor::with_rolling_code(radio, settings(3), rolling_code).unwrap();

            let report = sensor.send(0, 0).unwrap();
            assert_eq!(report.packet.as_bytes()[ROLLING_CODE_INDEX], code);
        }
    }

    #[test]
    fn test_construction_configures_and_powers_off() {
        let mut io = MockRadioIo::new();
        let mut seq = Sequence::new();
        io.expect_configure().times(1).in_sequence(&mut seq).return_const(());
        io.expect_set_power()
            .with(eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        io.expect_now_micros().times(1).in_sequence(&mut seq).return_const(0u64);

        let sensor = RainSensor::new(io, settings(5), &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(sensor.state(), SessionState::Idle);
        assert_eq!(sensor.rolling_code(), RollingCode::from_seed(7));
    }

    #[test]
    fn test_out_of_range_reading_sends_nothing() {
        let mut io = MockRadioIo::new();
        io.expect_configure().return_const(());
        // Only the power-off at construction
        io.expect_set_power().times(1).return_const(());
        io.expect_now_micros().times(1).return_const(0u64);
        let mut sensor = RainSensor::with_rolling_code(io, settings(1), RollingCode::new(9).unwrap()).unwrap();

        let err = sensor.send(10_000, 0).unwrap_err();
        assert!(matches!(
            err,
            RainSensorError::MeasurementOutOfRange { field: "rain_rate", value: 10_000, max: 9_999 }
        ));

        let err = sensor.send(0, 1_000_000).unwrap_err();
        assert!(matches!(err, RainSensorError::MeasurementOutOfRange { field: "total_rain", .. }));
        assert_eq!(sensor.state(), SessionState::Idle);
    }

    #[test]
    fn test_send_golden_packet() {
        let radio = SimRadio::new();
        let mut sensor = sensor(&radio);

        let report = sensor.send(123, 4567).unwrap();
        assert_eq!(
            report.packet.as_bytes(),
            &[0xFF, 0xFF, 0xFF, 0xA2, 0x91, 0x43, 0x5A, 0x83, 0x21, 0x07, 0x65, 0x40, 0x06, 0x40, 0x00]
        );
        assert_eq!(report.crc, ChecksumEngine::new().crc8(&report.packet));
        assert_eq!(sensor.state(), SessionState::Idle);
    }

    #[test]
    fn test_send_power_sequence() {
        let radio = SimRadio::new();
        let mut sensor = sensor(&radio);
        radio.clear();
        radio.advance(1_000_000);

        let report = sensor.send(0, 0).unwrap();
        let events = radio.events();

        // Power on, line low after power-up, first bit after settle
        assert_eq!(events[0], SimEvent::Power { at_us: 1_000_000, on: true });
        assert_eq!(events[1], SimEvent::Line { at_us: 1_060_000, level: LineLevel::Low });
        let first_bit = match events[2] {
            SimEvent::Line { at_us, .. } => at_us,
            other => panic!("Expected line event, got {:?}", other),
        };
        assert_eq!(first_bit, 1_062_000);

        // Power off, then line forced low
        let n = events.len();
        let end = 1_062_000 + 119 * 2 * T + HOLD + T;
        assert_eq!(events[n - 2], SimEvent::Power { at_us: end, on: false });
        assert_eq!(events[n - 1], SimEvent::Line { at_us: end, level: LineLevel::Low });

        assert_eq!(report.duration_us, 60_000 + 2_000 + 119 * 2 * T + HOLD + T);
        assert_eq!(radio.line_events().len(), 1 + 240 + 1);
    }

    #[test]
    fn test_rolling_code_constant_across_sends() {
        let radio = SimRadio::new();
        let mut sensor = RainSensor::new(radio.clone(), settings(2), &mut StdRng::seed_from_u64(99)).unwrap();
        let code = sensor.rolling_code();

        let first = sensor.send(10, 100).unwrap();
        radio.advance(47_000_000);
        let second = sensor.send(20, 200).unwrap();

        assert_eq!(sensor.rolling_code(), code);
        assert_eq!(first.packet.as_bytes()[ROLLING_CODE_INDEX], code.value());
        assert_eq!(second.packet.as_bytes()[ROLLING_CODE_INDEX], code.value());
    }

    #[test]
    fn test_repeated_sends_identical_timing() {
        let radio = SimRadio::new();
        let mut sensor = sensor(&radio);

        let mut runs = Vec::new();
        for _ in 0..2 {
            radio.clear();
            radio.advance(47_000_000);
            let start = radio.now();
            sensor.send(55, 1_234).unwrap();
            let relative: Vec<(u64, LineLevel)> =
                radio.line_events().iter().map(|&(t, l)| (t - start, l)).collect();
            runs.push(relative);
        }

        assert_eq!(runs[0], runs[1]);
    }

    #[test]
    fn test_append_crc() {
        let radio = SimRadio::new();
        let settings = SensorSettings {
            append_crc: true,
            ..settings(3)
        };
        let mut sensor = RainSensor::with_rolling_code(radio, settings, RollingCode(0x5A)).unwrap();

        let report = sensor.send(123, 4567).unwrap();
        assert_eq!(report.packet.crc_field(), report.crc);
        // The checksum does not cover byte 14
        assert_eq!(report.packet.checksum_field(), 0x46);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.sensor.channel = 7;
        config.sensor.append_crc = true;
        config.timing.shorten_us = 20;
        config.timing.power_up_ms = 80;

        let settings = SensorSettings::from_config(&config);
        assert_eq!(settings.channel, 7);
        assert!(settings.append_crc);
        assert_eq!(settings.line.half_bit_us, 490);
        assert_eq!(settings.line.shorten_us, 20);
        assert_eq!(settings.power_up_us, 80_000);
        assert_eq!(settings.settle_us, 2_000);
        assert_eq!(SensorSettings::from_config(&Config::default()), SensorSettings::default());
    }
}
