//! # PCR800 Packet Encoder
//!
//! Builds OSv3 rain gauge packets from channel, rolling code and readings.

use super::crc::ChecksumEngine;
use super::protocol::*;

/// Build a complete PCR800 packet
///
/// # Arguments
///
/// * `engine` - Checksum engine used to fill the checksum nibbles
/// * `channel` - Channel 1 thru 15 (OR-ed into its nibble without masking)
/// * `rolling_code` - Session rolling code
/// * `battery_ok` - Battery-good flag (bit 7 of the flags byte)
/// * `rain_rate` - Rain rate in 0.01 in/hr (4 digits, higher digits dropped)
/// * `total_rain` - Total rain in 0.001 in (6 digits, higher digits dropped)
///
/// # Returns
///
/// * `Packet` - 15-byte packet ready for line encoding. Byte 14 is left zero;
///   see [`Packet::set_crc`].
///
/// # Examples
///
/// ```
/// use osv3_rain_sensor::osv3::crc::ChecksumEngine;
/// use osv3_rain_sensor::osv3::encoder::build_packet;
///
/// let engine = ChecksumEngine::new();
/// let packet = build_packet(&engine, 3, 0x5A, true, 123, 4567);
/// assert_eq!(packet.as_bytes()[..4], [0xFF, 0xFF, 0xFF, 0xA2]);
/// ```
pub fn build_packet(
    engine: &ChecksumEngine,
    channel: u8,
    rolling_code: u8,
    battery_ok: bool,
    rain_rate: u32,
    total_rain: u32,
) -> Packet {
    let mut packet = Packet::from_bytes([0u8; OSV3_PACKET_LEN]);
    let bytes = packet.bytes_mut();

    bytes[..OSV3_PREAMBLE_LEN].fill(OSV3_PREAMBLE_BYTE);
    bytes[SYNC_INDEX] = OSV3_SYNC_NIBBLE | PCR800_TYPE_TAG;

    bytes[ID_INDEX] = PCR800_ID_BYTE;
    bytes[CHANNEL_INDEX] = PCR800_ID_NIBBLE | channel;
    bytes[ROLLING_CODE_INDEX] = rolling_code;

    // The flags nibble and the first rain rate digit share byte 7
    let flags = if battery_ok { OSV3_FLAG_BATTERY_OK } else { 0 };
    bytes[FLAGS_INDEX] = flags | bcd_digit(rain_rate, 0);
    bytes[8] = (bcd_digit(rain_rate, 1) << 4) | bcd_digit(rain_rate, 2);
    bytes[9] = (bcd_digit(rain_rate, 3) << 4) | bcd_digit(total_rain, 0);
    bytes[10] = (bcd_digit(total_rain, 1) << 4) | bcd_digit(total_rain, 2);
    bytes[11] = (bcd_digit(total_rain, 3) << 4) | bcd_digit(total_rain, 4);
    bytes[CHECKSUM_LOW_INDEX] = bcd_digit(total_rain, 5) << 4;

    let checksum = engine.checksum(&packet);
    let bytes = packet.bytes_mut();
    bytes[CHECKSUM_LOW_INDEX] |= checksum & 0x0F;
    bytes[CHECKSUM_HIGH_INDEX] = checksum & 0xF0;

    packet
}

/// Decimal digit `position` of `value` (0 = least significant)
pub fn bcd_digit(value: u32, position: u32) -> u8 {
    match 10u32.checked_pow(position) {
        Some(divisor) => ((value / divisor) % 10) as u8,
        None => 0,
    }
}
