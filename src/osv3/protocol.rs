//! # OSv3 Protocol Constants and Types
//!
//! Core definitions for the PCR800 rain gauge packet.
//!
//! Nibbles go on air LSB first. The layout below is what the base station's
//! decoder expects; every field sits at a fixed offset.
//!
//! ```text
//! Byte  0..=2 : FF FF FF          preamble (24 one-bits)
//! Byte  3     : A | 2             sync nibble | sensor type tag
//! Byte  4     : 91                sensor ID
//! Byte  5     : 4 | channel       sensor ID | channel
//! Byte  6     : rolling code
//! Byte  7     : flags | rate[0]   battery flag (bit 7) | rain rate digit 0
//! Byte  8     : rate[1] | rate[2]
//! Byte  9     : rate[3] | total[0]
//! Byte 10     : total[1] | total[2]
//! Byte 11     : total[3] | total[4]
//! Byte 12     : total[5] | checksum low nibble
//! Byte 13     : checksum high nibble | 0
//! Byte 14     : 0 (or CRC when written back)
//! ```

/// Total packet length in bytes (30 nibbles)
pub const OSV3_PACKET_LEN: usize = 15;

/// Preamble byte (all bits set)
pub const OSV3_PREAMBLE_BYTE: u8 = 0xFF;

/// Number of preamble bytes (24 one-bits for v3 sensors)
pub const OSV3_PREAMBLE_LEN: usize = 3;

/// Sync nibble in the high half of byte 3
pub const OSV3_SYNC_NIBBLE: u8 = 0xA0;

/// Sensor type tag in the low half of byte 3
pub const PCR800_TYPE_TAG: u8 = 0x02;

/// Sensor ID byte at index 4
pub const PCR800_ID_BYTE: u8 = 0x91;

/// Sensor ID nibble in the high half of byte 5
pub const PCR800_ID_NIBBLE: u8 = 0x40;

/// Battery-good flag in the flags byte
pub const OSV3_FLAG_BATTERY_OK: u8 = 0x80;

/// Byte offsets of the packet fields
pub const SYNC_INDEX: usize = 3;
pub const ID_INDEX: usize = 4;
pub const CHANNEL_INDEX: usize = 5;
pub const ROLLING_CODE_INDEX: usize = 6;
pub const FLAGS_INDEX: usize = 7;
pub const CHECKSUM_LOW_INDEX: usize = 12;
pub const CHECKSUM_HIGH_INDEX: usize = 13;
pub const CRC_INDEX: usize = 14;

/// Channel range that fits the channel nibble
pub const OSV3_CHANNEL_MIN: u8 = 1;
pub const OSV3_CHANNEL_MAX: u8 = 15;

/// Rain rate range (4 BCD digits, 0.01 in/hr)
pub const PCR800_RAIN_RATE_MAX: u32 = 9_999;

/// Total rain range (6 BCD digits, 0.001 in)
pub const PCR800_TOTAL_RAIN_MAX: u32 = 999_999;

/// A complete, fixed-length OSv3 packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    bytes: [u8; OSV3_PACKET_LEN],
}

impl Packet {
    /// Wrap raw packet bytes
    pub fn from_bytes(bytes: [u8; OSV3_PACKET_LEN]) -> Self {
        Self { bytes }
    }

    /// Packet bytes in transmission order
    pub fn as_bytes(&self) -> &[u8; OSV3_PACKET_LEN] {
        &self.bytes
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8; OSV3_PACKET_LEN] {
        &mut self.bytes
    }

    /// Checksum as stored in the packet
    ///
    /// Reassembled from the low nibble of byte 12 and the high nibble of byte 13.
    pub fn checksum_field(&self) -> u8 {
        (self.bytes[CHECKSUM_HIGH_INDEX] & 0xF0) | (self.bytes[CHECKSUM_LOW_INDEX] & 0x0F)
    }

    /// Byte 14, where a CRC lands when the caller writes it back
    pub fn crc_field(&self) -> u8 {
        self.bytes[CRC_INDEX]
    }

    /// Write a CRC into byte 14
    ///
    /// The reference sensor leaves this byte zero; writing the CRC is opt-in.
    pub fn set_crc(&mut self, crc: u8) {
        self.bytes[CRC_INDEX] = crc;
    }

    /// Uppercase hex rendering, two digits per byte
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }
}
