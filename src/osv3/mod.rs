//! # Oregon Scientific v3 Protocol Module
//!
//! Implementation of the OSv3 packet format used by the PCR800 rain gauge.
//!
//! This module handles:
//! - Fixed 15-byte packet layout (preamble, sync, sensor ID, channel, rolling code)
//! - BCD encoding of rain rate and total rain
//! - Nibble checksum and CRC-8 (polynomial 0x07) calculation

pub mod protocol;
pub mod encoder;
pub mod crc;
