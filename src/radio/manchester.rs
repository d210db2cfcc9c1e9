//! # Manchester Line Encoder
//!
//! Clocks packet bytes onto the data line with OSv3 Manchester timing.
//!
//! Each bit is a cell of two half-periods with a transition in the middle:
//!
//! ```text
//!  0-bit:  ____|‾‾‾‾      (off-to-on)
//!  1-bit:  ‾‾‾‾|____      (on-to-off)
//!          <-T-><-T->
//! ```
//!
//! `T` is about 490 us, giving the ~1020 bit/s the base station samples at.
//! Bit start times come from an absolute time base advanced by `T` per
//! half-cell, so sleep overshoot on one bit does not accumulate across the
//! packet.

use tracing::trace;

use super::port_trait::{LineLevel, RadioIo};
use crate::osv3::protocol::Packet;

/// Nominal half-cell period in microseconds
pub const OSV3_HALF_BIT_US: u32 = 490;

/// Default hold shortening for processing overhead, in microseconds
pub const DEFAULT_SHORTEN_US: u32 = 32;

/// Order bits are sent in: high nibble LSB first, then low nibble LSB first
pub const BIT_ORDER: [u8; 8] = [0x10, 0x20, 0x40, 0x80, 0x01, 0x02, 0x04, 0x08];

/// Line timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTiming {
    /// Half-cell period
    pub half_bit_us: u32,
    /// Subtracted from the first half-cell hold; a calibration of the target
    /// hardware, not part of the protocol
    pub shorten_us: u32,
}

impl Default for LineTiming {
    fn default() -> Self {
        Self {
            half_bit_us: OSV3_HALF_BIT_US,
            shorten_us: DEFAULT_SHORTEN_US,
        }
    }
}

impl LineTiming {
    /// How long the first level of a cell is held
    pub fn hold_us(&self) -> u32 {
        self.half_bit_us.saturating_sub(self.shorten_us)
    }
}

/// Manchester encoder with its own absolute time base
#[derive(Debug, Clone)]
pub struct ManchesterEncoder {
    timing: LineTiming,
    base_us: u64,
}

impl ManchesterEncoder {
    /// Create an encoder whose time base starts at `origin_us`
    pub fn new(timing: LineTiming, origin_us: u64) -> Self {
        Self {
            timing,
            base_us: origin_us,
        }
    }

    pub fn timing(&self) -> LineTiming {
        self.timing
    }

    /// Target start time of the next half-cell
    pub fn time_base(&self) -> u64 {
        self.base_us
    }

    /// Encode a whole packet, flagging only its final byte
    pub fn encode_packet<IO: RadioIo + ?Sized>(&mut self, io: &mut IO, packet: &Packet) {
        let bytes = packet.as_bytes();
        for (i, &byte) in bytes.iter().enumerate() {
            self.encode_byte(io, byte, i + 1 == bytes.len());
        }
    }

    /// Encode one byte as 8 Manchester cells in [`BIT_ORDER`]
    ///
    /// When `last_byte` is set and the final cell ends on a rising edge, one
    /// extra half-cell of idle follows before returning.
    pub fn encode_byte<IO: RadioIo + ?Sized>(&mut self, io: &mut IO, byte: u8, last_byte: bool) {
        let half = self.timing.half_bit_us as u64;
        let hold = self.timing.hold_us();

        for (i, &mask) in BIT_ORDER.iter().enumerate() {
            self.base_us += half;
            self.wait_for_base(io);

            if byte & mask == 0 {
                io.set_line(LineLevel::Low);
                io.sleep_micros(hold);
                io.set_line(LineLevel::High);

                if last_byte && i + 1 == BIT_ORDER.len() {
                    io.sleep_micros(self.timing.half_bit_us);
                }
            } else {
                io.set_line(LineLevel::High);
                io.sleep_micros(hold);
                io.set_line(LineLevel::Low);
            }

            self.base_us += half;
        }
    }

    /// Sleep until the time base, or re-anchor it if it is already behind
    ///
    /// A non-positive remaining delay means the line sat idle since the last
    /// burst (or this bit is late); the base restarts from now rather than
    /// trying to catch up.
    fn wait_for_base<IO: RadioIo + ?Sized>(&mut self, io: &mut IO) {
        let now = io.now_micros();

        if self.base_us <= now {
            trace!("Line time base reset ({} us behind)", now - self.base_us);
            self.base_us = now;
        } else {
            let remaining = self.base_us - now;
            io.sleep_micros(u32::try_from(remaining).unwrap_or(u32::MAX));
        }
    }
}
