//! # OSv3 Rain Sensor Library
//!
//! Simulate an Oregon Scientific PCR800 rain gauge over a 433MHz OOK transmitter.
//!
//! This library builds OSv3 rain packets (BCD readings, nibble checksum,
//! CRC-8) and clocks them onto a GPIO line with Manchester timing that a
//! real base station will accept.

pub mod config;
pub mod error;
pub mod osv3;
pub mod radio;
pub mod sensor;
pub mod telemetry;
