//! # Radio Module
//!
//! Drives the 433MHz OOK transmitter.
//!
//! This module handles:
//! - Hardware abstraction for the data line, power switch and clock
//! - Manchester encoding with absolute-time-base bit scheduling
//! - Host and `embedded-hal` implementations of the hardware trait

pub mod manchester;
pub mod port_trait;

pub use manchester::{LineTiming, ManchesterEncoder};
pub use port_trait::{HalRadio, HostRadio, LineLevel, RadioIo};
