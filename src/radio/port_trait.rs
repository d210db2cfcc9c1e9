//! Trait abstraction for transmitter pin and timing operations to enable testing

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Logic level of the transmitter data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    /// Carrier off
    Low,
    /// Carrier on
    High,
}

/// Trait for the transmitter's hardware I/O
///
/// Operations are treated as infallible; implementations log and swallow
/// pin errors.
#[cfg_attr(test, mockall::automock)]
pub trait RadioIo {
    /// One-time pin mode setup, called when a sensor session is created
    fn configure(&mut self) {}

    /// Drive the data line
    fn set_line(&mut self, level: LineLevel);

    /// Switch transmitter power
    fn set_power(&mut self, on: bool);

    /// Block for `us` microseconds
    fn sleep_micros(&mut self, us: u32);

    /// Monotonic microsecond clock
    fn now_micros(&mut self) -> u64;
}

/// Host-side radio backed by the OS clock
///
/// Tracks line and power state without driving hardware. Used for dry runs
/// where the timing loop runs for real but nothing is radiated.
#[derive(Debug)]
pub struct HostRadio {
    epoch: Instant,
    line: LineLevel,
    powered: bool,
    transitions: u64,
}

impl Default for HostRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRadio {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            line: LineLevel::Low,
            powered: false,
            transitions: 0,
        }
    }

    /// Current data line level
    pub fn line(&self) -> LineLevel {
        self.line
    }

    /// Whether the transmitter is powered
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Number of line level changes since creation
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}

impl RadioIo for HostRadio {
    fn set_line(&mut self, level: LineLevel) {
        if level != self.line {
            self.transitions += 1;
        }
        self.line = level;
    }

    fn set_power(&mut self, on: bool) {
        debug!("Transmitter power {}", if on { "on" } else { "off" });
        self.powered = on;
    }

    fn sleep_micros(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }

    fn now_micros(&mut self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}

/// Radio over `embedded-hal` output pins and delay
///
/// `clock` must return a monotonic microsecond count; `embedded-hal` has no
/// clock trait, so the caller supplies one from its timer peripheral.
pub struct HalRadio<TX, PWR, D, C> {
    data_pin: TX,
    power_pin: PWR,
    delay: D,
    clock: C,
}

impl<TX, PWR, D, C> std::fmt::Debug for HalRadio<TX, PWR, D, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HalRadio").finish_non_exhaustive()
    }
}

impl<TX, PWR, D, C> HalRadio<TX, PWR, D, C>
where
    TX: OutputPin,
    PWR: OutputPin,
    D: DelayNs,
    C: FnMut() -> u64,
{
    pub fn new(data_pin: TX, power_pin: PWR, delay: D, clock: C) -> Self {
        Self {
            data_pin,
            power_pin,
            delay,
            clock,
        }
    }

    /// Release the pins and delay
    pub fn release(self) -> (TX, PWR, D) {
        (self.data_pin, self.power_pin, self.delay)
    }
}

impl<TX, PWR, D, C> RadioIo for HalRadio<TX, PWR, D, C>
where
    TX: OutputPin,
    PWR: OutputPin,
    D: DelayNs,
    C: FnMut() -> u64,
{
    fn configure(&mut self) {
        self.set_line(LineLevel::Low);
    }

    fn set_line(&mut self, level: LineLevel) {
        let result = match level {
            LineLevel::Low => self.data_pin.set_low(),
            LineLevel::High => self.data_pin.set_high(),
        };
        if let Err(e) = result {
            warn!("Failed to drive data pin {:?}: {:?}", level, e);
        }
    }

    fn set_power(&mut self, on: bool) {
        let result = if on {
            self.power_pin.set_high()
        } else {
            self.power_pin.set_low()
        };
        if let Err(e) = result {
            warn!("Failed to switch transmitter power: {:?}", e);
        }
    }

    fn sleep_micros(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn now_micros(&mut self) -> u64 {
        (self.clock)()
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Something the simulated radio was asked to do, stamped with the clock
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SimEvent {
        Configure { at_us: u64 },
        Line { at_us: u64, level: LineLevel },
        Power { at_us: u64, on: bool },
    }

    #[derive(Debug, Default)]
    struct SimState {
        now_us: u64,
        events: Vec<SimEvent>,
    }

    /// Radio with a simulated clock
    ///
    /// Sleeping advances the clock exactly; everything else takes zero time.
    #[derive(Clone, Default)]
    pub struct SimRadio {
        state: Arc<Mutex<SimState>>,
    }

    impl SimRadio {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn starting_at(now_us: u64) -> Self {
            let radio = Self::new();
            radio.state.lock().unwrap().now_us = now_us;
            radio
        }

        /// Let time pass outside of any burst
        pub fn advance(&self, us: u64) {
            self.state.lock().unwrap().now_us += us;
        }

        pub fn now(&self) -> u64 {
            self.state.lock().unwrap().now_us
        }

        pub fn events(&self) -> Vec<SimEvent> {
            self.state.lock().unwrap().events.clone()
        }

        pub fn clear(&self) {
            self.state.lock().unwrap().events.clear();
        }

        /// Data line changes as `(timestamp, level)`
        pub fn line_events(&self) -> Vec<(u64, LineLevel)> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    SimEvent::Line { at_us, level } => Some((at_us, level)),
                    _ => None,
                })
                .collect()
        }

        /// Power changes as `(timestamp, on)`
        pub fn power_events(&self) -> Vec<(u64, bool)> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    SimEvent::Power { at_us, on } => Some((at_us, on)),
                    _ => None,
                })
                .collect()
        }
    }

    impl RadioIo for SimRadio {
        fn configure(&mut self) {
            let mut state = self.state.lock().unwrap();
            let at_us = state.now_us;
            state.events.push(SimEvent::Configure { at_us });
        }

        fn set_line(&mut self, level: LineLevel) {
            let mut state = self.state.lock().unwrap();
            let at_us = state.now_us;
            state.events.push(SimEvent::Line { at_us, level });
        }

        fn set_power(&mut self, on: bool) {
            let mut state = self.state.lock().unwrap();
            let at_us = state.now_us;
            state.events.push(SimEvent::Power { at_us, on });
        }

        fn sleep_micros(&mut self, us: u32) {
            self.state.lock().unwrap().now_us += us as u64;
        }

        fn now_micros(&mut self) -> u64 {
            self.state.lock().unwrap().now_us
        }
    }
}
