//! Hardware and clock collaborators
//!
//! The core never touches pins directly. Everything it needs from the board is
//! expressed by [`Hal`] and [`Clock`], both synchronous and infallible.
//! [`ScriptedHal`] is an in-memory board used by tests and the replay tool.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Electrical mode of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    Input,
    InputPullup,
    Output,
}

/// Synchronous pin access. No read is assumed to be debounced.
pub trait Hal {
    /// Digital level, 0 or 1
    fn read_digital(&mut self, pin: u8) -> u8;
    /// Raw ADC count (0..4095 on a 12-bit converter)
    fn read_analog(&mut self, pin: u8) -> u16;
    /// Raw capacitive reading
    fn read_touch_raw(&mut self, pin: u8) -> u16;
    fn set_pin_mode(&mut self, pin: u8, mode: PinMode);
    fn write_digital(&mut self, pin: u8, level: u8);
    /// Busy-wait used for multiplexer settling
    fn delay_micros(&mut self, micros: u32);
}

/// Monotonic millisecond counter. Allowed to wrap.
pub trait Clock {
    fn now_millis(&self) -> u32;
}

/// Milliseconds from `since` to `now`, correct across counter wraparound
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start_instant: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start_instant: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u32 {
        wrapping_millis(self.start_instant.elapsed())
    }
}

/// Milliseconds in `elapsed`, wrapping every 2^32 ms
fn wrapping_millis(elapsed: Duration) -> u32 {
    // Truncation is the wraparound
    elapsed.as_millis() as u32
}

/// Multiplexer wiring for one signal pin
#[derive(Debug, Clone)]
struct MuxWiring {
    select_pins: Vec<u8>,
    /// Level seen on the signal pin for each channel
    channels: HashMap<u8, u8>,
}

/// In-memory board: pins hold whatever the script last set
///
/// Digital pins default to 1 (pulled up, nothing pressed). Writes and pin
/// modes are recorded for inspection.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHal {
    digital: HashMap<u8, u8>,
    analog: HashMap<u8, u16>,
    touch: HashMap<u8, u16>,
    muxes: HashMap<u8, MuxWiring>,
    modes: HashMap<u8, PinMode>,
    writes: Vec<(u8, u8)>,
    delayed_micros: u64,
}

impl ScriptedHal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_digital(&mut self, pin: u8, level: u8) {
        self.digital.insert(pin, level.min(1));
    }

    pub fn set_analog(&mut self, pin: u8, value: u16) {
        self.analog.insert(pin, value);
    }

    pub fn set_touch(&mut self, pin: u8, value: u16) {
        self.touch.insert(pin, value);
    }

    /// Declare a multiplexer whose output drives `signal_pin`
    pub fn wire_mux(&mut self, signal_pin: u8, select_pins: &[u8]) {
        self.muxes.insert(
            signal_pin,
            MuxWiring {
                select_pins: select_pins.to_vec(),
                channels: HashMap::new(),
            },
        );
    }

    /// Level presented on a mux channel; ignored if the mux is not wired
    pub fn set_mux_channel(&mut self, signal_pin: u8, channel: u8, level: u8) {
        if let Some(mux) = self.muxes.get_mut(&signal_pin) {
            mux.channels.insert(channel, level.min(1));
        }
    }

    pub fn pin_mode(&self, pin: u8) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    /// Every `write_digital` call so far, in order
    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }

    pub fn delayed_micros(&self) -> u64 {
        self.delayed_micros
    }

    fn selected_channel(&self, mux: &MuxWiring) -> u8 {
        mux.select_pins
            .iter()
            .enumerate()
            .fold(0u8, |channel, (bit, pin)| {
                let level = self.digital.get(pin).copied().unwrap_or(0);
                channel | (level << bit)
            })
    }
}

impl Hal for ScriptedHal {
    fn read_digital(&mut self, pin: u8) -> u8 {
        if let Some(mux) = self.muxes.get(&pin) {
            let channel = self.selected_channel(mux);
            return mux.channels.get(&channel).copied().unwrap_or(1);
        }
        self.digital.get(&pin).copied().unwrap_or(1)
    }

    fn read_analog(&mut self, pin: u8) -> u16 {
        self.analog.get(&pin).copied().unwrap_or(0)
    }

    fn read_touch_raw(&mut self, pin: u8) -> u16 {
        self.touch.get(&pin).copied().unwrap_or(0)
    }

    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) {
        self.modes.insert(pin, mode);
    }

    fn write_digital(&mut self, pin: u8, level: u8) {
        self.writes.push((pin, level));
        self.digital.insert(pin, level.min(1));
    }

    fn delay_micros(&mut self, micros: u32) {
        self.delayed_micros += u64::from(micros);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_across_wraparound() {
        assert_eq!(elapsed_ms(100, 40), 60);
        assert_eq!(elapsed_ms(5, u32::MAX - 4), 10);
        assert_eq!(elapsed_ms(0, u32::MAX), 1);
    }

    #[test]
    fn test_system_clock_wraps() {
        assert_eq!(wrapping_millis(Duration::from_millis(1500)), 1500);
        let past_wrap = Duration::from_millis(u64::from(u32::MAX) + 6);
        assert_eq!(wrapping_millis(past_wrap), 5);

        let clock = SystemClock::new();
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert!(elapsed_ms(second, first) < 1000);
    }

    #[test]
    fn test_digital_defaults_to_pulled_up() {
        let mut hal = ScriptedHal::new();
        assert_eq!(hal.read_digital(3), 1);

        hal.set_digital(3, 0);
        assert_eq!(hal.read_digital(3), 0);
    }

    #[test]
    fn test_mux_follows_select_pins() {
        let mut hal = ScriptedHal::new();
        hal.wire_mux(12, &[25, 26, 27]);
        hal.set_mux_channel(12, 5, 0);

        // Channel 0 selected: idle level
        assert_eq!(hal.read_digital(12), 1);

        // Select channel 5 = 0b101
        hal.write_digital(25, 1);
        hal.write_digital(26, 0);
        hal.write_digital(27, 1);
        assert_eq!(hal.read_digital(12), 0);
        assert_eq!(hal.writes(), &[(25, 1), (26, 0), (27, 1)]);
    }

    #[test]
    fn test_records_modes_and_delays() {
        let mut hal = ScriptedHal::new();
        hal.set_pin_mode(4, PinMode::InputPullup);
        hal.delay_micros(5);
        hal.delay_micros(7);

        assert_eq!(hal.pin_mode(4), Some(PinMode::InputPullup));
        assert_eq!(hal.pin_mode(5), None);
        assert_eq!(hal.delayed_micros(), 12);
    }
}
