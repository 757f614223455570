//! Button debounce and gesture detection
//!
//! Raw levels are active-low (0 = pressed). A level change must be stable for
//! the debounce window before it is believed. On top of the debounced state
//! the detector fires one-shot hold and double-click events and remembers
//! whether an external action happened while the button was held, which is how
//! "hold shift and twist a knob" combos are built.
//!
//! Every time comparison uses [`elapsed_ms`] so the millisecond counter may
//! wrap.

use tracing::debug;

use crate::config::ButtonConfig;
use crate::counters::ActivityCounters;
use crate::hal::{elapsed_ms, Hal};

/// Raw level of a pressed button
pub const PRESSED: u8 = 0;
/// Raw level of a released button
pub const RELEASED: u8 = 1;

/// Debounced button with hold, double-click and hold-action tracking
#[derive(Debug, Clone)]
pub struct ButtonDetector {
    config: ButtonConfig,
    raw_level: u8,
    debounced_level: u8,
    last_change_ms: u32,
    press_start_ms: u32,
    /// Release that may start a double-click; consumed when one fires
    last_release_ms: Option<u32>,
    /// One-shot, cleared by `take_held`
    held: bool,
    /// One-shot, cleared by `take_double_clicked`
    double_clicked: bool,
    /// The current press completed a double-click
    press_was_double: bool,
    hold_triggered: bool,
    hold_action: bool,
    held_on_release: bool,
    hold_action_on_release: bool,
}

impl ButtonDetector {
    pub fn new(config: ButtonConfig) -> Self {
        Self {
            config,
            raw_level: RELEASED,
            debounced_level: RELEASED,
            last_change_ms: 0,
            press_start_ms: 0,
            last_release_ms: None,
            held: false,
            double_clicked: false,
            press_was_double: false,
            hold_triggered: false,
            hold_action: false,
            held_on_release: false,
            hold_action_on_release: false,
        }
    }

    /// Process one raw level sampled at `now_ms`; returns the debounced pressed state
    pub fn update(&mut self, level: u8, now_ms: u32, counters: &mut ActivityCounters) -> bool {
        let level = level.min(RELEASED);
        if level != self.raw_level {
            self.raw_level = level;
            self.last_change_ms = now_ms;
        }

        if self.raw_level != self.debounced_level
            && elapsed_ms(now_ms, self.last_change_ms) >= self.config.debounce_ms
        {
            self.debounced_level = self.raw_level;
            if self.debounced_level == PRESSED {
                self.on_press(now_ms, counters);
            } else {
                self.on_release(now_ms, counters);
            }
        }

        if self.is_pressed()
            && !self.hold_triggered
            && elapsed_ms(now_ms, self.press_start_ms) >= self.config.hold_ms
        {
            self.held = true;
            self.hold_triggered = true;
            debug!("Button hold after {} ms", elapsed_ms(now_ms, self.press_start_ms));
        }

        self.is_pressed()
    }

    /// Select a multiplexer channel, let it settle, then sample the signal pin
    pub fn update_mux<H: Hal + ?Sized>(
        &mut self,
        hal: &mut H,
        signal_pin: u8,
        select_pins: &[u8],
        channel: u8,
        now_ms: u32,
        counters: &mut ActivityCounters,
    ) -> bool {
        for (bit, pin) in select_pins.iter().enumerate() {
            let level = channel.checked_shr(bit as u32).unwrap_or(0) & 1;
            hal.write_digital(*pin, level);
        }
        hal.delay_micros(self.config.settle_micros);

        let level = hal.read_digital(signal_pin);
        self.update(level, now_ms, counters)
    }

    pub fn is_pressed(&self) -> bool {
        self.debounced_level == PRESSED
    }

    /// True once per press that lasted the hold threshold; reading clears it
    pub fn take_held(&mut self) -> bool {
        std::mem::take(&mut self.held)
    }

    /// True once per completed double-click; reading clears it
    pub fn take_double_clicked(&mut self) -> bool {
        std::mem::take(&mut self.double_clicked)
    }

    /// Record that something happened while this button was down
    pub fn notify_hold_action(&mut self) {
        if self.is_pressed() {
            self.hold_action = true;
        }
    }

    /// Live: held past the threshold and an action was recorded during the press
    pub fn is_held_and_actioned(&self) -> bool {
        self.is_pressed() && self.hold_triggered && self.hold_action
    }

    /// After release: the last press was a hold with an action during it
    pub fn had_hold_action(&self) -> bool {
        self.held_on_release && self.hold_action_on_release
    }

    /// After release: the last press reached the hold threshold
    pub fn was_held(&self) -> bool {
        self.held_on_release
    }

    pub fn set_config(&mut self, config: ButtonConfig) {
        self.config = config;
    }

    /// Drop all state, giving back the counter contribution of a held press
    pub fn reset(&mut self, counters: &mut ActivityCounters) {
        if self.is_pressed() {
            counters.button_released();
        }
        *self = Self::new(self.config);
    }

    fn on_press(&mut self, now_ms: u32, counters: &mut ActivityCounters) {
        counters.button_pressed();
        self.press_start_ms = now_ms;
        self.held = false;
        self.hold_triggered = false;
        self.hold_action = false;
        self.double_clicked = false;
        self.press_was_double = false;

        if let Some(released) = self.last_release_ms.take() {
            if elapsed_ms(now_ms, released) < self.config.double_click_ms {
                self.double_clicked = true;
                self.press_was_double = true;
                debug!("Button double-click ({} ms gap)", elapsed_ms(now_ms, released));
            }
        }

        debug!("Button pressed");
    }

    fn on_release(&mut self, now_ms: u32, counters: &mut ActivityCounters) {
        counters.button_released();

        // A release that completed a double-click cannot start another
        self.last_release_ms = if self.press_was_double {
            None
        } else {
            Some(now_ms)
        };

        self.held_on_release = self.hold_triggered;
        self.hold_action_on_release = self.hold_action;
        self.held = false;
        self.hold_triggered = false;
        self.hold_action = false;

        debug!(
            "Button released after {} ms (held: {})",
            elapsed_ms(now_ms, self.press_start_ms),
            self.held_on_release
        );
    }
}
