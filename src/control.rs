//! Control façade
//!
//! A [`Control`] is one physical input. Its kind is chosen at construction and
//! only changes through [`Control::set_kind`]; each kind owns just the detector
//! state it needs. Pots and switches go through the bank latch before a value
//! is committed to the active bank; touch pads and buttons are momentary and
//! report directly.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::bank::{BankLatch, BankStore, LatchDirection, LatchOutcome};
use crate::config::{ConfigError, ControlConfig};
use crate::counters::ActivityCounters;
use crate::hal::{Hal, PinMode};
use crate::input::{ButtonDetector, PotReader, PotSample, TouchDetector, POT_MAX};

/// Largest value a switch reports
const SWITCH_MAX: u16 = 1;

/// The kind of physical input behind a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Touch,
    Pot,
    Button,
    Switch,
    MuxButton,
}

impl ControlKind {
    /// Kinds whose value is held per bank and protected by the latch
    pub fn is_latchable(self) -> bool {
        matches!(self, ControlKind::Pot | ControlKind::Switch)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlKind::Touch => "touch",
            ControlKind::Pot => "pot",
            ControlKind::Button => "button",
            ControlKind::Switch => "switch",
            ControlKind::MuxButton => "mux_button",
        };
        f.write_str(name)
    }
}

/// Result of reading a control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Live value: 0..=1023 for continuous kinds, 0/1 for discrete ones
    Value(u16),
    /// Suppressed after a bank switch until the stored value is picked up
    Latched(LatchDirection),
    /// Samples too noisy to trust (floating pin)
    Unstable,
}

impl Reading {
    pub fn value(self) -> Option<u16> {
        match self {
            Reading::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, Reading::Value(_))
    }

    /// Integer encoding: the value itself, or -1 (latched below), -2 (latched above), -3 (unstable)
    pub fn code(self) -> i32 {
        match self {
            Reading::Value(v) => i32::from(v),
            Reading::Latched(LatchDirection::Below) => -1,
            Reading::Latched(LatchDirection::Above) => -2,
            Reading::Unstable => -3,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Latched(LatchDirection::Below) => f.write_str("latched (below)"),
            Reading::Latched(LatchDirection::Above) => f.write_str("latched (above)"),
            Reading::Unstable => f.write_str("unstable"),
        }
    }
}

/// One tick of raw input, for feeding a control without a HAL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample<'a> {
    /// Digital level (buttons, switches, already-selected mux channel)
    Level(u8),
    /// Raw ADC samples taken this tick
    Analog(&'a [u16]),
    /// Raw capacitive reading
    Touch(u16),
}

#[derive(Debug, Clone)]
enum Detector {
    Touch(TouchDetector),
    Pot(PotReader),
    Button(ButtonDetector),
    Switch,
    MuxButton(ButtonDetector),
}

impl Detector {
    fn new(kind: ControlKind, config: &ControlConfig) -> Self {
        match kind {
            ControlKind::Touch => Detector::Touch(TouchDetector::new(config.touch)),
            ControlKind::Pot => Detector::Pot(PotReader::new(config.pot, config.filter)),
            ControlKind::Button => Detector::Button(ButtonDetector::new(config.button)),
            ControlKind::Switch => Detector::Switch,
            ControlKind::MuxButton => Detector::MuxButton(ButtonDetector::new(config.button)),
        }
    }

    fn kind(&self) -> ControlKind {
        match self {
            Detector::Touch(_) => ControlKind::Touch,
            Detector::Pot(_) => ControlKind::Pot,
            Detector::Button(_) => ControlKind::Button,
            Detector::Switch => ControlKind::Switch,
            Detector::MuxButton(_) => ControlKind::MuxButton,
        }
    }

    fn button(&self) -> Option<&ButtonDetector> {
        match self {
            Detector::Button(b) | Detector::MuxButton(b) => Some(b),
            _ => None,
        }
    }

    fn button_mut(&mut self) -> Option<&mut ButtonDetector> {
        match self {
            Detector::Button(b) | Detector::MuxButton(b) => Some(b),
            _ => None,
        }
    }

    /// Drop state, giving back counter contributions
    fn reset(&mut self, counters: &mut ActivityCounters) {
        match self {
            Detector::Touch(t) => t.reset(counters),
            Detector::Pot(p) => p.reset(),
            Detector::Button(b) | Detector::MuxButton(b) => b.reset(counters),
            Detector::Switch => {}
        }
    }
}

/// Value a detector produced this tick, before banking
enum Candidate {
    Momentary(u16),
    Latchable { value: u16, max: u16 },
    Unstable,
}

/// One physical input with its detector, banks and pick-up latch
#[derive(Debug, Clone)]
pub struct Control {
    pin: u8,
    select_pins: Vec<u8>,
    channel: u8,
    config: ControlConfig,
    detector: Detector,
    banks: BankStore,
    latch: BankLatch,
    value: u16,
    scratch: Vec<u16>,
}

impl Control {
    pub fn new(pin: u8, kind: ControlKind, config: ControlConfig) -> Self {
        Self {
            pin,
            select_pins: Vec::new(),
            channel: 0,
            detector: Detector::new(kind, &config),
            banks: BankStore::new(config.banks),
            latch: BankLatch::new(config.latch.enabled, latch_margin(kind, &config)),
            value: 0,
            scratch: Vec::with_capacity(usize::from(config.pot.samples_per_read)),
            config,
        }
    }

    /// A button behind a multiplexer: `select_pins` carry `channel` (LSB first)
    pub fn mux_button(
        signal_pin: u8,
        select_pins: Vec<u8>,
        channel: u8,
        config: ControlConfig,
    ) -> Self {
        Self {
            select_pins,
            channel,
            ..Self::new(signal_pin, ControlKind::MuxButton, config)
        }
    }

    pub fn kind(&self) -> ControlKind {
        self.detector.kind()
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Set pin modes for this control's kind
    pub fn configure_pins<H: Hal + ?Sized>(&self, hal: &mut H) {
        match self.kind() {
            ControlKind::Touch | ControlKind::Pot => hal.set_pin_mode(self.pin, PinMode::Input),
            ControlKind::Button | ControlKind::Switch => {
                hal.set_pin_mode(self.pin, PinMode::InputPullup)
            }
            ControlKind::MuxButton => {
                hal.set_pin_mode(self.pin, PinMode::InputPullup);
                for pin in &self.select_pins {
                    hal.set_pin_mode(*pin, PinMode::Output);
                }
            }
        }
    }

    /// Sample the hardware and run one tick
    pub fn read<H: Hal + ?Sized>(
        &mut self,
        hal: &mut H,
        now_ms: u32,
        counters: &mut ActivityCounters,
    ) -> Reading {
        match &mut self.detector {
            Detector::Touch(_) => {
                let raw = hal.read_touch_raw(self.pin);
                self.feed(Sample::Touch(raw), now_ms, counters)
            }
            Detector::Pot(_) => {
                let count = usize::from(self.config.pot.samples_per_read.max(1));
                let mut samples = std::mem::take(&mut self.scratch);
                samples.clear();
                samples.extend((0..count).map(|_| hal.read_analog(self.pin)));

                let reading = self.feed(Sample::Analog(&samples), now_ms, counters);
                self.scratch = samples;
                reading
            }
            Detector::Button(_) | Detector::Switch => {
                let level = hal.read_digital(self.pin);
                self.feed(Sample::Level(level), now_ms, counters)
            }
            Detector::MuxButton(button) => {
                let pressed = button.update_mux(
                    hal,
                    self.pin,
                    &self.select_pins,
                    self.channel,
                    now_ms,
                    counters,
                );
                self.value = u16::from(pressed);
                Reading::Value(self.value)
            }
        }
    }

    /// Run one tick from a sample the caller already took
    pub fn feed(
        &mut self,
        sample: Sample<'_>,
        now_ms: u32,
        counters: &mut ActivityCounters,
    ) -> Reading {
        let candidate = match (&mut self.detector, sample) {
            (Detector::Touch(touch), Sample::Touch(raw)) => {
                Candidate::Momentary(touch.update(raw, counters))
            }
            (Detector::Pot(pot), Sample::Analog(samples)) => match pot.update(samples) {
                PotSample::Value(value) => Candidate::Latchable { value, max: POT_MAX },
                PotSample::Unstable => Candidate::Unstable,
            },
            (Detector::Button(button), Sample::Level(level))
            | (Detector::MuxButton(button), Sample::Level(level)) => {
                Candidate::Momentary(u16::from(button.update(level, now_ms, counters)))
            }
            (Detector::Switch, Sample::Level(level)) => Candidate::Latchable {
                value: u16::from(level.min(1)),
                max: SWITCH_MAX,
            },
            (detector, sample) => {
                warn!(
                    "Ignoring {:?} fed to a {} control on pin {}",
                    sample,
                    detector.kind(),
                    self.pin
                );
                return Reading::Value(self.value);
            }
        };

        match candidate {
            Candidate::Momentary(value) => {
                self.value = value;
                Reading::Value(value)
            }
            Candidate::Latchable { value, max } => self.commit(value, max),
            Candidate::Unstable => Reading::Unstable,
        }
    }

    /// Last accepted value (the active bank's committed value for pots and switches)
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Drop detector state; banks and latch are kept
    pub fn reset(&mut self, counters: &mut ActivityCounters) {
        self.detector.reset(counters);
        self.value = self.resting_value();
    }

    /// Change the kind of this control; a no-op if it already is that kind
    pub fn set_kind(&mut self, kind: ControlKind, counters: &mut ActivityCounters) {
        if kind == self.kind() {
            return;
        }

        debug!("Control on pin {} changing from {} to {}", self.pin, self.kind(), kind);
        self.detector.reset(counters);
        self.detector = Detector::new(kind, &self.config);
        if !kind.is_latchable() {
            self.latch.release();
        }
        self.latch.set_edge_margin(latch_margin(kind, &self.config));
        self.value = self.resting_value();
    }

    /// Apply new tunables from the next tick on; detector state is kept
    pub fn set_config(&mut self, config: ControlConfig) -> Result<(), ConfigError> {
        config.validate()?;

        match &mut self.detector {
            Detector::Touch(touch) => touch.set_config(config.touch),
            Detector::Pot(pot) => pot.set_config(config.pot, config.filter),
            Detector::Button(button) | Detector::MuxButton(button) => {
                button.set_config(config.button)
            }
            Detector::Switch => {}
        }
        self.latch.set_enabled(config.latch.enabled);
        self.latch.set_edge_margin(latch_margin(self.kind(), &config));
        self.banks.ensure_len(config.banks);
        self.config = config;

        Ok(())
    }

    // Banks

    /// Switch the active bank; pots and switches latch until the stored value is picked up
    pub fn set_bank(&mut self, bank: usize) {
        self.banks.select(bank);
        if self.kind().is_latchable() {
            self.latch.arm();
            self.value = self.banks.value();
        }
        debug!(
            "Control on pin {} switched to bank {} (stored {})",
            self.pin,
            bank,
            self.banks.value()
        );
    }

    pub fn bank(&self) -> usize {
        self.banks.active()
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Grow to at least `count` banks; existing values are kept
    pub fn set_bank_count(&mut self, count: usize) {
        self.banks.ensure_len(count);
    }

    pub fn bank_value(&self) -> u16 {
        self.banks.value()
    }

    pub fn bank_value_at(&self, bank: usize) -> u16 {
        self.banks.value_at(bank)
    }

    pub fn set_bank_value(&mut self, value: u16) {
        self.banks.set_value(value);
        if self.kind().is_latchable() {
            self.value = value;
        }
    }

    pub fn set_bank_value_at(&mut self, bank: usize, value: u16) {
        self.banks.set_value_at(bank, value);
        if bank == self.banks.active() && self.kind().is_latchable() {
            self.value = value;
        }
    }

    /// Zero every bank's stored value and drop any pending latch
    pub fn reset_banks(&mut self) {
        self.banks.clear();
        self.latch.release();
        if self.kind().is_latchable() {
            self.value = 0;
        }
        debug!("Control on pin {} cleared {} banks", self.pin, self.banks.len());
    }

    pub fn banks(&self) -> &BankStore {
        &self.banks
    }

    pub fn set_latch_enabled(&mut self, enabled: bool) {
        self.latch.set_enabled(enabled);
    }

    pub fn latch_enabled(&self) -> bool {
        self.latch.is_enabled()
    }

    /// Resume live updates without waiting for a crossing
    pub fn release_latch(&mut self) {
        self.latch.release();
    }

    pub fn is_latched(&self) -> bool {
        self.latch.is_latched()
    }

    // Kind-specific helpers

    pub fn is_pressed(&self) -> bool {
        self.detector.button().is_some_and(ButtonDetector::is_pressed)
    }

    pub fn take_held(&mut self) -> bool {
        self.detector.button_mut().is_some_and(ButtonDetector::take_held)
    }

    pub fn take_double_clicked(&mut self) -> bool {
        self.detector
            .button_mut()
            .is_some_and(ButtonDetector::take_double_clicked)
    }

    pub fn notify_hold_action(&mut self) {
        if let Some(button) = self.detector.button_mut() {
            button.notify_hold_action();
        }
    }

    pub fn is_held_and_actioned(&self) -> bool {
        self.detector
            .button()
            .is_some_and(ButtonDetector::is_held_and_actioned)
    }

    pub fn had_hold_action(&self) -> bool {
        self.detector.button().is_some_and(ButtonDetector::had_hold_action)
    }

    pub fn was_held(&self) -> bool {
        self.detector.button().is_some_and(ButtonDetector::was_held)
    }

    pub fn is_touched(&self) -> bool {
        matches!(&self.detector, Detector::Touch(touch) if touch.is_touched())
    }

    /// Re-learn the touch baseline; no-op for other kinds
    pub fn calibrate_touch<H: Hal + ?Sized>(
        &mut self,
        hal: &mut H,
        counters: &mut ActivityCounters,
    ) {
        if let Detector::Touch(touch) = &mut self.detector {
            touch.calibrate(hal, self.pin, counters);
            self.value = 0;
        }
    }

    pub fn is_switched_on(&self) -> bool {
        matches!(self.detector, Detector::Switch) && self.value == 1
    }

    fn commit(&mut self, value: u16, max: u16) -> Reading {
        match self.latch.process(value, self.banks.value(), max) {
            LatchOutcome::Commit(value) => {
                self.banks.set_value(value);
                self.value = value;
                Reading::Value(value)
            }
            LatchOutcome::Hold(direction) => Reading::Latched(direction),
        }
    }

    fn resting_value(&self) -> u16 {
        if self.kind().is_latchable() {
            self.banks.value()
        } else {
            0
        }
    }
}

fn latch_margin(kind: ControlKind, config: &ControlConfig) -> u16 {
    match kind {
        ControlKind::Switch => 0,
        _ => config.latch.edge_margin,
    }
}
