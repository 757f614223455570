//! Tests for the control façade

use super::*;
use crate::hal::ScriptedHal;
use crate::input::button::{PRESSED, RELEASED};

const POT_PIN: u8 = 34;
const PAD_PIN: u8 = 4;
const BUTTON_PIN: u8 = 15;
const SWITCH_PIN: u8 = 16;

/// Set a pot's 10-bit position on a 12-bit ADC
fn set_pot(hal: &mut ScriptedHal, position: u16) {
    hal.set_analog(POT_PIN, position * 4);
}

fn pot() -> Control {
    Control::new(POT_PIN, ControlKind::Pot, ControlConfig::default())
}

#[test]
fn test_pot_reads_and_commits_to_bank() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();

    set_pot(&mut hal, 300);
    assert_eq!(control.read(&mut hal, 0, &mut counters), Reading::Value(300));
    assert_eq!(control.value(), 300);
    assert_eq!(control.bank_value(), 300);
}

#[test]
fn test_bank_switch_ramp_picks_up_after_crossing() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();

    set_pot(&mut hal, 0);
    control.read(&mut hal, 0, &mut counters);
    control.set_bank_value_at(1, 512);

    control.set_bank(1);
    assert!(control.is_latched());
    assert_eq!(control.value(), 512);

    let mut readings = Vec::new();
    for (tick, position) in (0..=1000).step_by(100).enumerate() {
        set_pot(&mut hal, position);
        readings.push(control.read(&mut hal, tick as u32, &mut counters));
    }

    for reading in &readings[..6] {
        assert_eq!(*reading, Reading::Latched(LatchDirection::Below));
        assert_eq!(reading.code(), -1);
    }
    for (i, reading) in readings.iter().enumerate().skip(6) {
        assert_eq!(*reading, Reading::Value(i as u16 * 100));
    }

    assert!(!control.is_latched());
    assert_eq!(control.bank_value(), 1000);
    assert_eq!(control.bank_value_at(0), 0);
}

#[test]
fn test_latched_pot_leaves_bank_untouched() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();

    set_pot(&mut hal, 900);
    control.read(&mut hal, 0, &mut counters);
    control.set_bank_value_at(2, 200);
    control.set_bank(2);

    for position in [900, 850, 800] {
        set_pot(&mut hal, position);
        let reading = control.read(&mut hal, 0, &mut counters);
        assert_eq!(reading, Reading::Latched(LatchDirection::Above));
        assert_eq!(reading.code(), -2);
    }
    assert_eq!(control.bank_value(), 200);
    assert_eq!(control.value(), 200);

    // Back to bank 0: its value is where the pot was left
    control.set_bank(0);
    assert_eq!(control.value(), 900);
}

#[test]
fn test_latch_disabled_commits_immediately() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();
    control.set_latch_enabled(false);

    set_pot(&mut hal, 100);
    control.read(&mut hal, 0, &mut counters);
    control.set_bank_value_at(1, 800);
    control.set_bank(1);

    assert!(!control.is_latched());
    assert_eq!(control.read(&mut hal, 1, &mut counters), Reading::Value(100));
    assert_eq!(control.bank_value(), 100);

    // Re-enabled: the next switch latches again
    control.set_latch_enabled(true);
    control.set_bank(0);
    assert!(control.is_latched());
}

#[test]
fn test_release_latch_resumes_live_values() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();

    set_pot(&mut hal, 100);
    control.read(&mut hal, 0, &mut counters);
    control.set_bank_value_at(1, 800);
    control.set_bank(1);
    assert!(!control.read(&mut hal, 1, &mut counters).is_live());

    control.release_latch();
    assert_eq!(control.read(&mut hal, 2, &mut counters), Reading::Value(100));
}

#[test]
fn test_floating_pot_is_unstable() {
    struct Floating(u16);

    impl Hal for Floating {
        fn read_digital(&mut self, _pin: u8) -> u8 {
            1
        }
        fn read_analog(&mut self, _pin: u8) -> u16 {
            // Alternates between the rails
            self.0 = 4095 - self.0;
            self.0
        }
        fn read_touch_raw(&mut self, _pin: u8) -> u16 {
            0
        }
        fn set_pin_mode(&mut self, _pin: u8, _mode: PinMode) {}
        fn write_digital(&mut self, _pin: u8, _level: u8) {}
        fn delay_micros(&mut self, _micros: u32) {}
    }

    let mut hal = Floating(0);
    let mut counters = ActivityCounters::new();
    let mut control = pot();
    control.set_bank_value(321);

    let reading = control.read(&mut hal, 0, &mut counters);
    assert_eq!(reading, Reading::Unstable);
    assert_eq!(reading.code(), -3);
    assert_eq!(control.value(), 321);
}

#[test]
fn test_switch_latches_per_bank() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = Control::new(SWITCH_PIN, ControlKind::Switch, ControlConfig::default());

    hal.set_digital(SWITCH_PIN, 1);
    assert_eq!(control.read(&mut hal, 0, &mut counters), Reading::Value(1));
    assert!(control.is_switched_on());

    // Bank 1 stored off; switch still on
    control.set_bank(1);
    assert!(!control.is_switched_on());
    assert_eq!(
        control.read(&mut hal, 1, &mut counters),
        Reading::Latched(LatchDirection::Above)
    );

    hal.set_digital(SWITCH_PIN, 0);
    assert_eq!(control.read(&mut hal, 2, &mut counters), Reading::Value(0));

    hal.set_digital(SWITCH_PIN, 1);
    assert_eq!(control.read(&mut hal, 3, &mut counters), Reading::Value(1));
    assert_eq!(control.bank_value_at(1), 1);
}

#[test]
fn test_button_gestures_through_control() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = Control::new(BUTTON_PIN, ControlKind::Button, ControlConfig::default());

    hal.set_digital(BUTTON_PIN, PRESSED);
    for now in 0..=600 {
        control.read(&mut hal, now, &mut counters);
    }
    assert!(control.is_pressed());
    assert_eq!(control.value(), 1);
    assert!(counters.any_pressed());
    assert!(control.take_held());
    assert!(!control.take_held());

    control.notify_hold_action();
    assert!(control.is_held_and_actioned());

    hal.set_digital(BUTTON_PIN, RELEASED);
    for now in 601..=650 {
        control.read(&mut hal, now, &mut counters);
    }
    assert!(!control.is_pressed());
    assert_eq!(control.value(), 0);
    assert!(!counters.any_pressed());
    assert!(control.had_hold_action());
    assert!(control.was_held());
}

#[test]
fn test_buttons_do_not_touch_banks() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = Control::new(BUTTON_PIN, ControlKind::Button, ControlConfig::default());
    control.set_bank_value_at(1, 700);
    control.set_bank(1);

    hal.set_digital(BUTTON_PIN, PRESSED);
    for now in 0..30 {
        assert!(control.read(&mut hal, now, &mut counters).is_live());
    }
    assert_eq!(control.value(), 1);
    assert_eq!(control.bank_value(), 700);
    assert!(!control.is_latched());
}

#[test]
fn test_bank_switch_never_latches_momentary_kinds() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut button = Control::new(BUTTON_PIN, ControlKind::Button, ControlConfig::default());
    let mut pad = Control::new(PAD_PIN, ControlKind::Touch, ControlConfig::default());
    let mut mux = Control::mux_button(12, vec![25, 26], 1, ControlConfig::default());
    hal.wire_mux(12, &[25, 26]);

    for control in [&mut button, &mut pad, &mut mux] {
        control.set_bank(1);
        for now in 0..100 {
            control.read(&mut hal, now, &mut counters);
        }
        assert!(!control.is_latched(), "{} latched after bank switch", control.kind());
        assert_eq!(control.bank(), 1);
    }
}

#[test]
fn test_set_kind_to_momentary_drops_latch() {
    let mut counters = ActivityCounters::new();
    let mut control = pot();
    control.set_bank_value_at(1, 900);
    control.set_bank(1);
    assert!(control.is_latched());

    control.set_kind(ControlKind::Button, &mut counters);
    assert!(!control.is_latched());
}

#[test]
fn test_reset_banks_zeroes_every_bank() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();
    control.set_bank_value_at(0, 300);
    control.set_bank_value_at(3, 800);
    control.set_bank(3);
    assert!(control.is_latched());
    let count = control.bank_count();

    control.reset_banks();

    assert_eq!(control.bank_count(), count);
    assert!(control.banks().values().iter().all(|v| *v == 0));
    assert_eq!(control.value(), 0);
    assert_eq!(control.bank(), 3);
    assert!(!control.is_latched());

    set_pot(&mut hal, 450);
    assert_eq!(control.read(&mut hal, 0, &mut counters), Reading::Value(450));
    assert_eq!(control.bank_value_at(3), 450);
}

#[test]
fn test_mux_button_reads_its_channel() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    hal.wire_mux(12, &[25, 26, 27]);
    hal.set_mux_channel(12, 3, PRESSED);

    let mut pressed = Control::mux_button(12, vec![25, 26, 27], 3, ControlConfig::default());
    let mut idle = Control::mux_button(12, vec![25, 26, 27], 4, ControlConfig::default());
    pressed.configure_pins(&mut hal);

    for now in 0..30 {
        pressed.read(&mut hal, now, &mut counters);
        idle.read(&mut hal, now, &mut counters);
    }

    assert_eq!(pressed.kind(), ControlKind::MuxButton);
    assert!(pressed.is_pressed());
    assert!(!idle.is_pressed());
    assert_eq!(counters.pressed_buttons(), 1);
    assert_eq!(hal.pin_mode(12), Some(PinMode::InputPullup));
    assert_eq!(hal.pin_mode(26), Some(PinMode::Output));
}

#[test]
fn test_touch_through_control() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = Control::new(PAD_PIN, ControlKind::Touch, ControlConfig::default());

    hal.set_touch(PAD_PIN, 400);
    control.calibrate_touch(&mut hal, &mut counters);
    assert!(!control.is_touched());

    hal.set_touch(PAD_PIN, 528);
    for now in 0..3 {
        control.read(&mut hal, now, &mut counters);
    }
    assert!(control.is_touched());
    assert_eq!(control.value(), 512);
    assert_eq!(counters.touched_pads(), 1);

    hal.set_touch(PAD_PIN, 400);
    for now in 3..6 {
        control.read(&mut hal, now, &mut counters);
    }
    assert!(!control.is_touched());
    assert_eq!(control.value(), 0);
    assert_eq!(counters.touched_pads(), 0);
}

#[test]
fn test_set_kind_resets_detector_and_counters() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = Control::new(BUTTON_PIN, ControlKind::Button, ControlConfig::default());

    hal.set_digital(BUTTON_PIN, PRESSED);
    for now in 0..30 {
        control.read(&mut hal, now, &mut counters);
    }
    assert_eq!(counters.pressed_buttons(), 1);

    control.set_kind(ControlKind::Pot, &mut counters);
    assert_eq!(control.kind(), ControlKind::Pot);
    assert_eq!(counters.pressed_buttons(), 0);
    assert!(!control.is_pressed());

    // Fresh filter: first read snaps straight to the input
    hal.set_analog(BUTTON_PIN, 2800);
    assert_eq!(control.read(&mut hal, 31, &mut counters), Reading::Value(700));
}

#[test]
fn test_set_same_kind_keeps_state() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();

    set_pot(&mut hal, 400);
    control.read(&mut hal, 0, &mut counters);
    control.set_kind(ControlKind::Pot, &mut counters);
    assert_eq!(control.value(), 400);
}

#[test]
fn test_reset_keeps_banks() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();

    set_pot(&mut hal, 250);
    control.read(&mut hal, 0, &mut counters);
    control.reset(&mut counters);

    assert_eq!(control.bank_value(), 250);
    assert_eq!(control.value(), 250);
}

#[test]
fn test_mismatched_sample_is_ignored() {
    let mut counters = ActivityCounters::new();
    let mut control = pot();
    control.set_bank_value(123);

    assert_eq!(control.feed(Sample::Touch(900), 0, &mut counters), Reading::Value(123));
    assert_eq!(control.feed(Sample::Level(0), 0, &mut counters), Reading::Value(123));
}

#[test]
fn test_helpers_on_other_kinds_are_neutral() {
    let mut hal = ScriptedHal::new();
    let mut counters = ActivityCounters::new();
    let mut control = pot();

    control.notify_hold_action();
    control.calibrate_touch(&mut hal, &mut counters);
    assert!(!control.is_pressed());
    assert!(!control.take_held());
    assert!(!control.take_double_clicked());
    assert!(!control.is_touched());
    assert!(!control.is_switched_on());
}

#[test]
fn test_set_config_validates_and_grows_banks() {
    let mut control = pot();

    let mut bad = ControlConfig::default();
    bad.touch.off_threshold = 99;
    assert!(control.set_config(bad).is_err());

    let mut config = ControlConfig::default();
    config.banks = 16;
    config.latch.enabled = false;
    control.set_config(config).unwrap();

    assert_eq!(control.bank_count(), 16);
    assert!(!control.latch_enabled());
}

#[test]
fn test_configure_pins_by_kind() {
    let mut hal = ScriptedHal::new();
    pot().configure_pins(&mut hal);
    Control::new(BUTTON_PIN, ControlKind::Button, ControlConfig::default())
        .configure_pins(&mut hal);

    assert_eq!(hal.pin_mode(POT_PIN), Some(PinMode::Input));
    assert_eq!(hal.pin_mode(BUTTON_PIN), Some(PinMode::InputPullup));
}

#[test]
fn test_reading_codes_and_display() {
    assert_eq!(Reading::Value(512).code(), 512);
    assert_eq!(Reading::Value(512).value(), Some(512));
    assert_eq!(Reading::Unstable.value(), None);
    assert_eq!(Reading::Latched(LatchDirection::Below).to_string(), "latched (below)");
    assert_eq!(ControlKind::MuxButton.to_string(), "mux_button");
}
