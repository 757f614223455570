//! Aggregate activity across controls
//!
//! One `ActivityCounters` is shared by every control of a rig and handed to
//! each read. Detectors bump it only on debounced transitions, so the counts
//! always equal the number of controls currently pressed or touched.

/// Count of currently pressed buttons and touched pads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounters {
    pressed_buttons: u32,
    touched_pads: u32,
}

impl ActivityCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pressed_buttons(&self) -> u32 {
        self.pressed_buttons
    }

    pub fn touched_pads(&self) -> u32 {
        self.touched_pads
    }

    /// True while at least one button is down (chord detection)
    pub fn any_pressed(&self) -> bool {
        self.pressed_buttons > 0
    }

    pub fn any_touched(&self) -> bool {
        self.touched_pads > 0
    }

    pub fn any_active(&self) -> bool {
        self.any_pressed() || self.any_touched()
    }

    pub(crate) fn button_pressed(&mut self) {
        self.pressed_buttons = self.pressed_buttons.saturating_add(1);
    }

    pub(crate) fn button_released(&mut self) {
        self.pressed_buttons = self.pressed_buttons.saturating_sub(1);
    }

    pub(crate) fn pad_touched(&mut self) {
        self.touched_pads = self.touched_pads.saturating_add(1);
    }

    pub(crate) fn pad_released(&mut self) {
        self.touched_pads = self.touched_pads.saturating_sub(1);
    }
}
