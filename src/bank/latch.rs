//! Bank pick-up latch
//!
//! After a bank switch the stored value of the new bank and the physical
//! position of the control usually disagree. Committing the physical value
//! straight away would make the parameter jump, so the latch suppresses
//! updates until the reading has been seen on both sides of the stored value
//! (and has moved at least once since the switch, so resting noise exactly at
//! the entry reading cannot release it).

use tracing::debug;

/// Which side of the stored value a suppressed reading is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchDirection {
    Below,
    Above,
}

/// What the latch decided for one reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchOutcome {
    /// The reading may be committed to the active bank
    Commit(u16),
    /// Reading suppressed; the control has not picked up the stored value yet
    Hold(LatchDirection),
}

/// Pick-up state machine for one control
#[derive(Debug, Clone)]
pub struct BankLatch {
    enabled: bool,
    edge_margin: u16,
    /// Latched: set by a bank switch, cleared by a confirmed crossing
    changed: bool,
    latch_above: bool,
    latch_below: bool,
    first_latch_value: Option<u16>,
    first_latch_changed: bool,
}

impl BankLatch {
    pub fn new(enabled: bool, edge_margin: u16) -> Self {
        Self {
            enabled,
            edge_margin,
            changed: false,
            latch_above: false,
            latch_below: false,
            first_latch_value: None,
            first_latch_changed: false,
        }
    }

    /// A bank switch happened: latch until the stored value is crossed
    pub fn arm(&mut self) {
        self.clear_tracking();
        if self.enabled {
            self.changed = true;
            debug!("Bank latch armed");
        }
    }

    /// Force back to free running without a crossing
    pub fn release(&mut self) {
        self.changed = false;
        self.clear_tracking();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.release();
        }
    }

    pub fn set_edge_margin(&mut self, edge_margin: u16) {
        self.edge_margin = edge_margin;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_latched(&self) -> bool {
        self.changed
    }

    /// Decide whether `value` may be committed given the bank's `stored` value
    ///
    /// `max` is the largest value the control can produce, used so a stored
    /// value at the very top (or bottom) is reachable despite the control
    /// never quite hitting the rail.
    pub fn process(&mut self, value: u16, stored: u16, max: u16) -> LatchOutcome {
        if !self.changed {
            return LatchOutcome::Commit(value);
        }

        match self.first_latch_value {
            None => self.first_latch_value = Some(value),
            Some(first) if first != value => self.first_latch_changed = true,
            Some(_) => {}
        }

        if !self.latch_above && (value >= stored || value >= max.saturating_sub(self.edge_margin)) {
            self.latch_above = true;
        }
        if !self.latch_below && (value <= stored || value <= self.edge_margin) {
            self.latch_below = true;
        }

        if self.latch_above && self.latch_below && self.first_latch_changed {
            debug!("Bank latch released at {} (stored {})", value, stored);
            self.release();
            return LatchOutcome::Commit(value);
        }

        if value < stored {
            LatchOutcome::Hold(LatchDirection::Below)
        } else {
            LatchOutcome::Hold(LatchDirection::Above)
        }
    }

    fn clear_tracking(&mut self) {
        self.latch_above = false;
        self.latch_below = false;
        self.first_latch_value = None;
        self.first_latch_changed = false;
    }
}

impl Default for BankLatch {
    fn default() -> Self {
        Self::new(true, 4)
    }
}
