//! Capacitive touch detection
//!
//! Turns a raw capacitive reading into a debounced touched/untouched state and
//! a 0..1023 intensity. The baseline follows slow environmental creep upward
//! and resyncs downward only on real drops, so cross-talk from a neighbouring
//! pad being held does not drag it around.

use tracing::debug;

use crate::config::TouchConfig;
use crate::counters::ActivityCounters;
use crate::hal::Hal;

/// Largest intensity reported for a touch
pub const MAX_INTENSITY: u16 = 1023;

/// Adaptive-baseline touch detector with hysteresis and debounce
#[derive(Debug, Clone)]
pub struct TouchDetector {
    config: TouchConfig,
    /// `None` until the first reading arrives
    baseline: Option<u16>,
    debounce_counter: u8,
    drift_counter: u16,
    touched: bool,
    intensity: u16,
}

impl TouchDetector {
    pub fn new(config: TouchConfig) -> Self {
        Self {
            config,
            baseline: None,
            debounce_counter: 0,
            drift_counter: 0,
            touched: false,
            intensity: 0,
        }
    }

    /// Process one raw reading; returns the current intensity
    pub fn update(&mut self, reading: u16, counters: &mut ActivityCounters) -> u16 {
        let baseline = self.track_baseline(reading);
        let delta = i32::from(reading) - i32::from(baseline);

        let candidate = if self.touched {
            delta >= i32::from(self.config.off_threshold)
        } else {
            delta > i32::from(self.config.on_threshold)
        };

        if candidate == self.touched {
            self.debounce_counter = 0;
        } else {
            self.debounce_counter = self.debounce_counter.saturating_add(1);
            if self.debounce_counter >= self.config.debounce_reads {
                self.debounce_counter = 0;
                self.set_touched(candidate, counters);
                debug!(
                    "Touch {} (reading {}, baseline {}, delta {})",
                    if candidate { "engaged" } else { "released" },
                    reading,
                    baseline,
                    delta
                );
            }
        }

        self.intensity = if self.touched {
            self.scale(delta)
        } else {
            0
        };
        self.intensity
    }

    /// Re-learn the baseline as the mean of a burst of reads and drop any touch
    ///
    /// No detection runs during the burst.
    pub fn calibrate<H: Hal + ?Sized>(
        &mut self,
        hal: &mut H,
        pin: u8,
        counters: &mut ActivityCounters,
    ) {
        let reads = self.config.calibration_reads.max(1);
        debug!("Calibrating touch pin {} over {} reads", pin, reads);

        let sum: u32 = (0..reads).map(|_| u32::from(hal.read_touch_raw(pin))).sum();
        // Mean of u16 readings always fits
        self.baseline = Some((sum / u32::from(reads)) as u16);

        self.set_touched(false, counters);
        self.debounce_counter = 0;
        self.drift_counter = 0;
        self.intensity = 0;

        debug!("Touch pin {} calibrated, baseline {:?}", pin, self.baseline);
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn intensity(&self) -> u16 {
        self.intensity
    }

    pub fn baseline(&self) -> Option<u16> {
        self.baseline
    }

    pub fn set_config(&mut self, config: TouchConfig) {
        self.config = config;
    }

    /// Forget the baseline and any touch, giving back the counter contribution
    pub fn reset(&mut self, counters: &mut ActivityCounters) {
        self.set_touched(false, counters);
        *self = Self::new(self.config);
    }

    fn track_baseline(&mut self, reading: u16) -> u16 {
        let mut baseline = match self.baseline {
            None => reading,
            // Small drops are probably cross-talk, only a real drop resyncs
            Some(b) if u32::from(reading) + u32::from(self.config.resync_margin) < u32::from(b) => {
                reading
            }
            Some(b) => b,
        };

        if self.touched {
            self.drift_counter = 0;
        } else if self.config.drift_interval > 0 && reading > baseline {
            self.drift_counter += 1;
            if self.drift_counter >= self.config.drift_interval {
                self.drift_counter = 0;
                baseline += 1;
            }
        }

        self.baseline = Some(baseline);
        baseline
    }

    fn set_touched(&mut self, touched: bool, counters: &mut ActivityCounters) {
        if touched == self.touched {
            return;
        }
        self.touched = touched;
        if touched {
            counters.pad_touched();
        } else {
            counters.pad_released();
        }
    }

    fn scale(&self, delta: i32) -> u16 {
        let full_scale = i32::from(self.config.full_scale_delta.max(1));
        let scaled = delta.clamp(0, full_scale) * 1024 / full_scale;
        scaled.min(i32::from(MAX_INTENSITY)) as u16
    }
}
