//! Responsive analog filter
//!
//! Tracks fast, large movements almost instantly while smoothing small ones,
//! and falls asleep when the signal is static so resting noise never reaches
//! the output.

use tracing::trace;

use crate::config::FilterConfig;

/// Decay factor of the raw-minus-smoothed error average
const ERROR_EMA_DECAY: f32 = 0.4;

/// Adaptive smoothing filter with sleep
#[derive(Debug, Clone)]
pub struct ResponsiveFilter {
    config: FilterConfig,
    smooth_value: f32,
    error_ema: f32,
    sleeping: bool,
    first_read: bool,
}

impl ResponsiveFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            smooth_value: 0.0,
            error_ema: 0.0,
            sleeping: false,
            first_read: true,
        }
    }

    /// Feed one raw sample in `0..resolution` and return the smoothed output
    pub fn update(&mut self, raw: u16) -> u16 {
        let max = f32::from(self.max_output());
        let raw = f32::from(raw).min(max);

        if self.first_read {
            self.first_read = false;
            self.smooth_value = raw;
            self.error_ema = 0.0;
            return self.value();
        }

        let target = self.edge_snapped(raw);
        let error = target - self.smooth_value;
        self.error_ema += (error - self.error_ema) * ERROR_EMA_DECAY;

        if self.config.sleep_enabled {
            let sleeping = self.error_ema.abs() < self.config.activity_threshold;
            if sleeping != self.sleeping {
                trace!(
                    "Filter {} at {:.1} (error {:.2})",
                    if sleeping { "sleeping" } else { "waking" },
                    self.smooth_value,
                    self.error_ema
                );
                self.sleeping = sleeping;
            }
            if self.sleeping {
                return self.value();
            }
        }

        let snap = snap_curve(error.abs() * self.config.snap_multiplier);
        self.smooth_value = (self.smooth_value + error * snap).clamp(0.0, max);

        self.value()
    }

    /// Current smoothed output
    pub fn value(&self) -> u16 {
        self.smooth_value.round() as u16
    }

    pub fn smooth_value(&self) -> f32 {
        self.smooth_value
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn set_config(&mut self, config: FilterConfig) {
        self.config = config;
        self.smooth_value = self.smooth_value.min(f32::from(self.max_output()));
    }

    /// Forget history; the next sample is taken as-is
    pub fn reset(&mut self) {
        self.first_read = true;
        self.sleeping = false;
        self.error_ema = 0.0;
    }

    // A zero resolution behaves like 1: the output is pinned at 0
    fn max_output(&self) -> u16 {
        self.config.resolution.max(1) - 1
    }

    // Samples near a rail are pushed outward so the rail is reached instead of approached
    fn edge_snapped(&self, raw: f32) -> f32 {
        if !self.config.edge_snap {
            return raw;
        }

        let threshold = self.config.activity_threshold;
        let resolution = f32::from(self.config.resolution);

        if raw < threshold {
            (raw * 2.0 - threshold).max(0.0)
        } else if raw > resolution - threshold {
            raw * 2.0 - resolution + threshold
        } else {
            raw
        }
    }
}

/// 0 for no difference, approaching 1 (full snap) as the scaled difference grows
fn snap_curve(x: f32) -> f32 {
    let y = 1.0 / (x + 1.0);
    ((1.0 - y) * 2.0).clamp(0.0, 1.0)
}
