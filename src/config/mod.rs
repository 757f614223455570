//! Configuration for MultiControl
//!
//! Per-control tunables (filter, pot, touch, button, latch) plus the rig
//! description used by the replay tool. Every field carries a serde default so
//! partial YAML documents are valid.

pub mod rig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use rig::{ControlSpec, RigConfig};

/// Configuration validation failure
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("filter resolution must be at least 2, got {0}")]
    Resolution(u16),
    #[error("filter activity_threshold must be positive, got {0}")]
    ActivityThreshold(f32),
    #[error("filter snap_multiplier cannot be negative, got {0}")]
    SnapMultiplier(f32),
    #[error("pot samples_per_read must be at least 1")]
    SamplesPerRead,
    #[error("pot adc_bits must be within 8..=16, got {0}")]
    AdcBits(u8),
    #[error("touch off_threshold ({off}) must be below on_threshold ({on})")]
    TouchThresholds { on: u16, off: u16 },
    #[error("touch debounce_reads must be at least 1")]
    TouchDebounce,
    #[error("touch full_scale_delta must be at least 1")]
    FullScaleDelta,
    #[error("bank count must be between 1 and {max}, got {0}", max = crate::bank::MAX_BANKS)]
    BankCount(usize),
    #[error("duplicate control name '{0}'")]
    DuplicateControl(String),
    #[error("control '{0}' is a mux button but has no select_pins")]
    MissingSelectPins(String),
    #[error("control '{name}' selects channel {channel} but only {pins} select pins are wired")]
    MuxChannel { name: String, channel: u8, pins: usize },
}

/// Responsive analog filter tunables
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Error EMA magnitude below which the filter sleeps
    #[serde(default = "default_activity_threshold")]
    pub activity_threshold: f32,
    /// Scales the raw difference before the snap curve
    #[serde(default = "default_snap_multiplier")]
    pub snap_multiplier: f32,
    #[serde(default = "default_true")]
    pub sleep_enabled: bool,
    /// Extrapolate samples near the rails so 0 and max are reachable
    #[serde(default = "default_true")]
    pub edge_snap: bool,
    /// Number of distinct output steps (output is 0..resolution)
    ///
    /// Only used by a standalone [`ResponsiveFilter`](crate::input::ResponsiveFilter).
    /// Pot controls always filter on the 10-bit scale and ignore this field.
    #[serde(default = "default_resolution")]
    pub resolution: u16,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            activity_threshold: default_activity_threshold(),
            snap_multiplier: default_snap_multiplier(),
            sleep_enabled: true,
            edge_snap: true,
            resolution: default_resolution(),
        }
    }
}

/// Potentiometer read path tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PotConfig {
    /// Raw ADC samples taken per tick
    #[serde(default = "default_samples_per_read")]
    pub samples_per_read: u8,
    /// Max - min raw spread above which the pin is considered floating
    #[serde(default = "default_max_sample_spread")]
    pub max_sample_spread: u16,
    /// Minimum output movement before a new value is reported
    #[serde(default = "default_output_hysteresis")]
    pub output_hysteresis: u16,
    /// ADC width of the raw samples
    #[serde(default = "default_adc_bits")]
    pub adc_bits: u8,
}

impl Default for PotConfig {
    fn default() -> Self {
        Self {
            samples_per_read: default_samples_per_read(),
            max_sample_spread: default_max_sample_spread(),
            output_hysteresis: default_output_hysteresis(),
            adc_bits: default_adc_bits(),
        }
    }
}

/// Capacitive touch detector tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TouchConfig {
    /// Delta above baseline required to engage a touch
    #[serde(default = "default_on_threshold")]
    pub on_threshold: u16,
    /// Delta below which an engaged touch releases
    #[serde(default = "default_off_threshold")]
    pub off_threshold: u16,
    /// Consecutive agreeing polls before a state flip is committed
    #[serde(default = "default_debounce_reads")]
    pub debounce_reads: u8,
    /// Untouched polls per one-unit upward baseline drift (0 disables drift)
    #[serde(default = "default_drift_interval")]
    pub drift_interval: u16,
    /// Drop below baseline that counts as a real drop rather than cross-talk
    #[serde(default = "default_resync_margin")]
    pub resync_margin: u16,
    /// Delta that maps to full-scale intensity
    #[serde(default = "default_full_scale_delta")]
    pub full_scale_delta: u16,
    /// Reads performed by an explicit calibration
    #[serde(default = "default_calibration_reads")]
    pub calibration_reads: u16,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            on_threshold: default_on_threshold(),
            off_threshold: default_off_threshold(),
            debounce_reads: default_debounce_reads(),
            drift_interval: default_drift_interval(),
            resync_margin: default_resync_margin(),
            full_scale_delta: default_full_scale_delta(),
            calibration_reads: default_calibration_reads(),
        }
    }
}

/// Button gesture timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ButtonConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u32,
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u32,
    /// Settling delay after a mux channel select
    #[serde(default = "default_settle_micros")]
    pub settle_micros: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            hold_ms: default_hold_ms(),
            double_click_ms: default_double_click_ms(),
            settle_micros: default_settle_micros(),
        }
    }
}

/// Bank pick-up behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Distance from either rail that still counts as reaching it
    #[serde(default = "default_edge_margin")]
    pub edge_margin: u16,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            edge_margin: default_edge_margin(),
        }
    }
}

/// Everything one control can be tuned with
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ControlConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub pot: PotConfig,
    #[serde(default)]
    pub touch: TouchConfig,
    #[serde(default)]
    pub button: ButtonConfig,
    #[serde(default)]
    pub latch: LatchConfig,
    #[serde(default = "default_banks")]
    pub banks: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            pot: PotConfig::default(),
            touch: TouchConfig::default(),
            button: ButtonConfig::default(),
            latch: LatchConfig::default(),
            banks: default_banks(),
        }
    }
}

impl ControlConfig {
    /// Validate tunables for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let filter = &self.filter;
        if filter.resolution < 2 {
            return Err(ConfigError::Resolution(filter.resolution));
        }
        if !(filter.activity_threshold > 0.0) {
            return Err(ConfigError::ActivityThreshold(filter.activity_threshold));
        }
        if filter.snap_multiplier < 0.0 || filter.snap_multiplier.is_nan() {
            return Err(ConfigError::SnapMultiplier(filter.snap_multiplier));
        }

        if self.pot.samples_per_read == 0 {
            return Err(ConfigError::SamplesPerRead);
        }
        if !(8..=16).contains(&self.pot.adc_bits) {
            return Err(ConfigError::AdcBits(self.pot.adc_bits));
        }

        let touch = &self.touch;
        if touch.off_threshold >= touch.on_threshold {
            return Err(ConfigError::TouchThresholds {
                on: touch.on_threshold,
                off: touch.off_threshold,
            });
        }
        if touch.debounce_reads == 0 {
            return Err(ConfigError::TouchDebounce);
        }
        if touch.full_scale_delta == 0 {
            return Err(ConfigError::FullScaleDelta);
        }

        if self.banks == 0 || self.banks > crate::bank::MAX_BANKS {
            return Err(ConfigError::BankCount(self.banks));
        }

        Ok(())
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_activity_threshold() -> f32 { 4.0 }
fn default_snap_multiplier() -> f32 { 0.01 }
fn default_resolution() -> u16 { 1024 }
fn default_samples_per_read() -> u8 { 4 }
fn default_max_sample_spread() -> u16 { 400 }
fn default_output_hysteresis() -> u16 { 2 }
fn default_adc_bits() -> u8 { 12 }
fn default_on_threshold() -> u16 { 30 }
fn default_off_threshold() -> u16 { 15 }
fn default_debounce_reads() -> u8 { 3 }
fn default_drift_interval() -> u16 { 100 }
fn default_resync_margin() -> u16 { 5 }
fn default_full_scale_delta() -> u16 { 256 }
fn default_calibration_reads() -> u16 { 16 }
fn default_debounce_ms() -> u32 { 20 }
fn default_hold_ms() -> u32 { 500 }
fn default_double_click_ms() -> u32 { 300 }
fn default_settle_micros() -> u32 { 5 }
fn default_edge_margin() -> u16 { 4 }
fn default_banks() -> usize { 8 }
