//! Potentiometer read path
//!
//! Several raw ADC samples per tick are checked for spread (a floating or
//! disconnected wiper swings wildly), averaged, scaled to 10 bits and run
//! through the responsive filter. Output hysteresis keeps the reported value
//! from flickering by one step while the rails stay reachable.

use tracing::debug;

use super::filter::ResponsiveFilter;
use crate::config::{FilterConfig, PotConfig};

/// Largest value a pot reports
pub const POT_MAX: u16 = 1023;

/// Outcome of one pot tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotSample {
    /// Conditioned value in 0..=1023
    Value(u16),
    /// Samples disagreed too much to be trusted
    Unstable,
}

/// Spread check, averaging, filtering and output hysteresis for one pot
#[derive(Debug, Clone)]
pub struct PotReader {
    config: PotConfig,
    filter: ResponsiveFilter,
    output: Option<u16>,
}

impl PotReader {
    pub fn new(config: PotConfig, filter: FilterConfig) -> Self {
        Self {
            config,
            filter: ResponsiveFilter::new(FilterConfig {
                resolution: POT_MAX + 1,
                ..filter
            }),
            output: None,
        }
    }

    /// Number of raw samples the caller should take per tick
    pub fn samples_per_read(&self) -> usize {
        usize::from(self.config.samples_per_read.max(1))
    }

    /// Condition one tick worth of raw ADC samples
    pub fn update(&mut self, samples: &[u16]) -> PotSample {
        let (Some(&min), Some(&max)) = (samples.iter().min(), samples.iter().max()) else {
            return self.current();
        };

        if max - min > self.config.max_sample_spread {
            debug!("Pot samples spread {} (min {}, max {}): floating pin?", max - min, min, max);
            return PotSample::Unstable;
        }

        let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
        let mean = sum / samples.len() as u32;
        let filtered = self.filter.update(self.to_ten_bits(mean));

        let output = match self.output {
            Some(previous)
                if filtered.abs_diff(previous) <= self.config.output_hysteresis
                    && filtered != 0
                    && filtered != POT_MAX =>
            {
                previous
            }
            _ => filtered,
        };
        self.output = Some(output);

        PotSample::Value(output)
    }

    pub fn value(&self) -> Option<u16> {
        self.output
    }

    pub fn filter(&self) -> &ResponsiveFilter {
        &self.filter
    }

    pub fn set_config(&mut self, config: PotConfig, filter: FilterConfig) {
        self.config = config;
        self.filter.set_config(FilterConfig {
            resolution: POT_MAX + 1,
            ..filter
        });
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.output = None;
    }

    fn current(&self) -> PotSample {
        self.output.map_or(PotSample::Unstable, PotSample::Value)
    }

    fn to_ten_bits(&self, raw: u32) -> u16 {
        let bits = u32::from(self.config.adc_bits);
        let scaled = if bits >= 10 {
            raw >> (bits - 10)
        } else {
            raw << (10 - bits)
        };
        scaled.min(u32::from(POT_MAX)) as u16
    }
}
