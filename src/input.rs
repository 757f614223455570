//! Per-kind detectors
//!
//! Each detector turns raw samples into a conditioned value or debounced
//! state. None of them know about banks; the control façade composes them
//! with the bank latch.

pub mod button;
pub mod filter;
pub mod pot;
pub mod touch;

pub use button::ButtonDetector;
pub use filter::ResponsiveFilter;
pub use pot::{PotReader, PotSample, POT_MAX};
pub use touch::{TouchDetector, MAX_INTENSITY};
