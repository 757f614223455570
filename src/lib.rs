//! MultiControl - signal conditioning for hardware music controllers
//!
//! Turns noisy pot, capacitive touch, button and switch samples into stable
//! control values. Everything here is synchronous and poll driven: call
//! [`Control::read`] (or [`Control::feed`]) once per tick per control with the
//! current millisecond time and a shared [`ActivityCounters`].
//!
//! Pin access and time are supplied by the caller through [`hal::Hal`] and
//! [`hal::Clock`].

pub mod bank;
pub mod config;
pub mod control;
pub mod counters;
pub mod hal;
pub mod input;

pub use bank::{BankLatch, BankStore, LatchDirection};
pub use config::{ConfigError, ControlConfig};
pub use control::{Control, ControlKind, Reading, Sample};
pub use counters::ActivityCounters;
pub use hal::{Clock, Hal, PinMode};
