//! Bank storage and pick-up latching
//!
//! A control can drive several logical parameters, one per bank. The store
//! keeps the committed value of each bank; the latch keeps a bank switch from
//! making the newly selected parameter jump to the control's position.

mod latch;
mod store;

pub use latch::{BankLatch, LatchDirection, LatchOutcome};
pub use store::{BankStore, MAX_BANKS};
