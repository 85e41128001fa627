//! Heater driver implementations

pub mod element;
pub mod induction;

pub use element::{ElementHeater, PwmPin};
pub use induction::{DriveTimer, InductionHeater};
