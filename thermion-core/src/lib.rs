//! Board-agnostic control and safety core for the Thermion heater controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (heater, thermocouple, regulator, display)
//! - Shared system state and the Off/Manual/Session mode machine
//! - Control tick orchestration
//! - Safety supervision logic
//! - Bounded sample history for the graph screens
//! - Runtime configuration types and the config.txt parser
//! - The buzzer tone vocabulary

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod control;
pub mod history;
pub mod safety;
pub mod state;
pub mod tones;
pub mod traits;
