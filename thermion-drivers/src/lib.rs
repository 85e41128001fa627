//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in thermion-core for the controller's hardware:
//!
//! - Heater drivers (PWM element, resonant induction coil pair)
//! - PID regulator over Q16.16 fixed point
//! - MAX6675 thermocouple converter and the induction-aware conditioner

#![no_std]
#![deny(unsafe_code)]

pub mod heater;
pub mod regulator;
pub mod sensor;
