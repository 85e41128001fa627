//! Resonant induction heater
//!
//! Drives a push-pull coil pair through a ZVS stage. Energize order is
//! strict: the drive timer must be running before either gate opens, and
//! both gates must be closed before it stops - the half-bridge shoots
//! through otherwise. Power is applied when energizing; there is no live
//! re-duty on this variant.

use embedded_hal::digital::OutputPin;
use thermion_core::traits::heater::{HeaterDrive, HeaterKind, MAX_POWER};

/// Opaque resonant drive timer.
pub trait DriveTimer {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Induction coil heater.
pub struct InductionHeater<A, B, T> {
    coil_a: A,
    coil_b: B,
    timer: T,
    on: bool,
    power: u8,
    locked_out: bool,
}

impl<A: OutputPin, B: OutputPin, T: DriveTimer> InductionHeater<A, B, T> {
    pub fn new(coil_a: A, coil_b: B, timer: T) -> Self {
        let mut heater = Self {
            coil_a,
            coil_b,
            timer,
            on: false,
            power: 0,
            locked_out: false,
        };
        heater.off();
        heater
    }
}

impl<A: OutputPin, B: OutputPin, T: DriveTimer> HeaterDrive for InductionHeater<A, B, T> {
    fn on(&mut self, power: u8) {
        if self.locked_out {
            return;
        }
        self.power = power.min(MAX_POWER);
        // Timer first, then the gates.
        self.timer.start();
        self.coil_a.set_high().ok();
        self.coil_b.set_high().ok();
        self.on = true;
    }

    fn off(&mut self) {
        // Gates closed before the drive stops.
        self.coil_a.set_low().ok();
        self.coil_b.set_low().ok();
        self.timer.stop();
        self.on = false;
    }

    fn set_power(&mut self, power: u8) {
        // Recorded only; applied at the next energize.
        self.power = power.min(MAX_POWER);
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn get_power(&self) -> u8 {
        self.power
    }

    fn kind(&self) -> HeaterKind {
        HeaterKind::Induction
    }

    fn lockout(&mut self) {
        self.locked_out = true;
        self.off();
    }
}
