//! Resistive element heater on a single PWM output
//!
//! Power buckets map linearly onto duty cycle under the build-time duty
//! ceiling: bucket 10 at a 40 % ceiling is 40 % duty, bucket 5 is 20 %.
//! The ceiling protects the supply (or the batteries) from the element's
//! full V²/R draw; raising it means retuning the PID.

use thermion_core::traits::heater::{HeaterDrive, HeaterKind, MAX_POWER};

/// Seam to the PWM peripheral: duty as a fraction of `u16::MAX`.
pub trait PwmPin {
    fn set_duty(&mut self, duty: u16);
}

/// PWM element heater.
pub struct ElementHeater<P> {
    pwm: P,
    max_duty_cycle_percent: u8,
    on: bool,
    power: u8,
    locked_out: bool,
}

impl<P: PwmPin> ElementHeater<P> {
    /// `max_duty_cycle_percent` past 100 is a programming error.
    pub fn new(pwm: P, max_duty_cycle_percent: u8) -> Self {
        debug_assert!(max_duty_cycle_percent <= 100);
        let mut heater = Self {
            pwm,
            max_duty_cycle_percent: max_duty_cycle_percent.min(100),
            on: false,
            power: 0,
            locked_out: false,
        };
        // Start de-energized regardless of pin reset state.
        heater.off();
        heater
    }

    fn duty_for(&self, power: u8) -> u16 {
        let power = u32::from(power.min(MAX_POWER));
        let ceiling = u32::from(self.max_duty_cycle_percent);
        (u32::from(u16::MAX) * ceiling / 100 * power / 10) as u16
    }
}

impl<P: PwmPin> HeaterDrive for ElementHeater<P> {
    fn on(&mut self, power: u8) {
        if self.locked_out {
            return;
        }
        self.power = power.min(MAX_POWER);
        self.on = true;
        self.pwm.set_duty(self.duty_for(self.power));
    }

    fn off(&mut self) {
        self.pwm.set_duty(0);
        self.on = false;
    }

    fn set_power(&mut self, power: u8) {
        self.power = power.min(MAX_POWER);
        if self.on && !self.locked_out {
            self.pwm.set_duty(self.duty_for(self.power));
        }
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn get_power(&self) -> u8 {
        self.power
    }

    fn kind(&self) -> HeaterKind {
        HeaterKind::Element
    }

    fn lockout(&mut self) {
        self.locked_out = true;
        self.off();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockPwm {
        duty: u16,
    }

    impl PwmPin for MockPwm {
        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }
    }

    fn heater(ceiling: u8) -> ElementHeater<MockPwm> {
        ElementHeater::new(MockPwm { duty: 0xFFFF }, ceiling)
    }

    #[test]
    fn starts_de_energized() {
        let h = heater(40);
        assert!(!h.is_on());
        assert_eq!(h.pwm.duty, 0);
    }

    #[test]
    fn duty_respects_the_ceiling() {
        let mut h = heater(40);
        h.on(10);
        // Full bucket at a 40 % ceiling: 40 % of full scale.
        let ceiling = (u32::from(u16::MAX) * 40 / 100) as u16;
        assert_eq!(h.pwm.duty, ceiling);

        h.set_power(5);
        assert_eq!(h.pwm.duty, (u32::from(ceiling) * 5 / 10) as u16);
    }

    #[test]
    fn unlimited_ceiling_uses_full_scale() {
        let mut h = heater(100);
        h.on(10);
        assert_eq!(h.pwm.duty, u16::MAX);
    }

    #[test]
    fn off_is_idempotent_and_zeroes_the_pin() {
        let mut h = heater(40);
        h.on(8);
        h.off();
        h.off();
        assert!(!h.is_on());
        assert_eq!(h.pwm.duty, 0);
        // Last commanded bucket survives for the watt estimate.
        assert_eq!(h.get_power(), 8);
    }

    #[test]
    fn set_power_while_off_only_records() {
        let mut h = heater(40);
        h.set_power(6);
        assert_eq!(h.get_power(), 6);
        assert_eq!(h.pwm.duty, 0);
    }

    #[test]
    fn buckets_are_clamped() {
        let mut h = heater(100);
        h.on(250);
        assert_eq!(h.get_power(), MAX_POWER);
    }

    #[test]
    fn lockout_is_permanent() {
        let mut h = heater(40);
        h.on(10);
        h.lockout();
        assert!(!h.is_on());
        assert_eq!(h.pwm.duty, 0);

        h.on(10);
        assert!(!h.is_on());
        assert_eq!(h.pwm.duty, 0);

        h.set_power(5);
        assert_eq!(h.pwm.duty, 0);
    }
}
