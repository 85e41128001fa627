//! PWM output behind the element heater driver

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use thermion_drivers::heater::PwmPin;

/// Heater PWM at the default divider: 125 MHz / 65536 ≈ 1.9 kHz, well
/// clear of audible whine on the MOSFET stage.
pub struct HeaterPwm {
    pwm: Pwm<'static>,
    config: PwmConfig,
}

impl HeaterPwm {
    pub fn new(pwm: Pwm<'static>) -> Self {
        let mut config = PwmConfig::default();
        config.top = u16::MAX;
        config.compare_a = 0;
        Self { pwm, config }
    }
}

impl PwmPin for HeaterPwm {
    fn set_duty(&mut self, duty: u16) {
        self.config.compare_a = duty;
        self.pwm.set_config(&self.config);
    }
}
