//! Configuration type definitions
//!
//! Everything the build or the user can tune in one aggregate. The
//! user-editable subset comes from `config.txt` (see [`super::apply`]);
//! the rest are hardware facts (coil resistance, supply voltage, duty
//! ceiling) baked in at build time and only changed together with the
//! hardware.

/// Display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    /// Accepted from config but not fully validated.
    Fahrenheit,
}

/// Aggregate configuration, constant after boot.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Session length, ms (config key `session_timeout`, seconds).
    pub session_timeout_ms: u32,
    /// Display unit; only Celsius is fully validated.
    pub temperature_units: TemperatureUnit,
    /// Initial regulator setpoint, °C.
    pub setpoint: u16,
    /// Regulator buckets at or below this leave the heater off.
    pub power_threshold: u8,
    /// Induction filter rejection band, °C.
    pub heater_on_temperature_difference_threshold: i16,

    /// PID gains in thousandths (0.21 → 210).
    pub pid_kp_x1000: i32,
    pub pid_ki_x1000: i32,
    pub pid_kd_x1000: i32,
    /// Re-zero the PID when a session first nears the setpoint; trims
    /// the overshoot carried over from the cold-start ramp.
    pub session_reset_pid_when_near_setpoint: bool,

    /// PWM ceiling protecting the supply, percent.
    pub heater_max_duty_cycle_percent: u8,
    /// Supply voltage, V.
    pub input_volts: u16,
    /// Heating element resistance, mΩ.
    pub heater_resistance_milliohm: u32,

    /// Conditioner saturation ceiling, °C.
    pub thermocouple_above_limit_c: i16,
    /// Die temperature ceiling for the RP2040 itself, °C.
    pub pi_temperature_limit: i16,
    /// Highest setpoint the menu will accept, °C.
    pub max_allowed_setpoint: u16,

    /// Initial OLED contrast.
    pub display_contrast: u8,
    /// Multi-click detection window, ms.
    pub click_check_timeout_ms: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_timeout_ms: 5 * 60 * 1000,
            temperature_units: TemperatureUnit::Celsius,
            setpoint: 170,
            power_threshold: 0,
            heater_on_temperature_difference_threshold: 20,
            // Six-turn coil, 4 mm nichrome, ~0.55 Ω, two LiPo cells
            pid_kp_x1000: 210,
            pid_ki_x1000: 2,
            pid_kd_x1000: 0,
            session_reset_pid_when_near_setpoint: true,
            heater_max_duty_cycle_percent: 40,
            input_volts: 12,
            heater_resistance_milliohm: 660,
            thermocouple_above_limit_c: 400,
            pi_temperature_limit: 60,
            max_allowed_setpoint: 299,
            display_contrast: 255,
            click_check_timeout_ms: 800,
        }
    }
}
