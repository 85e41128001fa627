//! Discrete PID regulator
//!
//! Positional PID with a clamped output and conditional-integration
//! anti-windup: while the pre-clamp sum sits on a boundary, the integral
//! is only advanced as far as the value that keeps the sum at that
//! boundary, never past it. Derivative acts on the measurement by
//! default so setpoint edits do not kick the output.
//!
//! The regulator keeps no clock; `update` takes the caller's timestamp
//! and derives the sampling interval from it.

use thermion_core::traits::heater::MAX_POWER;
use thermion_core::traits::regulator::{PidTerms, Regulator};

use super::fixed::Fixed32;

/// Longest interval a single update will integrate over, ms. A stalled
/// tick must not dump minutes of windup into one step.
const MAX_DT_MS: u64 = 10_000;

/// PID gain triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidTunings {
    pub kp: Fixed32,
    pub ki: Fixed32,
    pub kd: Fixed32,
}

impl PidTunings {
    /// Gains in thousandths: the stock element tuning of
    /// (0.21, 0.002, 0) is `from_scaled_1000(210, 2, 0)`.
    pub const fn from_scaled_1000(kp_x1000: i32, ki_x1000: i32, kd_x1000: i32) -> Self {
        Self {
            kp: Fixed32::from_scaled_1000(kp_x1000),
            ki: Fixed32::from_scaled_1000(ki_x1000),
            kd: Fixed32::from_scaled_1000(kd_x1000),
        }
    }
}

/// PID regulator state.
pub struct Pid {
    tunings: PidTunings,
    setpoint_c: i16,
    out_lo: Fixed32,
    out_hi: Fixed32,
    derivative_on_measurement: bool,
    integral: Fixed32,
    last_measurement: Option<i16>,
    last_error: Option<i16>,
    last_time_ms: Option<u64>,
    last_p: Fixed32,
    last_i: Fixed32,
    last_d: Fixed32,
}

impl Pid {
    /// Output is clamped to the regulator bucket range `[0, MAX_POWER]`.
    pub fn new(tunings: PidTunings, setpoint_c: i16) -> Self {
        Self {
            tunings,
            setpoint_c,
            out_lo: Fixed32::ZERO,
            out_hi: Fixed32::from_int(MAX_POWER as i16),
            derivative_on_measurement: true,
            integral: Fixed32::ZERO,
            last_measurement: None,
            last_error: None,
            last_time_ms: None,
            last_p: Fixed32::ZERO,
            last_i: Fixed32::ZERO,
            last_d: Fixed32::ZERO,
        }
    }

    /// Derivative on error instead of measurement (kicks on setpoint
    /// changes; only useful on rigs without live setpoint edits).
    pub fn set_derivative_on_measurement(&mut self, on_measurement: bool) {
        self.derivative_on_measurement = on_measurement;
    }

    /// Swap gains. Accumulated state is dropped so the old integral
    /// cannot fight the new gains.
    pub fn set_tunings(&mut self, tunings: PidTunings) {
        self.tunings = tunings;
        self.integral = Fixed32::ZERO;
        self.last_measurement = None;
        self.last_error = None;
    }

    pub fn tunings(&self) -> PidTunings {
        self.tunings
    }

    fn dt_seconds(&self, now_ms: u64) -> Option<Fixed32> {
        let last = self.last_time_ms?;
        let dt_ms = now_ms.saturating_sub(last).min(MAX_DT_MS);
        if dt_ms == 0 {
            return None;
        }
        Some(Fixed32::from_ratio(dt_ms as i32, 1000))
    }
}

impl Regulator for Pid {
    fn set_setpoint(&mut self, setpoint_c: i16) {
        self.setpoint_c = setpoint_c;
    }

    fn setpoint(&self) -> i16 {
        self.setpoint_c
    }

    fn update(&mut self, measurement_c: i16, now_ms: u64) -> u8 {
        let error_c = self.setpoint_c.saturating_sub(measurement_c);
        let error = Fixed32::from_int(error_c);
        let p = self.tunings.kp.mul(error);

        let mut d = Fixed32::ZERO;
        if let Some(dt) = self.dt_seconds(now_ms) {
            d = if self.derivative_on_measurement {
                match self.last_measurement {
                    Some(prev) => -self
                        .tunings
                        .kd
                        .mul(Fixed32::from_int(measurement_c.saturating_sub(prev)))
                        .div(dt),
                    None => Fixed32::ZERO,
                }
            } else {
                match self.last_error {
                    Some(prev) => self
                        .tunings
                        .kd
                        .mul(Fixed32::from_int(error_c.saturating_sub(prev)))
                        .div(dt),
                    None => Fixed32::ZERO,
                }
            };

            // Integral advance, held back at the output boundary: the
            // term may grow up to the value that keeps the pre-clamp sum
            // on the limit, and is never pushed past it (or backwards).
            let proposed = self
                .integral
                .saturating_add(self.tunings.ki.mul(error).mul(dt))
                .clamp(self.out_lo, self.out_hi);
            let boundary_hi = self.out_hi.saturating_sub(p).saturating_sub(d);
            let boundary_lo = self.out_lo.saturating_sub(p).saturating_sub(d);
            self.integral = if proposed > boundary_hi {
                if self.integral > boundary_hi {
                    self.integral
                } else {
                    boundary_hi
                }
            } else if proposed < boundary_lo {
                if self.integral < boundary_lo {
                    self.integral
                } else {
                    boundary_lo
                }
            } else {
                proposed
            };
        }

        self.last_time_ms = Some(now_ms);
        self.last_measurement = Some(measurement_c);
        self.last_error = Some(error_c);

        let output = p
            .saturating_add(self.integral)
            .saturating_add(d)
            .clamp(self.out_lo, self.out_hi);

        self.last_p = p;
        self.last_i = self.integral;
        self.last_d = d;

        output.to_int().clamp(0, MAX_POWER as i16) as u8
    }

    fn reset(&mut self, now_ms: u64) {
        self.integral = Fixed32::ZERO;
        self.last_measurement = None;
        self.last_error = None;
        self.last_time_ms = Some(now_ms);
        self.last_p = Fixed32::ZERO;
        self.last_i = Fixed32::ZERO;
        self.last_d = Fixed32::ZERO;
    }

    fn terms(&self) -> PidTerms {
        PidTerms {
            p_x100: self.last_p.to_scaled_100(),
            i_x100: self.last_i.to_scaled_100(),
            d_x100: self.last_d.to_scaled_100(),
        }
    }
}
