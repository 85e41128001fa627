//! Regulator seam between the control tick and the PID implementation

/// Last update's P/I/D contributions in hundredths, for the diagnostic
/// home screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidTerms {
    pub p_x100: i32,
    pub i_x100: i32,
    pub d_x100: i32,
}

/// Discrete temperature regulator.
pub trait Regulator {
    /// Target temperature in °C.
    fn set_setpoint(&mut self, setpoint_c: i16);

    /// Current target.
    fn setpoint(&self) -> i16;

    /// Advance one sample; returns a power bucket in `0..=MAX_POWER`.
    ///
    /// `now_ms` supplies the sampling interval; the regulator keeps no
    /// clock of its own.
    fn update(&mut self, measurement_c: i16, now_ms: u64) -> u8;

    /// Drop integral and derivative history and restart timing at
    /// `now_ms`.
    fn reset(&mut self, now_ms: u64);

    /// Term breakdown of the last update.
    fn terms(&self) -> PidTerms;
}
