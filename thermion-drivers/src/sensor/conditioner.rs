//! Thermocouple conditioning
//!
//! Sits between the raw converter and the control loop. Two jobs:
//!
//! 1. Classify samples into the fault taxonomy. Fatal classifications
//!    latch: once raised, every later read returns the same fault until
//!    reboot.
//! 2. Filter out the EMF bias an energized induction coil induces in
//!    the thermocouple leads. A sample that jumps more than the
//!    configured band away from the last trusted value while the coil
//!    is energized is discarded; the caller is asked to de-energize,
//!    wait, and re-read.

use thermion_core::traits::sensor::{ThermocoupleFault, ThermocoupleReader};

use super::ReadRaw;

/// Consecutive zero samples before the reading counts as stuck.
pub const ZERO_PERSIST_LIMIT: u8 = 2;

/// Induction-aware conditioner over any raw reader.
pub struct Conditioner<R> {
    reader: R,
    last_known_safe_temp: i16,
    diff_threshold: i16,
    above_limit_c: i16,
    zero_streak: u8,
    latched: Option<ThermocoupleFault>,
}

impl<R: ReadRaw> Conditioner<R> {
    pub fn new(reader: R, diff_threshold: i16, above_limit_c: i16) -> Self {
        Self {
            reader,
            last_known_safe_temp: 0,
            diff_threshold,
            above_limit_c,
            zero_streak: 0,
            latched: None,
        }
    }

    /// Last sample accepted as trustworthy.
    pub fn last_known_safe_temp(&self) -> i16 {
        self.last_known_safe_temp
    }

    fn latch(&mut self, fault: ThermocoupleFault) -> ThermocoupleFault {
        if self.latched.is_none() {
            self.latched = Some(fault);
        }
        fault
    }

    /// One classified sample off the wire.
    fn sample(&mut self) -> Result<i16, ThermocoupleFault> {
        if let Some(fault) = self.latched {
            return Err(fault);
        }
        let raw = match self.reader.sample() {
            Ok(raw) => raw,
            Err(fault) if fault.is_fatal() => return Err(self.latch(fault)),
            Err(fault) => return Err(fault),
        };

        if raw < 0 {
            return Err(self.latch(ThermocoupleFault::BelowZero));
        }
        if raw == 0 {
            self.zero_streak = self.zero_streak.saturating_add(1);
            if self.zero_streak >= ZERO_PERSIST_LIMIT {
                return Err(self.latch(ThermocoupleFault::ZeroReading));
            }
        } else {
            self.zero_streak = 0;
        }
        if raw >= self.above_limit_c {
            return Err(ThermocoupleFault::AboveLimit);
        }
        Ok(raw)
    }
}

impl<R: ReadRaw> ThermocoupleReader for Conditioner<R> {
    fn read_raw(&mut self) -> Result<i16, ThermocoupleFault> {
        self.sample()
    }

    fn read_filtered(&mut self, heater_is_on: bool) -> Result<(i16, bool), ThermocoupleFault> {
        let raw = self.sample()?;

        if heater_is_on
            && (raw.saturating_sub(self.last_known_safe_temp)).abs() > self.diff_threshold
        {
            // Field-contaminated: hold the last trusted value and ask
            // the caller for a de-energized re-read.
            return Ok((self.last_known_safe_temp, true));
        }

        self.last_known_safe_temp = raw;
        Ok((raw, false))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::collections::VecDeque;

    use super::*;

    struct ScriptedReader {
        samples: VecDeque<Result<i16, ThermocoupleFault>>,
    }

    impl ScriptedReader {
        fn of(samples: &[Result<i16, ThermocoupleFault>]) -> Self {
            Self {
                samples: samples.iter().copied().collect(),
            }
        }
    }

    impl ReadRaw for ScriptedReader {
        fn sample(&mut self) -> Result<i16, ThermocoupleFault> {
            self.samples.pop_front().unwrap_or(Ok(25))
        }
    }

    fn conditioner(samples: &[Result<i16, ThermocoupleFault>]) -> Conditioner<ScriptedReader> {
        Conditioner::new(ScriptedReader::of(samples), 20, 400)
    }

    #[test]
    fn accepts_and_tracks_clean_samples() {
        let mut c = conditioner(&[Ok(150), Ok(155)]);
        assert_eq!(c.read_filtered(false), Ok((150, false)));
        assert_eq!(c.read_filtered(false), Ok((155, false)));
        assert_eq!(c.last_known_safe_temp(), 155);
    }

    #[test]
    fn heater_on_jump_is_rejected_with_an_off_read_request() {
        let mut c = conditioner(&[Ok(150), Ok(190), Ok(152)]);
        // Seed the trusted value.
        assert_eq!(c.read_filtered(false), Ok((150, false)));

        // +40 °C with the coil energized: contaminated.
        assert_eq!(c.read_filtered(true), Ok((150, true)));
        assert_eq!(c.last_known_safe_temp(), 150);

        // The de-energized follow-up is accepted and tracked.
        assert_eq!(c.read_filtered(false), Ok((152, false)));
        assert_eq!(c.last_known_safe_temp(), 152);
    }

    #[test]
    fn heater_on_within_band_is_accepted() {
        let mut c = conditioner(&[Ok(150), Ok(165)]);
        assert_eq!(c.read_filtered(false), Ok((150, false)));
        // +15 °C is inside the 20 °C band.
        assert_eq!(c.read_filtered(true), Ok((165, false)));
        assert_eq!(c.last_known_safe_temp(), 165);
    }

    #[test]
    fn heater_off_updates_unconditionally() {
        let mut c = conditioner(&[Ok(150), Ok(320)]);
        assert_eq!(c.read_filtered(false), Ok((150, false)));
        // A wild jump with the heater off is taken at face value.
        assert_eq!(c.read_filtered(false), Ok((320, false)));
        assert_eq!(c.last_known_safe_temp(), 320);
    }

    #[test]
    fn negative_reading_latches_below_zero() {
        let mut c = conditioner(&[Ok(-3), Ok(100)]);
        assert_eq!(c.read_raw(), Err(ThermocoupleFault::BelowZero));
        // Latched: the good sample behind it is never seen.
        assert_eq!(c.read_raw(), Err(ThermocoupleFault::BelowZero));
        assert_eq!(
            c.read_filtered(false),
            Err(ThermocoupleFault::BelowZero)
        );
    }

    #[test]
    fn single_zero_passes_two_latch() {
        let mut c = conditioner(&[Ok(0), Ok(120), Ok(0), Ok(0)]);
        // One zero could be a probe in ice water.
        assert_eq!(c.read_raw(), Ok(0));
        assert_eq!(c.read_raw(), Ok(120));
        // Two in a row is a stuck converter.
        assert_eq!(c.read_raw(), Ok(0));
        assert_eq!(c.read_raw(), Err(ThermocoupleFault::ZeroReading));
        // And it latches.
        assert_eq!(c.read_raw(), Err(ThermocoupleFault::ZeroReading));
    }

    #[test]
    fn saturation_is_recoverable() {
        let mut c = conditioner(&[Ok(420), Ok(120)]);
        assert_eq!(c.read_raw(), Err(ThermocoupleFault::AboveLimit));
        // Not latched: the next sample goes through.
        assert_eq!(c.read_raw(), Ok(120));
    }

    #[test]
    fn read_errors_pass_through_without_latching() {
        let mut c = conditioner(&[
            Err(ThermocoupleFault::ReadError),
            Ok(118),
        ]);
        assert_eq!(c.read_raw(), Err(ThermocoupleFault::ReadError));
        assert_eq!(c.read_raw(), Ok(118));
    }

    #[test]
    fn fatal_reader_faults_latch() {
        let mut c = conditioner(&[
            Err(ThermocoupleFault::InvalidReading),
            Ok(118),
        ]);
        assert_eq!(c.read_raw(), Err(ThermocoupleFault::InvalidReading));
        assert_eq!(c.read_raw(), Err(ThermocoupleFault::InvalidReading));
    }

    #[test]
    fn raw_reads_do_not_move_the_trusted_value() {
        let mut c = conditioner(&[Ok(150), Ok(200)]);
        assert_eq!(c.read_filtered(false), Ok((150, false)));
        assert_eq!(c.read_raw(), Ok(200));
        assert_eq!(c.last_known_safe_temp(), 150);
    }
}
