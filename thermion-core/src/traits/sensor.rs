//! Thermocouple reading and fault taxonomy

/// Whether a fault clears on its own or needs a reboot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultSeverity {
    /// Expected to clear within a tick or two; the control loop parks
    /// the heater and retries.
    Recoverable,
    /// The heater is locked out and the control tick stops until reboot.
    Fatal,
}

/// Classified thermocouple fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermocoupleFault {
    /// Malformed frame from the converter.
    InvalidReading,
    /// Reading stuck at exactly zero.
    ZeroReading,
    /// Negative reading.
    BelowZero,
    /// Reading at or past the sensor saturation ceiling.
    AboveLimit,
    /// The converter signalled an open/short/ground condition.
    ReadError,
}

impl ThermocoupleFault {
    pub fn severity(&self) -> FaultSeverity {
        match self {
            Self::InvalidReading | Self::ZeroReading | Self::BelowZero => FaultSeverity::Fatal,
            Self::AboveLimit | Self::ReadError => FaultSeverity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == FaultSeverity::Fatal
    }
}

/// Conditioned thermocouple source.
pub trait ThermocoupleReader {
    /// Unfiltered whole-degree sample.
    fn read_raw(&mut self) -> Result<i16, ThermocoupleFault>;

    /// Induction-aware filtered sample.
    ///
    /// Returns the accepted temperature plus a flag asking the caller to
    /// de-energize the heater, wait for the field to decay, and re-read
    /// with `heater_is_on = false` before trusting the next sample.
    fn read_filtered(&mut self, heater_is_on: bool) -> Result<(i16, bool), ThermocoupleFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_kinds() {
        assert!(ThermocoupleFault::InvalidReading.is_fatal());
        assert!(ThermocoupleFault::ZeroReading.is_fatal());
        assert!(ThermocoupleFault::BelowZero.is_fatal());
    }

    #[test]
    fn recoverable_kinds() {
        assert_eq!(
            ThermocoupleFault::AboveLimit.severity(),
            FaultSeverity::Recoverable
        );
        assert_eq!(
            ThermocoupleFault::ReadError.severity(),
            FaultSeverity::Recoverable
        );
    }
}
