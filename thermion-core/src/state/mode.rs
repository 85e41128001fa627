//! Operating modes

/// Operating mode of the controller.
///
/// - `Off`: regulator output is discarded and the heater is forced off.
/// - `Manual`: regulator drives the heater until the user turns it off.
/// - `Session`: like `Manual`, but ends automatically once the session
///   timeout elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    #[default]
    Off,
    Manual,
    Session,
}

impl Mode {
    /// Whether the regulator may energize the heater in this mode.
    pub fn heater_allowed(&self) -> bool {
        !matches!(self, Mode::Off)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Off => "Off",
            Mode::Manual => "Manual",
            Mode::Session => "Session",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heater_gating() {
        assert!(!Mode::Off.heater_allowed());
        assert!(Mode::Manual.heater_allowed());
        assert!(Mode::Session.heater_allowed());
    }
}
