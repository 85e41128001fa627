//! Narrow display surface consumed by the core
//!
//! Rendering lives in the firmware crate; the core only names screens
//! and hands over snapshots of what to draw.

use crate::state::menu::Screen;
use crate::state::mode::Mode;
use crate::traits::regulator::PidTerms;
use crate::traits::sensor::ThermocoupleFault;

/// Errors that can occur talking to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// I²C transaction failed.
    Bus,
}

/// Error codes shown on the error screen, `system-error_code` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    DisplaySetup,
    HeaterTooHot,
    PiTooHot,
    PiReadError,
    ThermocoupleSetup,
    ThermocoupleInvalidReading,
    ThermocoupleZeroReading,
    ThermocoupleBelowZero,
    ThermocoupleAboveLimit,
    ThermocoupleReadError,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisplaySetup => "display-setup",
            Self::HeaterTooHot => "heater-too_hot",
            Self::PiTooHot => "pi-too_hot",
            Self::PiReadError => "pi-read_error",
            Self::ThermocoupleSetup => "thermocouple-setup",
            Self::ThermocoupleInvalidReading => "thermocouple-invalid_reading",
            Self::ThermocoupleZeroReading => "thermocouple-zero_reading",
            Self::ThermocoupleBelowZero => "thermocouple-below_zero",
            Self::ThermocoupleAboveLimit => "thermocouple-above_limit",
            Self::ThermocoupleReadError => "thermocouple-read_error",
            Self::Unknown => "unknown_error",
        }
    }
}

impl From<ThermocoupleFault> for ErrorCode {
    fn from(fault: ThermocoupleFault) -> Self {
        match fault {
            ThermocoupleFault::InvalidReading => Self::ThermocoupleInvalidReading,
            ThermocoupleFault::ZeroReading => Self::ThermocoupleZeroReading,
            ThermocoupleFault::BelowZero => Self::ThermocoupleBelowZero,
            ThermocoupleFault::AboveLimit => Self::ThermocoupleAboveLimit,
            ThermocoupleFault::ReadError => Self::ThermocoupleReadError,
        }
    }
}

/// Snapshot of everything the home screen draws.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomeView {
    pub temperature_c: i16,
    pub setpoint_c: u16,
    pub mode: Mode,
    pub watts: u16,
    pub power: u8,
    pub heater_on: bool,
    pub pid: PidTerms,
}

/// Data behind the non-home screens.
///
/// The display task snapshots shared state into flat sample buffers
/// (newest last) before rendering, so the mutex is never held while the
/// frame goes out over I²C.
#[derive(Debug, Clone, Copy)]
pub struct GraphData<'a> {
    pub temperatures: &'a [i16],
    pub watts: &'a [u16],
    pub setpoint_c: u16,
    pub pi_temperature_c: i16,
    pub contrast: u8,
}

/// Trait for the status display.
///
/// The firmware implements this over the OLED driver.
pub trait StatusDisplay {
    /// Firmware name/version splash at boot.
    fn show_startup_screen(&mut self) -> Result<(), DisplayError>;

    /// Reminder that the watchdog is disabled this boot.
    fn show_watchdog_off_screen(&mut self) -> Result<(), DisplayError>;

    /// Regular status page.
    fn show_home_screen(&mut self, view: &HomeView) -> Result<(), DisplayError>;

    /// Liveness marker in a screen corner.
    fn display_heartbeat(&mut self) -> Result<(), DisplayError>;

    /// The menu list with a cursor on one row.
    fn show_menu(&mut self, labels: &[&str], cursor: usize) -> Result<(), DisplayError>;

    /// One of the non-home screens selected from the menu.
    fn display_selected_option(
        &mut self,
        screen: Screen,
        data: &GraphData<'_>,
    ) -> Result<(), DisplayError>;

    /// Error page with code and detail.
    fn display_error(&mut self, code: ErrorCode, detail: i16) -> Result<(), DisplayError>;
}
