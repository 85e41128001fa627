//! Hardware abstraction traits

pub mod display;
pub mod heater;
pub mod regulator;
pub mod sensor;
pub mod ui;

pub use display::{DisplayError, ErrorCode, GraphData, HomeView, StatusDisplay};
pub use heater::{HeaterDrive, HeaterKind, MAX_POWER};
pub use regulator::{PidTerms, Regulator};
pub use sensor::{FaultSeverity, ThermocoupleFault, ThermocoupleReader};
pub use ui::UiSignals;
