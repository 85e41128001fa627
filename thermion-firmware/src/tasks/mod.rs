//! Embassy tasks

pub mod buzzer;
pub mod control;
pub mod die_temp;
pub mod input;

pub use buzzer::buzzer_task;
pub use control::{control_task, Heater, HeaterHandle, TipSensor};
pub use die_temp::die_temp_task;
pub use input::input_task;
