//! PID regulator implementation

pub mod fixed;
pub mod pid;

pub use fixed::Fixed32;
pub use pid::{Pid, PidTunings};
