//! System state: operating modes, menu navigation, and the shared
//! aggregate every context reads and writes through.

pub mod menu;
pub mod mode;
pub mod shared;

pub use menu::{MenuItem, RotaryStep, Screen, UiMode, MENU_ITEMS};
pub use mode::Mode;
pub use shared::{ModeError, SharedState, SETPOINT_NEAR_BAND};
