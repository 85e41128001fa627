//! Inter-task communication
//!
//! Static channels and gates shared between Embassy tasks. Uses
//! embassy-sync primitives for safe async communication; the two
//! booleans are plain atomics because their readers poll them at tick
//! boundaries.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use portable_atomic::AtomicBool;

use thermion_core::state::menu::RotaryStep;
use thermion_core::state::shared::SharedState;
use thermion_core::tones::Tone;
use thermion_core::traits::display::ErrorCode;

/// Input events from the rotary encoder and push button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    Rotate(RotaryStep),
    Click,
}

/// Buzzer queue entries: a note or a gap inside a sequence.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToneCmd {
    Note(Tone),
    Rest(u16),
}

/// Display task commands.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayCmd {
    /// Redraw whatever the UI state says is on the glass.
    Refresh,
    /// Error page; `detail` is the reading that tripped it.
    Error { code: ErrorCode, detail: i16 },
}

/// Shared-state handle passed to every task.
pub type SharedHandle = &'static Mutex<CriticalSectionRawMutex, SharedState>;

pub static INPUT_CHANNEL: Channel<CriticalSectionRawMutex, InputEvent, 8> = Channel::new();

pub static TONE_CHANNEL: Channel<CriticalSectionRawMutex, ToneCmd, 8> = Channel::new();

pub static DISPLAY_CHANNEL: Channel<CriticalSectionRawMutex, DisplayCmd, 4> = Channel::new();

/// Control tick gate. Cleared by the die-temp supervisor while the chip
/// is over temperature, and permanently on a fatal fault. In-flight
/// ticks finish; the next wakeup sees the gate closed.
pub static CONTROL_GATE: AtomicBool = AtomicBool::new(true);

/// Watchdog feed gate. Cleared on any fatal escalation; the main loop
/// stops feeding and the watchdog reboots into a safe state.
pub static SYSTEM_HEALTHY: AtomicBool = AtomicBool::new(true);

/// Requested indicator LED state; the main loop applies it to the pin.
pub static LED_ON: AtomicBool = AtomicBool::new(false);
