//! Buzzer tone vocabulary
//!
//! Every audible cue the firmware makes, in one place. Playback is a
//! collaborator behind [`crate::traits::UiSignals`]; these tables only
//! name the notes.

/// A single buzzer note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    pub freq_hz: u16,
    pub duration_ms: u16,
}

const fn tone(freq_hz: u16, duration_ms: u16) -> Tone {
    Tone {
        freq_hz,
        duration_ms,
    }
}

/// Silence between the notes of the session-end alarm.
pub const SEQUENCE_GAP_MS: u16 = 200;

/// Silence between the notes of the watchdog-off acknowledgment.
pub const WATCHDOG_OFF_GAP_MS: u16 = 150;

/// Startup self-check chirp.
pub const BOOT_OK: Tone = tone(2500, 200);

/// Two descending notes: the watchdog stays disabled this boot.
pub const WATCHDOG_OFF: [Tone; 2] = [tone(2000, 250), tone(1000, 250)];

/// Single chime when a session first comes within the setpoint band.
pub const SETPOINT_REACHED: Tone = tone(1500, 350);

/// Three descending notes marking the end of a session.
pub const SESSION_END: [Tone; 3] = [tone(1500, 200), tone(1000, 200), tone(500, 200)];
