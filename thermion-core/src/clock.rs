//! Time sources for the control path
//!
//! The firmware backs these with `embassy-time`; host tests use
//! hand-advanced fakes so every timing-sensitive path is exercisable
//! without a target board.

/// Monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since boot. Never goes backwards.
    fn now_ms(&self) -> u64;
}

/// Short blocking pause inside a tick context.
///
/// Only the control tick's deliberate off-read settle uses this; every
/// other wait in the system is scheduled, not blocked.
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}
