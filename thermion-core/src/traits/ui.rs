//! Indicator LED and buzzer seam
//!
//! Mode accessors on `SharedState` decide *when* user feedback fires;
//! this trait is where it goes. The firmware implementation queues the
//! notes onto a channel drained by the buzzer task, so the once-only
//! guarantees reduce to "enqueued exactly once" in core logic.

use crate::tones::Tone;

pub trait UiSignals {
    /// Set the indicator LED.
    fn led(&mut self, on: bool);

    /// Sound one note.
    fn tone(&mut self, tone: Tone);

    /// Silence between the notes of a sequence.
    fn rest(&mut self, ms: u16);

    /// Play a note sequence with a fixed gap between notes.
    fn sequence(&mut self, tones: &[Tone], gap_ms: u16) {
        for (i, &t) in tones.iter().enumerate() {
            if i > 0 {
                self.rest(gap_ms);
            }
            self.tone(t);
        }
    }
}
