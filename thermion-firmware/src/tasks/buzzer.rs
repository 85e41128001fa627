//! Buzzer task
//!
//! Drains the tone queue one entry at a time, so a queued sequence
//! plays back-to-back with its gaps without blocking whoever queued it.

use defmt::*;
use embassy_time::Timer;

use crate::channels::{ToneCmd, TONE_CHANNEL};
use crate::ui::Buzzer;

#[embassy_executor::task]
pub async fn buzzer_task(mut buzzer: Buzzer) {
    info!("Buzzer task started");

    loop {
        match TONE_CHANNEL.receive().await {
            ToneCmd::Note(tone) => buzzer.play(tone).await,
            ToneCmd::Rest(ms) => Timer::after_millis(u64::from(ms)).await,
        }
    }
}
