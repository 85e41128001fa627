//! User feedback plumbing: buzzer driver and the UiSignals sink
//!
//! Core code asks for feedback through `UiSignals`; the implementation
//! here queues notes onto the buzzer task and parks the LED request in
//! an atomic the main loop applies. Nothing in core ever blocks on a
//! speaker.

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::{block_for, Duration, Timer};
use fixed::traits::ToFixed;
use portable_atomic::Ordering;

use thermion_core::tones::Tone;
use thermion_core::traits::ui::UiSignals;

use crate::channels::{ToneCmd, LED_ON, TONE_CHANNEL};

/// PWM clock divider: 125 MHz system clock / 125 = 1 MHz tick, so the
/// wrap value is just 1_000_000 / frequency.
const PWM_DIVIDER: u8 = 125;
const PWM_TICK_HZ: u32 = 1_000_000;

/// Piezo buzzer on a PWM slice.
pub struct Buzzer {
    pwm: Pwm<'static>,
    config: PwmConfig,
}

impl Buzzer {
    pub fn new(pwm: Pwm<'static>) -> Self {
        let mut config = PwmConfig::default();
        config.divider = PWM_DIVIDER.to_fixed();
        config.compare_a = 0;
        Self { pwm, config }
    }

    fn start(&mut self, freq_hz: u16) {
        let top = (PWM_TICK_HZ / u32::from(freq_hz.max(1))).min(u32::from(u16::MAX)) as u16;
        self.config.top = top;
        // Soft volume: well under 50 % duty.
        self.config.compare_a = top / 8;
        self.pwm.set_config(&self.config);
    }

    fn mute(&mut self) {
        self.config.compare_a = 0;
        self.pwm.set_config(&self.config);
    }

    /// Play one note, yielding while it sounds.
    pub async fn play(&mut self, tone: Tone) {
        self.start(tone.freq_hz);
        Timer::after_millis(u64::from(tone.duration_ms)).await;
        self.mute();
    }

    /// Blocking play for the boot sequence, before tasks exist.
    pub fn play_blocking(&mut self, tone: Tone) {
        self.start(tone.freq_hz);
        block_for(Duration::from_millis(u64::from(tone.duration_ms)));
        self.mute();
    }
}

/// `UiSignals` sink used from core accessors.
///
/// Queue overflow drops notes rather than blocking a tick context; the
/// queue is sized for the longest sequence plus slack.
pub struct UiQueue;

impl UiSignals for UiQueue {
    fn led(&mut self, on: bool) {
        LED_ON.store(on, Ordering::Relaxed);
    }

    fn tone(&mut self, tone: Tone) {
        let _ = TONE_CHANNEL.try_send(ToneCmd::Note(tone));
    }

    fn rest(&mut self, ms: u16) {
        let _ = TONE_CHANNEL.try_send(ToneCmd::Rest(ms));
    }
}
