//! Rotary encoder and push button task
//!
//! Decodes quadrature signals with a small state machine for noise
//! rejection and debounces the push button. Events land on the input
//! channel for the main loop to dispatch.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Instant, Timer};

use thermion_core::state::menu::RotaryStep;

use crate::channels::{InputEvent, INPUT_CHANNEL};

/// Poll cadence, ms. Detents arrive far slower than this.
const POLL_MS: u64 = 2;

/// Button debounce window.
const DEBOUNCE: Duration = Duration::from_millis(30);

/// Encoder state machine states.
#[derive(Clone, Copy, PartialEq)]
enum State {
    Idle,
    CwStep1,
    CwStep2,
    CcwStep1,
    CcwStep2,
}

/// Quadrature decoder.
///
/// CW: CLK falls first; CCW: DT falls first. A half-step that returns
/// to idle is treated as bounce and dropped.
struct Encoder {
    state: State,
    last_clk: bool,
    last_dt: bool,
}

impl Encoder {
    fn new(clk: bool, dt: bool) -> Self {
        Self {
            state: State::Idle,
            last_clk: clk,
            last_dt: dt,
        }
    }

    fn sample(&mut self, clk: bool, dt: bool) -> Option<RotaryStep> {
        if clk == self.last_clk && dt == self.last_dt {
            return None;
        }
        let step = self.decode(clk, dt);
        self.last_clk = clk;
        self.last_dt = dt;
        step
    }

    fn decode(&mut self, clk: bool, dt: bool) -> Option<RotaryStep> {
        match self.state {
            State::Idle => {
                if !clk && dt {
                    self.state = State::CwStep1;
                } else if clk && !dt {
                    self.state = State::CcwStep1;
                }
                None
            }
            State::CwStep1 => {
                if !clk && !dt {
                    self.state = State::CwStep2;
                } else if clk && dt {
                    self.state = State::Idle;
                }
                None
            }
            State::CwStep2 => {
                if clk || dt {
                    self.state = State::Idle;
                    return Some(RotaryStep::Cw);
                }
                None
            }
            State::CcwStep1 => {
                if !clk && !dt {
                    self.state = State::CcwStep2;
                } else if clk && dt {
                    self.state = State::Idle;
                }
                None
            }
            State::CcwStep2 => {
                if clk || dt {
                    self.state = State::Idle;
                    return Some(RotaryStep::Ccw);
                }
                None
            }
        }
    }
}

#[embassy_executor::task]
pub async fn input_task(clk: Input<'static>, dt: Input<'static>, button: Input<'static>) {
    info!("Input task started");

    let mut encoder = Encoder::new(clk.is_high(), dt.is_high());
    let mut button_was_pressed = button.is_high();
    let mut last_edge = Instant::now();

    loop {
        Timer::after_millis(POLL_MS).await;

        if let Some(step) = encoder.sample(clk.is_high(), dt.is_high()) {
            let _ = INPUT_CHANNEL.try_send(InputEvent::Rotate(step));
        }

        // Button is wired active-high; a debounced press is one click.
        let pressed = button.is_high();
        if pressed != button_was_pressed {
            let now = Instant::now();
            if now - last_edge >= DEBOUNCE {
                if pressed {
                    let _ = INPUT_CHANNEL.try_send(InputEvent::Click);
                }
                button_was_pressed = pressed;
            }
            last_edge = now;
        }
    }
}
