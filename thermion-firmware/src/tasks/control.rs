//! Control tick task
//!
//! Drives the core orchestrator at the fixed control period. The heater
//! lives behind its own mutex so the die-temp supervisor can force it
//! off even while this task is gated.

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Ticker, Timer};
use portable_atomic::Ordering;

use thermion_core::control::{run_tick, TickOutcome, CONTROL_TICK_MS};
use thermion_core::traits::display::ErrorCode;
use thermion_drivers::heater::ElementHeater;
use thermion_drivers::regulator::Pid;
use thermion_drivers::sensor::{Conditioner, Max6675};

use crate::channels::{
    DisplayCmd, SharedHandle, CONTROL_GATE, DISPLAY_CHANNEL, SYSTEM_HEALTHY,
};
use crate::pwm::HeaterPwm;
use crate::time::{PauseDelay, UptimeClock};
use crate::ui::UiQueue;

/// The bit-banged thermocouple stack behind the conditioner.
pub type TipSensor =
    Conditioner<Max6675<Output<'static>, Output<'static>, Input<'static>, embassy_time::Delay>>;

/// The element heater on the PWM output.
pub type Heater = ElementHeater<HeaterPwm>;

/// Heater handle shared with the die-temp supervisor.
pub type HeaterHandle = &'static Mutex<CriticalSectionRawMutex, Heater>;

/// Refresh period of the fatal-fault error screen, ms.
const FATAL_REFRESH_MS: u64 = 500;

#[embassy_executor::task]
pub async fn control_task(
    shared: SharedHandle,
    heater: HeaterHandle,
    mut pid: Pid,
    mut sensor: TipSensor,
) {
    info!("Control task started ({} ms tick)", CONTROL_TICK_MS);

    let clock = UptimeClock;
    let mut delay = PauseDelay;
    let mut ui = UiQueue;
    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_TICK_MS));

    loop {
        ticker.next().await;
        if !CONTROL_GATE.load(Ordering::Relaxed) {
            continue;
        }

        let outcome = {
            let mut shared = shared.lock().await;
            let mut heater = heater.lock().await;
            run_tick(
                &mut shared,
                &mut pid,
                &mut *heater,
                &mut sensor,
                &mut ui,
                &clock,
                &mut delay,
            )
        };

        match outcome {
            TickOutcome::Regulated { power } => {
                trace!("tick: power bucket {}", power);
            }
            TickOutcome::Off => {}
            TickOutcome::FaultPause(fault) => {
                // Heater is already parked; the next tick retries.
                warn!("pausing heater: {:?}", fault);
            }
            TickOutcome::HeaterTooHot { temperature } => {
                warn!("heater too hot: {}C", temperature);
                let _ = DISPLAY_CHANNEL.try_send(DisplayCmd::Error {
                    code: ErrorCode::HeaterTooHot,
                    detail: temperature,
                });
            }
            TickOutcome::Fatal(fault) => {
                CONTROL_GATE.store(false, Ordering::Relaxed);
                SYSTEM_HEALTHY.store(false, Ordering::Relaxed);
                error!("stopped heater: {:?}", fault);

                // Hold the error on the glass and starve the watchdog;
                // the reboot clears the latch.
                let code = ErrorCode::from(fault);
                let detail = shared.lock().await.heater_temperature;
                loop {
                    DISPLAY_CHANNEL
                        .send(DisplayCmd::Error { code, detail })
                        .await;
                    Timer::after_millis(FATAL_REFRESH_MS).await;
                }
            }
        }
    }
}
