//! Die-temperature supervisor task
//!
//! Reads the RP2040's internal temperature sensor on the slow tick. If
//! the die runs past its limit the control tick is gated off and the
//! heater forced down until the reading clears; a failed read escalates
//! to a held error screen with the watchdog starved.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel as AdcChannel, Error as AdcError};
use embassy_time::{Duration, Ticker, Timer};
use portable_atomic::Ordering;

use thermion_core::control::DIE_TEMP_TICK_MS;
use thermion_core::safety::{DieTempGuard, DieTempStatus};
use thermion_core::traits::display::ErrorCode;
use thermion_core::traits::heater::HeaterDrive;

use crate::channels::{
    DisplayCmd, SharedHandle, CONTROL_GATE, DISPLAY_CHANNEL, SYSTEM_HEALTHY,
};
use crate::tasks::control::HeaterHandle;

/// Re-read cadence inside the over-temperature hold, ms.
const COOLDOWN_POLL_MS: u64 = 250;

#[embassy_executor::task]
pub async fn die_temp_task(
    shared: SharedHandle,
    heater: HeaterHandle,
    mut adc: Adc<'static, Async>,
    mut sensor: AdcChannel<'static>,
) {
    info!("Die-temp task started ({} ms tick)", DIE_TEMP_TICK_MS);

    let guard = {
        let shared = shared.lock().await;
        DieTempGuard::new(shared.config.pi_temperature_limit)
    };
    let mut ticker = Ticker::every(Duration::from_millis(DIE_TEMP_TICK_MS));

    loop {
        ticker.next().await;

        let mut reading = match read_die_celsius(&mut adc, &mut sensor).await {
            Ok(temp) => temp,
            Err(_) => {
                escalate_read_failure(heater).await;
                continue;
            }
        };
        shared.lock().await.pi_temperature = reading;

        if guard.check(reading) == DieTempStatus::Normal {
            CONTROL_GATE.store(true, Ordering::Relaxed);
            continue;
        }

        // Too hot: park everything and sit on the error screen until
        // the die cools back under the limit.
        warn!("die too hot: {}C (limit {}C)", reading, guard.limit_c());
        CONTROL_GATE.store(false, Ordering::Relaxed);
        heater.lock().await.off();

        while guard.check(reading) == DieTempStatus::OverLimit {
            let _ = DISPLAY_CHANNEL.try_send(DisplayCmd::Error {
                code: ErrorCode::PiTooHot,
                detail: reading,
            });
            Timer::after_millis(COOLDOWN_POLL_MS).await;

            match read_die_celsius(&mut adc, &mut sensor).await {
                Ok(temp) => {
                    reading = temp;
                    shared.lock().await.pi_temperature = temp;
                }
                Err(_) => {
                    escalate_read_failure(heater).await;
                    break;
                }
            }
        }

        info!("die back under limit, control resumed");
        CONTROL_GATE.store(true, Ordering::Relaxed);
    }
}

/// Convert one ADC read of the internal sensor to °C.
///
/// Datasheet formula T = 27 - (V_be - 0.706 V) / 1.721 mV, done in
/// integer microvolts against the 3.3 V rail.
async fn read_die_celsius(
    adc: &mut Adc<'static, Async>,
    sensor: &mut AdcChannel<'static>,
) -> Result<i16, AdcError> {
    let raw = adc.read(sensor).await?;
    let microvolts = u64::from(raw) * 3_300_000 / 4096;
    let delta = microvolts as i64 - 706_000;
    Ok((27 - delta / 1721) as i16)
}

/// The die sensor itself failed: force outputs safe, hold the error,
/// and let the starved watchdog reboot us.
async fn escalate_read_failure(heater: HeaterHandle) {
    error!("die temperature read failed");
    SYSTEM_HEALTHY.store(false, Ordering::Relaxed);
    CONTROL_GATE.store(false, Ordering::Relaxed);
    heater.lock().await.off();

    loop {
        DISPLAY_CHANNEL
            .send(DisplayCmd::Error {
                code: ErrorCode::PiReadError,
                detail: 0,
            })
            .await;
        Timer::after_millis(500).await;
    }
}
