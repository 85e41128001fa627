//! Thermion - closed-loop heater tip controller firmware
//!
//! Main firmware binary for RP2040 boards (Raspberry Pi Pico wiring).
//! Holds a user-selected tip temperature with a PID over a conditioned
//! thermocouple, bounded sessions, and a safety supervisor.
//!
//! Hardware pin map (GPIO numbers, Pico):
//! - 25: onboard indicator LED
//! - 21 / 20: OLED I²C0 SCL / SDA (SSD1306 128x32)
//! - 16: buzzer (PWM slice 0 A)
//! - 13 / 12: rotary encoder CLK / DT
//! - 14: push button (also the rotary's switch)
//! - 6 / 7 / 8: thermocouple SCK / CS / SO (MAX6675, bit-banged)
//! - 22: heater output (PWM slice 3 A)

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{
    Adc, Channel as AdcChannel, Config as AdcConfig, InterruptHandler as AdcInterruptHandler,
};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::pwm::Pwm;
use embassy_rp::watchdog::Watchdog;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Instant, Timer};
use portable_atomic::Ordering;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use thermion_core::config::{self, Config};
use thermion_core::state::menu::{MenuItem, RotaryStep, Screen};
use thermion_core::state::shared::SharedState;
use thermion_core::tones;
use thermion_core::traits::display::{ErrorCode, StatusDisplay};
use thermion_core::traits::heater::HeaterDrive;
use thermion_core::traits::sensor::ThermocoupleReader;
use thermion_drivers::heater::ElementHeater;
use thermion_drivers::regulator::{Pid, PidTunings};
use thermion_drivers::sensor::{Conditioner, Max6675};

mod channels;
mod display;
mod pwm;
mod tasks;
mod time;
mod ui;

use crate::channels::{
    DisplayCmd, InputEvent, SharedHandle, DISPLAY_CHANNEL, INPUT_CHANNEL, LED_ON, SYSTEM_HEALTHY,
};

/// Default configuration compiled into the firmware. Edit config.txt
/// and rebuild to customize.
const EMBEDDED_CONFIG: &str = include_str!("../config.txt");

/// Main loop pacing.
const MAIN_LOOP_MS: u64 = 70;

bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

static SHARED: StaticCell<Mutex<CriticalSectionRawMutex, SharedState>> = StaticCell::new();
static HEATER: StaticCell<Mutex<CriticalSectionRawMutex, tasks::Heater>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Thermion firmware starting...");
    let p = embassy_rp::init(Default::default());

    // Onboard LED first: three short blinks say the core is alive even
    // if the display never comes up.
    let mut led = Output::new(p.PIN_25, Level::Low);
    for _ in 0..3 {
        led.set_high();
        Timer::after_millis(75).await;
        led.set_low();
        Timer::after_millis(75).await;
    }

    // OLED on I²C0.
    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = 200_000;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_21, p.PIN_20, i2c_config);
    let mut oled = display::OledDisplay::new(i2c);
    if oled.init().is_err() {
        error!("display init failed, cannot continue");
        display_failure_signal(&mut led).await;
    }

    // Embedded defaults, then the compiled-in config file on top.
    let mut config = Config::default();
    config::apply(EMBEDDED_CONFIG, &mut config);
    info!(
        "config: setpoint {}C, session {} ms, threshold {}",
        config.setpoint, config.session_timeout_ms, config.power_threshold
    );

    let _ = oled.show_startup_screen();

    // Buzzer self-check chirp.
    let mut buzzer = ui::Buzzer::new(Pwm::new_output_a(
        p.PWM_SLICE0,
        p.PIN_16,
        Default::default(),
    ));
    buzzer.play_blocking(tones::BOOT_OK);

    // Button held through power-on arms the watchdog; otherwise a
    // distinctive two-tone alert flags the unprotected boot.
    let button = Input::new(p.PIN_14, Pull::Down);
    let watchdog_enabled = button.is_high();
    if watchdog_enabled {
        info!("watchdog: on");
    } else {
        Timer::after_millis(150).await;
        for (i, &tone) in tones::WATCHDOG_OFF.iter().enumerate() {
            if i > 0 {
                Timer::after_millis(u64::from(tones::WATCHDOG_OFF_GAP_MS)).await;
            }
            buzzer.play_blocking(tone);
        }
        let _ = oled.show_watchdog_off_screen();
        warn!("watchdog: off");
    }

    // Thermocouple comes up before the heater can ever energize. The
    // converter wants settle time after power-on, and one filtered read
    // seeds the conditioner's trusted value.
    Timer::after_millis(700).await;
    let max6675 = Max6675::new(
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::High),
        Input::new(p.PIN_8, Pull::None),
        embassy_time::Delay,
    );
    let mut sensor = Conditioner::new(
        max6675,
        config.heater_on_temperature_difference_threshold,
        config.thermocouple_above_limit_c,
    );
    Timer::after_millis(350).await;
    let first_temp = match sensor.read_filtered(false) {
        Ok((temp, _)) => temp,
        Err(fault) => {
            error!("thermocouple setup failed: {:?}", fault);
            loop {
                let _ = oled.display_error(ErrorCode::ThermocoupleSetup, 0);
                Timer::after_millis(100).await;
            }
        }
    };
    info!("thermocouple ready: {}C", first_temp);

    // Regulator and heater. Changing the duty ceiling means retuning.
    let pid = Pid::new(
        PidTunings::from_scaled_1000(config.pid_kp_x1000, config.pid_ki_x1000, config.pid_kd_x1000),
        config.setpoint as i16,
    );
    let heater_pwm = pwm::HeaterPwm::new(Pwm::new_output_a(
        p.PWM_SLICE3,
        p.PIN_22,
        Default::default(),
    ));
    let mut element = ElementHeater::new(heater_pwm, config.heater_max_duty_cycle_percent);
    element.off();

    // ADC channel for the internal die temperature sensor.
    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let die_channel = AdcChannel::new_temp_sensor(p.ADC_TEMP_SENSOR);

    let mut state = SharedState::new(config);
    state.heater_temperature = first_temp;
    let shared: SharedHandle = SHARED.init(Mutex::new(state));
    let heater: tasks::HeaterHandle = HEATER.init(Mutex::new(element));

    let rotary_clk = Input::new(p.PIN_13, Pull::Up);
    let rotary_dt = Input::new(p.PIN_12, Pull::Up);

    spawner
        .spawn(tasks::control_task(shared, heater, pid, sensor))
        .unwrap();
    spawner
        .spawn(tasks::die_temp_task(shared, heater, adc, die_channel))
        .unwrap();
    spawner
        .spawn(tasks::input_task(rotary_clk, rotary_dt, button))
        .unwrap();
    spawner.spawn(tasks::buzzer_task(buzzer)).unwrap();
    spawner.spawn(display::display_task(oled, shared)).unwrap();
    info!("all tasks spawned");

    // Armed last, once everything that could hang during init is done.
    let mut watchdog = Watchdog::new(p.WATCHDOG);
    if watchdog_enabled {
        watchdog.start(Duration::from_millis(3_000));
    }

    // Main loop: input dispatch, session bookkeeping, display refresh,
    // LED, and the watchdog feed (only while healthy).
    let mut ui_sink = ui::UiQueue;
    loop {
        while let Ok(event) = INPUT_CHANNEL.try_receive() {
            handle_input(shared, heater, &mut ui_sink, event).await;
        }

        {
            let now = Instant::now().as_millis();
            let mut shared = shared.lock().await;
            let _ = shared.get_mode(now, &mut ui_sink);
            shared.poll_session_progress(now, &mut ui_sink);
        }

        let _ = DISPLAY_CHANNEL.try_send(DisplayCmd::Refresh);

        if LED_ON.load(Ordering::Relaxed) {
            led.set_high();
        } else {
            led.set_low();
        }

        if watchdog_enabled && SYSTEM_HEALTHY.load(Ordering::Relaxed) {
            watchdog.feed();
        }

        Timer::after_millis(MAIN_LOOP_MS).await;
    }
}

/// Dispatch one input event against the UI state.
async fn handle_input(
    shared: SharedHandle,
    heater: tasks::HeaterHandle,
    ui_sink: &mut ui::UiQueue,
    event: InputEvent,
) {
    use thermion_core::state::Mode;

    let now = Instant::now().as_millis();
    let mut shared = shared.lock().await;

    match event {
        InputEvent::Click => {
            if let Some(MenuItem::SetMode(mode)) = shared.ui.click() {
                if shared.set_mode(mode, now, ui_sink).is_err() {
                    warn!("mode change refused: fault latched");
                } else if mode == Mode::Off {
                    // Off takes effect now, not at the next tick.
                    heater.lock().await.off();
                }
            }
        }
        InputEvent::Rotate(step) => {
            if shared.ui.rotate(step) {
                return;
            }
            // Rotation on a screen belongs to that screen.
            match shared.ui.screen() {
                Some(Screen::Home) => {
                    let delta = match step {
                        RotaryStep::Cw => 1,
                        RotaryStep::Ccw => -1,
                    };
                    // Ignored during a session; the setpoint is pinned.
                    let _ = shared.adjust_setpoint(delta);
                }
                Some(Screen::DisplayContrast) => {
                    let delta: i16 = match step {
                        RotaryStep::Cw => 5,
                        RotaryStep::Ccw => -5,
                    };
                    shared.display_contrast =
                        (i16::from(shared.display_contrast) + delta).clamp(0, 255) as u8;
                }
                _ => {}
            }
        }
    }
}

/// The display never initialized: all we have is the LED. Three 200 ms
/// pulses, a second of dark, forever.
async fn display_failure_signal(led: &mut Output<'static>) -> ! {
    loop {
        for _ in 0..3 {
            led.set_high();
            Timer::after_millis(200).await;
            led.set_low();
            Timer::after_millis(200).await;
        }
        Timer::after_millis(1000).await;
    }
}
