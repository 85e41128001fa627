//! Status display rendering
//!
//! Owns the OLED and renders whatever the UI state asks for. The
//! display task snapshots shared state under the lock and draws outside
//! it, so a slow I²C flush never holds up a tick context.

pub mod font;
pub mod ssd1306;

use core::fmt::Write as _;

use defmt::*;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use heapless::String;

use thermion_core::history::HISTORY_DEPTH;
use thermion_core::state::menu::{Screen, UiMode, MENU_ITEMS};
use thermion_core::state::shared::SharedState;
use thermion_core::traits::display::{
    DisplayError, ErrorCode, GraphData, HomeView, StatusDisplay,
};

use crate::channels::{DisplayCmd, SharedHandle, DISPLAY_CHANNEL};

use ssd1306::{Ssd1306, HEIGHT, TEXT_COLS, TEXT_ROWS, WIDTH};

/// One text line worth of formatting space.
type Line = String<{ TEXT_COLS as usize }>;

/// OLED-backed implementation of the core display surface.
pub struct OledDisplay<I2C> {
    oled: Ssd1306<I2C>,
    heartbeat: bool,
}

impl<I2C: embedded_hal::i2c::I2c> OledDisplay<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            oled: Ssd1306::new(i2c),
            heartbeat: false,
        }
    }

    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.oled.init().map_err(|_| DisplayError::Bus)
    }

    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), DisplayError> {
        self.oled.set_contrast(contrast).map_err(|_| DisplayError::Bus)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.oled.flush().map_err(|_| DisplayError::Bus)
    }

    /// Map a sample series onto the pixel grid, newest sample at the
    /// right edge, as single pixels or bottom-up bars.
    fn draw_series(&mut self, values: &[i16], lo: i16, hi: i16, bars: bool) {
        let span = i32::from(hi.max(lo + 1)) - i32::from(lo);
        let n = values.len().min(WIDTH);
        let x0 = WIDTH - n;
        for (i, &v) in values[values.len() - n..].iter().enumerate() {
            let clamped = v.clamp(lo, hi);
            let scaled = (i32::from(clamped) - i32::from(lo)) * (HEIGHT as i32 - 1) / span;
            let y = HEIGHT - 1 - scaled as usize;
            if bars {
                self.oled.draw_vbar(x0 + i, y);
            } else {
                self.oled.set_pixel(x0 + i, y);
            }
        }
    }

    fn scale_y(value: i16, lo: i16, hi: i16) -> usize {
        let span = i32::from(hi.max(lo + 1)) - i32::from(lo);
        let scaled =
            (i32::from(value.clamp(lo, hi)) - i32::from(lo)) * (HEIGHT as i32 - 1) / span;
        HEIGHT - 1 - scaled as usize
    }
}

fn series_bounds(values: &[i16]) -> (i16, i16) {
    let mut lo = i16::MAX;
    let mut hi = i16::MIN;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        (0, 1)
    } else {
        (lo.min(0), hi.max(lo + 1))
    }
}

impl<I2C: embedded_hal::i2c::I2c> StatusDisplay for OledDisplay<I2C> {
    fn show_startup_screen(&mut self) -> Result<(), DisplayError> {
        self.oled.clear();
        self.oled.draw_text(0, 4, "THERMION");
        self.oled.draw_text(1, 1, "heater controller");
        self.oled.draw_text(3, 6, concat!("v", env!("CARGO_PKG_VERSION")));
        self.flush()
    }

    fn show_watchdog_off_screen(&mut self) -> Result<(), DisplayError> {
        self.oled.clear();
        self.oled.draw_text(0, 3, "WATCHDOG OFF");
        self.oled.draw_text(2, 0, "no reboot on hang -");
        self.oled.draw_text(3, 0, "bench use only");
        self.flush()
    }

    fn show_home_screen(&mut self, view: &HomeView) -> Result<(), DisplayError> {
        self.oled.clear();

        let mut line: Line = String::new();
        let _ = write!(line, "SET {:>3}C", view.setpoint_c);
        self.oled.draw_text(0, 0, &line);
        self.oled
            .draw_text(0, TEXT_COLS - view.mode.label().len() as u8, view.mode.label());

        line.clear();
        let _ = write!(line, "TIP {:>3}C", view.temperature_c);
        self.oled.draw_text(1, 0, &line);
        line.clear();
        let _ = write!(line, "{:>3}W", view.watts);
        self.oled.draw_text(1, TEXT_COLS - 4, &line);

        line.clear();
        let _ = write!(
            line,
            "P{}.{:02} I{}.{:02} D{}.{:02}",
            view.pid.p_x100 / 100,
            (view.pid.p_x100 % 100).abs(),
            view.pid.i_x100 / 100,
            (view.pid.i_x100 % 100).abs(),
            view.pid.d_x100 / 100,
            (view.pid.d_x100 % 100).abs(),
        );
        self.oled.draw_text(2, 0, &line);

        line.clear();
        let _ = write!(line, "PWR {:>2}/10", view.power);
        self.oled.draw_text(3, 0, &line);
        if view.heater_on {
            self.oled.draw_text(3, 11, "HEATING");
        }
        if self.heartbeat {
            self.oled.draw_text(3, TEXT_COLS - 1, "*");
        }

        self.flush()
    }

    fn display_heartbeat(&mut self) -> Result<(), DisplayError> {
        self.heartbeat = !self.heartbeat;
        Ok(())
    }

    fn show_menu(&mut self, labels: &[&str], cursor: usize) -> Result<(), DisplayError> {
        self.oled.clear();

        // Keep the cursor on the glass: scroll the 4-row window.
        let rows = TEXT_ROWS as usize;
        let first = cursor.saturating_sub(rows - 1);
        for (row, (i, label)) in labels
            .iter()
            .enumerate()
            .skip(first)
            .take(rows)
            .enumerate()
        {
            let mut line: Line = String::new();
            let _ = write!(line, "{} {}", if i == cursor { '>' } else { ' ' }, label);
            self.oled.draw_text(row as u8, 0, &line);
            if i == cursor {
                self.oled.invert_region(row as u8, 0, TEXT_COLS - 1);
            }
        }
        self.flush()
    }

    fn display_selected_option(
        &mut self,
        screen: Screen,
        data: &GraphData<'_>,
    ) -> Result<(), DisplayError> {
        self.oled.clear();
        match screen {
            // Home goes through show_home_screen; nothing to draw here.
            Screen::Home => {}
            Screen::GraphSetpoint => {
                let (lo, hi) = series_bounds(data.temperatures);
                let hi = hi.max(data.setpoint_c as i16);
                self.draw_series(data.temperatures, lo, hi, false);
                self.oled
                    .draw_dotted_hline(Self::scale_y(data.setpoint_c as i16, lo, hi));
            }
            Screen::GraphLine => {
                let (lo, hi) = series_bounds(data.temperatures);
                self.draw_series(data.temperatures, lo, hi, false);
            }
            Screen::GraphBar => {
                let (lo, hi) = series_bounds(data.temperatures);
                self.draw_series(data.temperatures, lo, hi, true);
            }
            Screen::TempWattsLine => {
                let (t_lo, t_hi) = series_bounds(data.temperatures);
                self.draw_series(data.temperatures, t_lo, t_hi, false);
                let mut watts_i16 = [0i16; HISTORY_DEPTH];
                let n = data.watts.len().min(HISTORY_DEPTH);
                for (dst, &w) in watts_i16.iter_mut().zip(data.watts) {
                    *dst = w as i16;
                }
                let (w_lo, w_hi) = series_bounds(&watts_i16[..n]);
                self.draw_series(&watts_i16[..n], w_lo, w_hi, false);
            }
            Screen::WattsLine => {
                let mut watts_i16 = [0i16; HISTORY_DEPTH];
                let n = data.watts.len().min(HISTORY_DEPTH);
                for (dst, &w) in watts_i16.iter_mut().zip(data.watts) {
                    *dst = w as i16;
                }
                let (lo, hi) = series_bounds(&watts_i16[..n]);
                self.draw_series(&watts_i16[..n], lo, hi, false);
            }
            Screen::PiTemperature => {
                self.oled.draw_text(0, 0, "PI Temperature");
                let mut line: Line = String::new();
                let _ = write!(line, "{}C", data.pi_temperature_c);
                self.oled.draw_text(2, 0, &line);
            }
            Screen::DisplayContrast => {
                self.oled.draw_text(0, 0, "Display Contrast");
                let mut line: Line = String::new();
                let _ = write!(line, "{:>3}", data.contrast);
                self.oled.draw_text(2, 0, &line);
                self.oled.draw_text(3, 0, "turn to adjust");
            }
        }
        self.flush()
    }

    fn display_error(&mut self, code: ErrorCode, detail: i16) -> Result<(), DisplayError> {
        self.oled.clear();
        self.oled.draw_text(0, 0, "ERROR");
        self.oled.draw_text(1, 0, code.as_str());
        let mut line: Line = String::new();
        let _ = write!(line, "reading: {}", detail);
        self.oled.draw_text(2, 0, &line);
        self.flush()
    }
}

/// Flat copy of everything a frame needs, taken under the lock.
struct Snapshot {
    ui: UiMode,
    home: HomeView,
    temps: [i16; HISTORY_DEPTH],
    temps_len: usize,
    watts: [u16; HISTORY_DEPTH],
    watts_len: usize,
    setpoint: u16,
    pi_temperature: i16,
    contrast: u8,
}

impl Snapshot {
    fn take(shared: &SharedState) -> Self {
        let mut temps = [0i16; HISTORY_DEPTH];
        let temps_len = shared.temperature_readings.copy_values_into(&mut temps);
        let mut watts = [0u16; HISTORY_DEPTH];
        let watts_len = shared.watt_readings.copy_values_into(&mut watts);

        Self {
            ui: shared.ui,
            home: HomeView {
                temperature_c: shared.heater_temperature,
                setpoint_c: shared.setpoint,
                mode: shared.mode(),
                watts: shared.watts,
                power: shared.last_power,
                // The control tick zeroes watts whenever it parks the
                // heater, so this tracks the drive state.
                heater_on: shared.watts > 0,
                pid: shared.pid_terms,
            },
            temps,
            temps_len,
            watts,
            watts_len,
            setpoint: shared.setpoint,
            pi_temperature: shared.pi_temperature,
            contrast: shared.display_contrast,
        }
    }
}

#[embassy_executor::task]
pub async fn display_task(
    mut display: OledDisplay<I2c<'static, I2C0, Blocking>>,
    shared: SharedHandle,
) {
    info!("Display task started");

    let mut labels: [&'static str; MENU_ITEMS.len()] = [""; MENU_ITEMS.len()];
    for (slot, item) in labels.iter_mut().zip(MENU_ITEMS.iter()) {
        *slot = item.label();
    }
    let mut applied_contrast: Option<u8> = None;

    loop {
        let result = match DISPLAY_CHANNEL.receive().await {
            DisplayCmd::Refresh => {
                let snap = {
                    let shared = shared.lock().await;
                    Snapshot::take(&shared)
                };

                if applied_contrast != Some(snap.contrast) {
                    let _ = display.set_contrast(snap.contrast);
                    applied_contrast = Some(snap.contrast);
                }

                match snap.ui {
                    UiMode::InMenu { cursor } => display.show_menu(&labels, cursor),
                    UiMode::Viewing(Screen::Home) => {
                        let _ = display.display_heartbeat();
                        display.show_home_screen(&snap.home)
                    }
                    UiMode::Viewing(screen) => {
                        let data = GraphData {
                            temperatures: &snap.temps[..snap.temps_len],
                            watts: &snap.watts[..snap.watts_len],
                            setpoint_c: snap.setpoint,
                            pi_temperature_c: snap.pi_temperature,
                            contrast: snap.contrast,
                        };
                        display.display_selected_option(screen, &data)
                    }
                }
            }
            DisplayCmd::Error { code, detail } => display.display_error(code, detail),
        };

        if result.is_err() {
            warn!("display write failed");
        }
    }
}
