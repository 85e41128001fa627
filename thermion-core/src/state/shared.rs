//! Shared system state
//!
//! One aggregate owns every mutable field; tick contexts and the main
//! loop reach it through a handle. The accessors with side effects
//! (`get_mode`, `set_mode`, `poll_session_progress`) keep their
//! once-only guarantees here rather than trusting every caller.

use crate::config::Config;
use crate::history::History;
use crate::tones;
use crate::traits::regulator::PidTerms;
use crate::traits::sensor::ThermocoupleFault;
use crate::traits::ui::UiSignals;

use super::menu::UiMode;
use super::mode::Mode;

/// A session counts as "at temperature" within this band below the
/// setpoint, °C.
pub const SETPOINT_NEAR_BAND: i16 = 8;

/// Why a mode change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeError {
    /// A fatal thermocouple fault is latched; only a reboot clears it.
    FaultLatched,
}

/// All mutable system state.
///
/// Constructed once at boot. Field groups: configuration (constant after
/// boot), fast control state (written by the control tick and the mode
/// accessors), and slow UI state (main loop only).
pub struct SharedState {
    /// Configuration; constant after boot.
    pub config: Config,

    // --- fast control state ---
    /// Latest accepted tip temperature, °C.
    pub heater_temperature: i16,
    /// Electrical power at the last commanded drive state, W.
    pub watts: u16,
    /// RP2040 die temperature, °C.
    pub pi_temperature: i16,
    /// Tip temperature over time, one entry per control tick.
    pub temperature_readings: History<i16>,
    /// Heating power over time, one entry per control tick.
    pub watt_readings: History<u16>,
    /// Diagnostic P/I/D breakdown of the last regulator update.
    pub pid_terms: PidTerms,
    /// Power bucket the regulator last produced.
    pub last_power: u8,

    /// Regulator target, °C. Edited from the menu, synced into the
    /// regulator at the top of every control tick.
    pub setpoint: u16,
    /// True once the current session has come within the setpoint band.
    pub session_setpoint_reached: bool,

    mode: Mode,
    session_start_time: Option<u64>,
    pid_reset_pending: bool,
    latched_fault: Option<ThermocoupleFault>,

    // --- slow UI state ---
    /// Menu/screen navigation.
    pub ui: UiMode,
    /// OLED contrast, editable from the contrast screen.
    pub display_contrast: u8,
}

impl SharedState {
    pub fn new(config: Config) -> Self {
        Self {
            setpoint: config.setpoint,
            display_contrast: config.display_contrast,
            config,
            heater_temperature: 0,
            watts: 0,
            pi_temperature: 0,
            temperature_readings: History::new(),
            watt_readings: History::new(),
            pid_terms: PidTerms::default(),
            last_power: 0,
            session_setpoint_reached: false,
            mode: Mode::Off,
            session_start_time: None,
            pid_reset_pending: false,
            latched_fault: None,
            ui: UiMode::default(),
        }
    }

    /// Current mode, applying the once-only Session expiry transition.
    ///
    /// The mode is committed to `Off` *before* any feedback is emitted,
    /// so a re-entrant call during tone playback already sees `Off` and
    /// cannot fire the alarm twice.
    pub fn get_mode(&mut self, now_ms: u64, ui: &mut impl UiSignals) -> Mode {
        if self.mode == Mode::Session {
            let expired = match self.session_start_time {
                Some(start) => {
                    now_ms.saturating_sub(start) >= u64::from(self.config.session_timeout_ms)
                }
                // A session without a start stamp has nothing to wait for.
                None => true,
            };
            if expired {
                self.mode = Mode::Off;
                self.session_start_time = None;
                self.session_setpoint_reached = false;
                ui.led(false);
                ui.sequence(&tones::SESSION_END, tones::SEQUENCE_GAP_MS);
            }
        }
        self.mode
    }

    /// Mode without the expiry side effects, for display paths.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch modes.
    ///
    /// `Off` clears session timing and the LED. `Manual` and `Session`
    /// light the LED and schedule a regulator reset; `Session` also
    /// stamps the start time. Refused while a fatal fault is latched.
    pub fn set_mode(
        &mut self,
        new: Mode,
        now_ms: u64,
        ui: &mut impl UiSignals,
    ) -> Result<(), ModeError> {
        if self.latched_fault.is_some() && new != Mode::Off {
            return Err(ModeError::FaultLatched);
        }

        self.session_setpoint_reached = false;
        self.session_start_time = match new {
            Mode::Session => Some(now_ms),
            Mode::Off | Mode::Manual => None,
        };
        self.mode = new;

        if new == Mode::Off {
            ui.led(false);
        } else {
            ui.led(true);
            self.pid_reset_pending = true;
        }
        Ok(())
    }

    /// Milliseconds spent in the current session, zero outside one.
    pub fn session_duration_ms(&self, now_ms: u64) -> u64 {
        match (self.mode, self.session_start_time) {
            (Mode::Session, Some(start)) => now_ms.saturating_sub(start),
            _ => 0,
        }
    }

    /// Main-loop session bookkeeping: the first sample inside the
    /// setpoint band chimes once and (optionally) schedules a regulator
    /// reset to shed the cold-start integral.
    pub fn poll_session_progress(&mut self, now_ms: u64, ui: &mut impl UiSignals) {
        if self.get_mode(now_ms, ui) != Mode::Session || self.session_setpoint_reached {
            return;
        }
        if self.heater_temperature >= self.setpoint as i16 - SETPOINT_NEAR_BAND {
            self.session_setpoint_reached = true;
            ui.tone(tones::SETPOINT_REACHED);
            if self.config.session_reset_pid_when_near_setpoint {
                self.pid_reset_pending = true;
            }
        }
    }

    /// Consume the pending regulator reset request. Control tick only.
    pub fn take_pid_reset(&mut self) -> bool {
        core::mem::take(&mut self.pid_reset_pending)
    }

    /// Latch a fatal thermocouple fault. The watchdog starves from here
    /// on and mode changes are refused until reboot.
    pub fn latch_fault(&mut self, fault: ThermocoupleFault) {
        if self.latched_fault.is_none() {
            self.latched_fault = Some(fault);
        }
    }

    pub fn latched_fault(&self) -> Option<ThermocoupleFault> {
        self.latched_fault
    }

    /// Watchdog feed gate: false once a fatal fault is latched.
    pub fn system_healthy(&self) -> bool {
        self.latched_fault.is_none()
    }

    /// Setpoint edit from the rotary. Rejected during a session.
    pub fn adjust_setpoint(&mut self, delta: i16) -> bool {
        if self.mode == Mode::Session {
            return false;
        }
        let new = (self.setpoint as i16).saturating_add(delta);
        self.setpoint = (new.max(1) as u16).min(self.config.max_allowed_setpoint);
        true
    }

    /// Electrical power for a drive state, W.
    ///
    /// Supply-side estimate: V²/R derated by the duty ceiling and the
    /// commanded bucket.
    pub fn heating_watts(&self, power: u8, heater_on: bool) -> u16 {
        if !heater_on {
            return 0;
        }
        let volts = u32::from(self.config.input_volts);
        let full_watts = volts * volts * 1000 / self.config.heater_resistance_milliohm;
        let ceiling = u32::from(self.config.heater_max_duty_cycle_percent);
        (full_watts * ceiling / 100 * u32::from(power) / 10) as u16
    }
}
