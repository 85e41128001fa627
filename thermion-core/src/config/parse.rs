//! config.txt parser
//!
//! Line-oriented `key=value`; `#` starts a comment line. Unknown keys
//! are ignored so a newer config file keeps working on older firmware,
//! and malformed lines are skipped rather than failing the boot.

use crate::traits::heater::MAX_POWER;

use super::types::{Config, TemperatureUnit};

/// Apply the recognized keys of `text` over `config`.
pub fn apply(text: &str, config: &mut Config) {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "session_timeout" => {
                if let Ok(seconds) = value.parse::<u32>() {
                    config.session_timeout_ms = seconds.saturating_mul(1000);
                }
            }
            "temperature_units" => match value {
                "C" => config.temperature_units = TemperatureUnit::Celsius,
                "F" => config.temperature_units = TemperatureUnit::Fahrenheit,
                _ => {}
            },
            "setpoint" => {
                if let Ok(v) = value.parse::<u16>() {
                    config.setpoint = v.clamp(1, config.max_allowed_setpoint);
                }
            }
            "power_threshold" => {
                if let Ok(v) = value.parse::<u8>() {
                    config.power_threshold = v.min(MAX_POWER);
                }
            }
            "heater_on_temperature_difference_threshold" => {
                if let Ok(v) = value.parse::<i16>() {
                    config.heater_on_temperature_difference_threshold = v;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        let mut config = Config::default();
        apply(
            "# comment\n\
             session_timeout=120\n\
             temperature_units=C\n\
             setpoint=210\n\
             power_threshold=3\n\
             heater_on_temperature_difference_threshold=25\n",
            &mut config,
        );
        assert_eq!(config.session_timeout_ms, 120_000);
        assert_eq!(config.temperature_units, TemperatureUnit::Celsius);
        assert_eq!(config.setpoint, 210);
        assert_eq!(config.power_threshold, 3);
        assert_eq!(config.heater_on_temperature_difference_threshold, 25);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut config = Config::default();
        apply("frobnicate=7\nsetpoint=150\n", &mut config);
        assert_eq!(config.setpoint, 150);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut config = Config::default();
        apply("no equals sign here\nsetpoint\n=42\nsetpoint=abc\n", &mut config);
        assert_eq!(config.setpoint, Config::default().setpoint);
    }

    #[test]
    fn setpoint_is_clamped_to_allowed_range() {
        let mut config = Config::default();
        apply("setpoint=500\n", &mut config);
        assert_eq!(config.setpoint, config.max_allowed_setpoint);

        apply("setpoint=0\n", &mut config);
        assert_eq!(config.setpoint, 1);
    }

    #[test]
    fn power_threshold_is_clamped_to_bucket_range() {
        let mut config = Config::default();
        apply("power_threshold=99\n", &mut config);
        assert_eq!(config.power_threshold, MAX_POWER);
    }

    #[test]
    fn whitespace_around_key_and_value_is_tolerated() {
        let mut config = Config::default();
        apply("  setpoint = 88  \n", &mut config);
        assert_eq!(config.setpoint, 88);
    }
}
