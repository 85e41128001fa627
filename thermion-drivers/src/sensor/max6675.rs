//! MAX6675 K-type thermocouple converter, bit-banged
//!
//! The converter shifts a 16-bit frame out on SO, MSB first:
//!
//! ```text
//! D15      dummy, always 0
//! D14..D3  temperature, 0.25 °C per count
//! D2       open-thermocouple flag
//! D1       device id, always 0
//! D0       tri-state
//! ```
//!
//! A set dummy or device-id bit means the frame itself cannot be
//! trusted; the open flag means the probe is disconnected but the
//! converter is fine.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use thermion_core::traits::sensor::ThermocoupleFault;

use super::ReadRaw;

const DUMMY_BIT: u16 = 1 << 15;
const OPEN_BIT: u16 = 1 << 2;
const DEVICE_ID_BIT: u16 = 1 << 1;

/// Half-period of the bit-bang clock, µs. The MAX6675 tops out at
/// 4.3 MHz; this is nowhere near it on purpose.
const CLOCK_HALF_PERIOD_US: u32 = 1;

/// Bit-banged MAX6675 reader.
pub struct Max6675<Sck, Cs, So, D> {
    sck: Sck,
    cs: Cs,
    so: So,
    delay: D,
}

impl<Sck, Cs, So, D> Max6675<Sck, Cs, So, D>
where
    Sck: OutputPin,
    Cs: OutputPin,
    So: InputPin,
    D: DelayNs,
{
    pub fn new(sck: Sck, cs: Cs, so: So, delay: D) -> Self {
        let mut sensor = Self {
            sck,
            cs,
            so,
            delay,
        };
        // Idle bus: chip deselected, clock low.
        sensor.cs.set_high().ok();
        sensor.sck.set_low().ok();
        sensor
    }

    /// Clock one 16-bit frame out of the converter.
    fn read_frame(&mut self) -> Result<u16, ThermocoupleFault> {
        self.cs
            .set_low()
            .map_err(|_| ThermocoupleFault::ReadError)?;
        self.delay.delay_us(CLOCK_HALF_PERIOD_US);

        let mut frame: u16 = 0;
        for _ in 0..16 {
            self.sck
                .set_high()
                .map_err(|_| ThermocoupleFault::ReadError)?;
            self.delay.delay_us(CLOCK_HALF_PERIOD_US);

            frame <<= 1;
            if self
                .so
                .is_high()
                .map_err(|_| ThermocoupleFault::ReadError)?
            {
                frame |= 1;
            }

            self.sck
                .set_low()
                .map_err(|_| ThermocoupleFault::ReadError)?;
            self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        }

        self.cs
            .set_high()
            .map_err(|_| ThermocoupleFault::ReadError)?;
        Ok(frame)
    }
}

impl<Sck, Cs, So, D> ReadRaw for Max6675<Sck, Cs, So, D>
where
    Sck: OutputPin,
    Cs: OutputPin,
    So: InputPin,
    D: DelayNs,
{
    fn sample(&mut self) -> Result<i16, ThermocoupleFault> {
        decode(self.read_frame()?)
    }
}

/// Decode a frame into whole °C.
fn decode(frame: u16) -> Result<i16, ThermocoupleFault> {
    if frame & (DUMMY_BIT | DEVICE_ID_BIT) != 0 {
        return Err(ThermocoupleFault::InvalidReading);
    }
    if frame & OPEN_BIT != 0 {
        return Err(ThermocoupleFault::ReadError);
    }
    let counts = (frame >> 3) & 0x0FFF;
    // 0.25 °C per count, truncated to whole degrees.
    Ok((counts / 4) as i16)
}
