//! embassy-time backing for the core clock traits

use embassy_time::{block_for, Duration, Instant};
use thermion_core::clock::{Clock, Delay};

/// Milliseconds since boot, straight off the embassy time driver.
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Blocking pause for the control tick's off-read settle. Deliberately
/// stalls the executor: the whole point is that nothing drives the coil
/// while the field decays.
pub struct PauseDelay;

impl Delay for PauseDelay {
    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }
}
