//! Safety supervision logic

mod supervisor;

pub use supervisor::{heater_overtemp, DieTempGuard, DieTempStatus, HEATER_MAX_TEMP_C};
