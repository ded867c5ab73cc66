//! CLOCKWAVE core: constants, configuration, clock, and error types.

mod clock;
mod config;
pub mod constants;
mod error;

pub use clock::LocalClock;
pub use config::WaveConfig;
pub use error::{ClockwaveError, ClockwaveResult};
