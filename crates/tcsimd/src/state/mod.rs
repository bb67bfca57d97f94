//! Heater state and temperature files, read and written with retry and
//! exponential backoff.
//!
//! Files are opened and closed on every call so no descriptor outlives an
//! operation. Open and I/O failures are retried on a fresh [`Backoff`]
//! schedule per call; only exhaustion or an interrupted wait reaches the
//! caller. Unrecognised heater content is never an error: it resolves to
//! [`HeaterState::FAIL_OPEN`].

mod errors;
mod heater;
mod retry;
mod store;
mod temperature;

pub use errors::{StateAction, StateError};
pub use heater::{HeaterState, MAX_STATE_LINE, StateReading};
pub use retry::{Backoff, RetryPolicy};
pub use store::{StateStore, ensure_file, read_temperature};
pub use temperature::{Temperature, TemperatureError};

pub(crate) const STATE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::state");
