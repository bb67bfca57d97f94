use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::Path;

use tracing::{error, info, warn};

use crate::error::ErrorKind;
use crate::pause::Pause;

use super::STATE_TARGET;
use super::errors::{StateAction, StateError};
use super::heater::{HeaterState, StateReading};
use super::retry::RetryPolicy;
use super::temperature::Temperature;

/// Reads the heater state and writes the temperature, retrying transient
/// failures according to a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct StateStore<P> {
    policy: RetryPolicy,
    pause: P,
}

impl<P> StateStore<P>
where
    P: Pause,
{
    /// Builds a store that waits between retries using `pause`.
    pub const fn new(policy: RetryPolicy, pause: P) -> Self {
        Self { policy, pause }
    }

    /// Reads the heater state from the first line of `path`.
    ///
    /// Unrecognised content resolves to [`HeaterState::FAIL_OPEN`] and is not
    /// retried; only open and read failures are.
    pub fn read_heater_state(&self, path: &Path) -> Result<HeaterState, StateError> {
        let reading = self.with_retry(StateAction::ReadState, path, || read_state_once(path))?;
        let state = reading.resolve();
        match reading {
            StateReading::Known(_) => {
                info!(
                    target: STATE_TARGET,
                    file = %path.display(),
                    heater = %state,
                    "heater is {state}"
                );
            }
            StateReading::Unrecognized => {
                warn!(
                    target: STATE_TARGET,
                    file = %path.display(),
                    recovered = ?ErrorKind::UnknownHeaterState,
                    heater = %state,
                    "unknown heater state; assuming {state}"
                );
            }
        }
        Ok(state)
    }

    /// Overwrites `path` with `temperature` followed by a newline.
    pub fn write_temperature(&self, path: &Path, temperature: Temperature) -> Result<(), StateError> {
        self.with_retry(StateAction::WriteTemperature, path, || {
            write_temperature_once(path, temperature)
        })
    }

    fn with_retry<T>(
        &self,
        action: StateAction,
        path: &Path,
        mut attempt: impl FnMut() -> io::Result<T>,
    ) -> Result<T, StateError> {
        let mut backoff = self.policy.backoff();
        let mut attempts = 0_u32;
        loop {
            attempts = attempts.saturating_add(1);
            let source = match attempt() {
                Ok(value) => return Ok(value),
                Err(source) => source,
            };
            let Some(delay) = backoff.next_delay() else {
                error!(
                    target: STATE_TARGET,
                    %action,
                    file = %path.display(),
                    attempts,
                    error = %source,
                    "failed {action}; giving up"
                );
                return Err(StateError::Exhausted {
                    action,
                    path: path.to_path_buf(),
                    attempts,
                    source,
                });
            };
            warn!(
                target: STATE_TARGET,
                %action,
                file = %path.display(),
                error = %source,
                interval = ?delay,
                next_interval = ?backoff.current(),
                "failed {action} ({source}); retry with interval {:?}",
                backoff.current()
            );
            self.pause
                .pause(delay)
                .map_err(|interrupted| StateError::Interrupted {
                    action,
                    reason: interrupted.reason,
                })?;
        }
    }
}

fn read_state_once(path: &Path) -> io::Result<StateReading> {
    let file = File::open(path)?;
    StateReading::read_from(BufReader::new(file))
}

fn write_temperature_once(path: &Path, temperature: Temperature) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    writeln!(file, "{temperature}")?;
    file.flush()
}

/// Creates `path` as an empty file unless something already exists there.
///
/// Existing content is never touched. Returns whether the file was created.
pub fn ensure_file(path: &Path) -> Result<bool, StateError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(StateError::Create {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads back a published temperature. No retries, no coercion.
pub fn read_temperature(path: &Path) -> Result<Temperature, StateError> {
    let text = fs::read_to_string(path).map_err(|source| StateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    text.parse().map_err(|source| StateError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
