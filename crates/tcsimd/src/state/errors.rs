use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorKind;

use super::temperature::TemperatureError;

/// Operation a state error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    /// Reading the heater state file.
    ReadState,
    /// Writing the temperature file.
    WriteTemperature,
}

impl fmt::Display for StateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadState => "state read",
            Self::WriteTemperature => "temperature write",
        })
    }
}

/// Failures surfaced by the state store.
#[derive(Debug, Error)]
pub enum StateError {
    /// Every attempt failed and the backoff schedule ran out.
    #[error("{action} of '{path}' failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Operation that failed.
        action: StateAction,
        /// File involved.
        path: PathBuf,
        /// Attempts made, including the first.
        attempts: u32,
        /// Error from the last attempt.
        #[source]
        source: io::Error,
    },
    /// A missing backing file could not be created.
    #[error("failed to create '{path}': {source}")]
    Create {
        /// File that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A file could not be read in a single-shot operation.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The temperature file did not hold a usable value.
    #[error("malformed temperature in '{path}': {source}")]
    Malformed {
        /// File that was read.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: TemperatureError,
    },
    /// A retry wait was cut short by a stop request.
    #[error("{action} interrupted: {reason}")]
    Interrupted {
        /// Operation that was waiting.
        action: StateAction,
        /// Why the daemon is stopping.
        reason: ErrorKind,
    },
}

impl StateError {
    /// Exit status this failure maps to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Exhausted { .. } | Self::Create { .. } | Self::Read { .. } => {
                ErrorKind::FileOpenFailed
            }
            Self::Malformed { .. } => ErrorKind::UnexpectedExit,
            Self::Interrupted { reason, .. } => *reason,
        }
    }
}
