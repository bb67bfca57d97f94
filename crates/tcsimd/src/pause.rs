//! Interruptible waiting shared by the retry backoff and the simulation loop.

use std::time::Duration;

use thiserror::Error;

use crate::error::ErrorKind;

/// A wait cut short because the daemon was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wait interrupted: {reason}")]
pub struct Interrupted {
    /// Why the daemon is stopping.
    pub reason: ErrorKind,
}

/// Blocks the calling thread unless a stop has been requested.
pub trait Pause {
    /// Waits for `duration`, returning early with [`Interrupted`] when the
    /// daemon is asked to stop before or during the wait.
    fn pause(&self, duration: Duration) -> Result<(), Interrupted>;

    /// Returns [`Interrupted`] if a stop is already pending, without waiting.
    fn checkpoint(&self) -> Result<(), Interrupted> {
        self.pause(Duration::ZERO)
    }
}

impl<T> Pause for &T
where
    T: Pause + ?Sized,
{
    fn pause(&self, duration: Duration) -> Result<(), Interrupted> {
        (**self).pause(duration)
    }

    fn checkpoint(&self) -> Result<(), Interrupted> {
        (**self).checkpoint()
    }
}
