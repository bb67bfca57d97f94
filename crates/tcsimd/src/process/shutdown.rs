//! Signal-driven shutdown requests and the token that carries them.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tracing::{info, warn};

use super::PROCESS_TARGET;
use crate::error::ErrorKind;
use crate::pause::{Interrupted, Pause};

/// Shared stop request observed by every blocking wait in the daemon.
///
/// Signal listeners call [`ShutdownToken::request`]; the simulation loop and
/// the state store wait through [`Pause`], which wakes as soon as a request
/// lands. The first request wins.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    reason: Mutex<Option<ErrorKind>>,
    wake: Condvar,
}

impl ShutdownToken {
    /// Builds a token with no pending request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the daemon to stop for `reason`. Later requests are ignored.
    pub fn request(&self, reason: ErrorKind) {
        let mut pending = self.lock();
        if pending.is_none() {
            *pending = Some(reason);
        }
        self.inner.wake.notify_all();
    }

    /// The pending stop reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<ErrorKind> {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ErrorKind>> {
        self.inner
            .reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Pause for ShutdownToken {
    fn pause(&self, duration: Duration) -> Result<(), Interrupted> {
        let pending = self.lock();
        let (pending, _) = self
            .inner
            .wake
            .wait_timeout_while(pending, duration, |reason| reason.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match *pending {
            Some(reason) => Err(Interrupted { reason }),
            None => Ok(()),
        }
    }
}

/// Abstraction over the source of stop requests.
pub trait ShutdownSignal: Send + Sync {
    /// Starts forwarding stop requests into `token` until the returned
    /// listener is closed.
    fn install(&self, token: &ShutdownToken) -> Result<ShutdownListener, ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The listener thread could not be started.
    #[error("failed to spawn signal listener: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Running signal listener. Closing it unregisters the handlers and joins
/// the listener thread.
#[derive(Debug, Default)]
pub struct ShutdownListener {
    handle: Option<Handle>,
    thread: Option<JoinHandle<()>>,
}

impl ShutdownListener {
    /// A listener with nothing to tear down.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Stops listening and waits for the listener thread to finish.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!(target: PROCESS_TARGET, "signal listener thread panicked");
        }
    }
}

impl Drop for ShutdownListener {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Listener that turns OS signals into stop requests.
///
/// `SIGHUP` is logged and ignored. `SIGTERM`, `SIGINT` and `SIGQUIT` request
/// [`ErrorKind::TerminatedBySignal`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds a signal listener.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn install(&self, token: &ShutdownToken) -> Result<ShutdownListener, ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        let handle = signals.handle();
        let token = token.clone();
        let thread = thread::Builder::new()
            .name("tcsimd-signals".to_owned())
            .spawn(move || {
                for signal in signals.forever() {
                    dispatch(signal, &token);
                }
            })
            .map_err(|source| {
                handle.close();
                ShutdownError::Spawn { source }
            })?;
        info!(
            target: PROCESS_TARGET,
            "signal handlers installed"
        );
        Ok(ShutdownListener {
            handle: Some(handle),
            thread: Some(thread),
        })
    }
}

fn dispatch(signal: i32, token: &ShutdownToken) {
    match signal {
        SIGHUP => {
            info!(
                target: PROCESS_TARGET,
                signal,
                "hangup received; ignoring"
            );
        }
        SIGTERM | SIGINT | SIGQUIT => {
            info!(
                target: PROCESS_TARGET,
                signal,
                "shutdown signal received"
            );
            token.request(ErrorKind::TerminatedBySignal);
        }
        other => {
            info!(
                target: PROCESS_TARGET,
                signal = other,
                "received unhandled signal"
            );
        }
    }
}
