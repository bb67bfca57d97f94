//! The daemon's four-state lifecycle.

use std::fmt;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::health::HealthReporter;

use super::errors::LaunchError;

/// Where the daemon is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Configuration and logging are being prepared.
    Starting,
    /// The process runs in its own session, or stays attached in foreground
    /// mode.
    Detached,
    /// Signal handlers are installed and the simulation is running.
    Running,
    /// Terminal: the exit reason is being logged.
    Exiting,
}

impl LifecycleState {
    /// Whether `next` may follow `self`. Any non-terminal state may move to
    /// [`LifecycleState::Exiting`].
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Starting, Self::Detached)
                | (Self::Detached, Self::Running)
                | (Self::Starting | Self::Detached | Self::Running, Self::Exiting)
        )
    }

    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Detached => "detached",
            Self::Running => "running",
            Self::Exiting => "exiting",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives the lifecycle and reports every transition.
pub(crate) struct Lifecycle {
    state: LifecycleState,
    reporter: Arc<dyn HealthReporter>,
}

impl Lifecycle {
    pub(crate) fn new(reporter: Arc<dyn HealthReporter>) -> Self {
        Self {
            state: LifecycleState::Starting,
            reporter,
        }
    }

    #[cfg(test)]
    pub(crate) const fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: LifecycleState) -> Result<(), LaunchError> {
        if !self.state.can_transition_to(next) {
            return Err(LaunchError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        self.reporter.lifecycle_transition(self.state, next);
        self.state = next;
        Ok(())
    }

    /// Enters [`LifecycleState::Exiting`] for `error` and returns the exit
    /// status. This is the single exit path for the detached daemon.
    pub(crate) fn exit(mut self, error: &LaunchError) -> ErrorKind {
        let kind = error.kind();
        if self.state != LifecycleState::Exiting {
            self.reporter
                .lifecycle_transition(self.state, LifecycleState::Exiting);
            self.state = LifecycleState::Exiting;
        }
        self.reporter.daemon_exiting(kind, error);
        kind
    }
}
