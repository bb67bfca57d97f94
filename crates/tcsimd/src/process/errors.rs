//! Defines the unified error surface for daemon launch and supervision.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::error::ErrorKind;
use crate::simulation::SimulationError;

use super::daemonizer::DaemonizeError;
use super::lifecycle::LifecycleState;
use super::shutdown::ShutdownError;

/// Errors that end the daemon. Every variant maps onto an [`ErrorKind`].
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration or telemetry could not be prepared.
    #[error("daemon bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// Daemonisation failed.
    #[error("failed to daemonise: {source}")]
    Daemonize {
        /// Underlying daemonisation error.
        #[source]
        source: DaemonizeError,
    },
    /// Signal handlers could not be installed.
    #[error("failed to install shutdown listener: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// The simulation stopped.
    #[error("simulation stopped: {source}")]
    Simulation {
        /// Underlying simulation error.
        #[source]
        source: SimulationError,
    },
    /// The lifecycle was driven out of order.
    #[error("illegal lifecycle transition from {from} to {to}")]
    IllegalTransition {
        /// State the daemon was in.
        from: LifecycleState,
        /// State that was requested.
        to: LifecycleState,
    },
}

impl LaunchError {
    /// Exit status this failure maps to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Daemonize { source } => source.kind(),
            Self::Simulation { source } => source.kind(),
            Self::Bootstrap { .. } | Self::Shutdown { .. } | Self::IllegalTransition { .. } => {
                ErrorKind::UnexpectedExit
            }
        }
    }
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<DaemonizeError> for LaunchError {
    fn from(source: DaemonizeError) -> Self {
        Self::Daemonize { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

impl From<SimulationError> for LaunchError {
    fn from(source: SimulationError) -> Self {
        Self::Simulation { source }
    }
}
