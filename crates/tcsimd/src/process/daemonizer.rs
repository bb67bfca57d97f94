//! Detaches the `tcsimd` process from its controlling terminal.

use std::ffi::OsStr;
use std::path::Path;

use daemonize_me::{Daemon, DaemonError};
use nix::unistd::Pid;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;
use crate::error::ErrorKind;
use crate::telemetry;

/// Published files stay readable by other users.
const DAEMON_UMASK: u16 = 0o022;

/// Which side of the fork the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detached {
    /// The launching process; it should exit cleanly.
    ///
    /// [`SystemDaemonizer`] never reports this: its parent exits from inside
    /// the fork.
    Parent {
        /// Process id of the detached child.
        child: Pid,
    },
    /// The detached process, now leader of its own session.
    Child {
        /// Id of the new session.
        session: Pid,
    },
}

/// Abstraction over daemonisation strategies.
pub trait Daemonizer: Send + Sync {
    /// Detaches the process into the background, adopting `working_dir`.
    fn daemonize(&self, working_dir: &Path) -> Result<Detached, DaemonizeError>;
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// Wrapper around the system daemonisation error.
    #[error("{0}")]
    System(#[from] DaemonError),
}

impl DaemonizeError {
    /// Exit status this failure maps to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::System(DaemonError::Fork) => ErrorKind::ForkFailed,
            Self::System(DaemonError::SetSid) => ErrorKind::SessionCreateFailed,
            Self::System(DaemonError::OpenDevNull | DaemonError::RedirectStream) => {
                ErrorKind::FileOpenFailed
            }
            Self::System(_) => ErrorKind::UnexpectedExit,
        }
    }
}

/// Daemoniser backed by the `daemonize-me` crate.
///
/// Must run before any other thread is spawned.
#[derive(Debug, Default)]
pub struct SystemDaemonizer;

impl SystemDaemonizer {
    /// Builds a new system daemoniser.
    pub fn new() -> Self {
        Self
    }
}

impl Daemonizer for SystemDaemonizer {
    fn daemonize(&self, working_dir: &Path) -> Result<Detached, DaemonizeError> {
        info!(
            target: PROCESS_TARGET,
            working_dir = %working_dir.display(),
            "daemonising into background"
        );
        Daemon::new()
            .work_dir(working_dir)
            .umask(DAEMON_UMASK)
            .name(OsStr::new(env!("CARGO_PKG_NAME")))
            .setup_post_fork_parent_hook(release_parent)
            .start()?;
        let session = Pid::this();
        info!(
            target: PROCESS_TARGET,
            session = session.as_raw(),
            "daemon process detached; continuing in child"
        );
        Ok(Detached::Child { session })
    }
}

/// Runs in the launching process once the child exists.
fn release_parent(_parent: i32, child: i32) -> ! {
    info!(
        target: PROCESS_TARGET,
        child,
        "daemon launched; parent exiting"
    );
    telemetry::close();
    std::process::exit(i32::from(ErrorKind::Ok.code()))
}
