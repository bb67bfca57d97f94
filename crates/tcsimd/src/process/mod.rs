//! Daemon process supervision: detaching, signal handling and the lifecycle.

pub(crate) mod daemonizer;
mod errors;
pub(crate) mod launch;
mod lifecycle;
pub(crate) mod shutdown;

pub use daemonizer::{DaemonizeError, Daemonizer, Detached, SystemDaemonizer};
pub use errors::LaunchError;
pub use launch::{LaunchMode, run_daemon};
pub use lifecycle::LifecycleState;
pub use shutdown::{
    ShutdownError, ShutdownListener, ShutdownSignal, ShutdownToken, SystemShutdownSignal,
};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
pub(crate) const FOREGROUND_ENV_VAR: &str = "TCSIM_FOREGROUND";
