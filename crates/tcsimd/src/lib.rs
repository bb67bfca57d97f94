//! Thermocouple simulation daemon.
//!
//! `tcsimd` detaches into the background and, on a fixed interval, reads a
//! heater state file (`ON` or `OFF`), nudges a simulated temperature one
//! degree up or down, and publishes the result to a temperature file. A
//! separate actuator writes the state file; anything it writes that is not
//! recognised is treated as `ON`, so a misbehaving actuator heats rather than
//! leaving the simulation stalled.
//!
//! File operations are retried with exponential backoff before the daemon
//! gives up. Every way the daemon can stop is a named [`ErrorKind`] whose
//! discriminant is the process exit status.
//!
//! Termination signals are turned into a stop request on a
//! [`ShutdownToken`]. The loop observes the request at its next wait and
//! exits through the same path as every other failure, so the reason is
//! always logged before the process ends.

mod bootstrap;
pub mod error;
mod health;
mod pause;
mod process;
pub mod simulation;
pub mod state;
pub mod telemetry;

pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use error::{ErrorKind, message_for_code};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use pause::{Interrupted, Pause};
pub use process::{
    DaemonizeError, Daemonizer, Detached, LaunchError, LaunchMode, LifecycleState,
    ShutdownError, ShutdownListener, ShutdownSignal, ShutdownToken, SystemDaemonizer,
    SystemShutdownSignal, run_daemon,
};
pub use simulation::{Simulation, SimulationError, SimulationSettings};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
