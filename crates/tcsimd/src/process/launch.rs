//! Supervises daemon launch sequencing and runtime orchestration.

use std::convert::Infallible;
use std::env;
use std::sync::Arc;

use nix::unistd::Pid;
use tracing::info;

use tcsim_config::Config;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::error::ErrorKind;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::simulation::{Simulation, SimulationError, SimulationSettings};
use crate::telemetry;

use super::daemonizer::{Daemonizer, Detached, SystemDaemonizer};
use super::errors::LaunchError;
use super::lifecycle::{Lifecycle, LifecycleState};
use super::shutdown::{ShutdownSignal, ShutdownToken, SystemShutdownSignal};
use super::{FOREGROUND_ENV_VAR, PROCESS_TARGET};

/// Launch mode for the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Fork into the background and detach from the controlling terminal.
    Background,
    /// Remain attached to the terminal; primarily used for debugging and tests.
    Foreground,
}

impl LaunchMode {
    /// Foreground when `TCSIM_FOREGROUND` is set, background otherwise.
    #[must_use]
    pub fn detect() -> Self {
        if env::var_os(FOREGROUND_ENV_VAR).is_some() {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

/// Process-level collaborators needed to control daemon lifecycle.
pub(crate) struct ProcessControl<D, S> {
    pub(crate) mode: LaunchMode,
    pub(crate) daemonizer: D,
    pub(crate) shutdown: S,
}

/// Service dependencies required to construct the daemon runtime.
pub(crate) struct ServiceDeps<L> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, D, S> {
    pub(crate) process: ProcessControl<D, S>,
    pub(crate) services: ServiceDeps<L>,
}

/// Runs the daemon using the production collaborators and returns the
/// process exit status.
///
/// In background mode the launching process exits with status 0 from inside
/// the daemoniser. The detached daemon only returns when it stops, with the
/// reason.
pub fn run_daemon() -> ErrorKind {
    let plan = LaunchPlan {
        process: ProcessControl {
            mode: LaunchMode::detect(),
            daemonizer: SystemDaemonizer::new(),
            shutdown: SystemShutdownSignal::new(),
        },
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
        },
    };
    run_daemon_with(plan)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, D, S>(plan: LaunchPlan<L, D, S>) -> ErrorKind
where
    L: ConfigLoader,
    D: Daemonizer,
    S: ShutdownSignal,
{
    let LaunchPlan { process, services } = plan;
    let ServiceDeps { loader, reporter } = services;
    let mut lifecycle = Lifecycle::new(reporter);
    let token = ShutdownToken::new();

    let kind = match supervise(&mut lifecycle, &loader, &process, &token) {
        Ok(child) => {
            info!(
                target: PROCESS_TARGET,
                child = child.as_raw(),
                "daemon launched; parent exiting"
            );
            ErrorKind::Ok
        }
        Err(error) => lifecycle.exit(&error),
    };
    telemetry::close();
    kind
}

/// Drives the lifecycle up to [`LifecycleState::Running`] and runs the
/// simulation. Returns `Ok` only on the parent side of a fork.
fn supervise<L, D, S>(
    lifecycle: &mut Lifecycle,
    loader: &L,
    process: &ProcessControl<D, S>,
    token: &ShutdownToken,
) -> Result<Pid, LaunchError>
where
    L: ConfigLoader,
    D: Daemonizer,
    S: ShutdownSignal,
{
    let config = bootstrap_with(loader)?.config;
    info!(
        target: PROCESS_TARGET,
        mode = ?process.mode,
        state = %config.state_path(),
        temperature = %config.temperature_path(),
        "starting daemon runtime"
    );

    match process.mode {
        LaunchMode::Background => {
            let working_dir = config.working_dir().as_std_path();
            if let Detached::Parent { child } = process.daemonizer.daemonize(working_dir)? {
                return Ok(child);
            }
        }
        LaunchMode::Foreground => {
            info!(target: PROCESS_TARGET, "remaining in the foreground");
        }
    }
    lifecycle.advance(LifecycleState::Detached)?;

    let listener = process.shutdown.install(token)?;
    lifecycle.advance(LifecycleState::Running)?;
    let Err(error) = simulate(&config, token);
    listener.close();
    Err(error.into())
}

fn simulate(config: &Config, token: &ShutdownToken) -> Result<Infallible, SimulationError> {
    let settings = SimulationSettings::from_config(config)?;
    let mut simulation = Simulation::new(settings, token.clone());
    simulation.prepare()?;
    simulation.run()
}
