//! The read, step, publish loop at the heart of the daemon.

use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use tcsim_config::Config;

use crate::error::ErrorKind;
use crate::pause::{Interrupted, Pause};
use crate::state::{
    RetryPolicy, StateError, StateStore, Temperature, TemperatureError, ensure_file,
};

const SIMULATION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::simulation");

/// Reasons the simulation loop stops.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A state file operation failed or was cut short.
    #[error(transparent)]
    State(#[from] StateError),
    /// The daemon was asked to stop between iterations.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
    /// The configured starting temperature is unusable.
    #[error("invalid initial temperature: {0}")]
    InitialTemperature(#[source] TemperatureError),
}

impl SimulationError {
    /// Exit status this stop maps to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::State(error) => error.kind(),
            Self::Interrupted(interrupted) => interrupted.reason,
            Self::InitialTemperature(_) => ErrorKind::UnexpectedExit,
        }
    }
}

/// File locations and timings the loop runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Heater state file.
    pub state_path: PathBuf,
    /// Published temperature file.
    pub temperature_path: PathBuf,
    /// Wait between iterations.
    pub interval: Duration,
    /// Temperature before the first step.
    pub initial: Temperature,
    /// Backoff applied to every file operation.
    pub policy: RetryPolicy,
}

impl SimulationSettings {
    /// Extracts loop settings from a resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self, SimulationError> {
        let initial = Temperature::new(config.initial_temperature())
            .map_err(SimulationError::InitialTemperature)?;
        Ok(Self {
            state_path: config.state_path().as_std_path().to_path_buf(),
            temperature_path: config.temperature_path().as_std_path().to_path_buf(),
            interval: config.loop_interval(),
            initial,
            policy: RetryPolicy::from_config(config),
        })
    }
}

/// Owns the simulated temperature and advances it once per iteration.
///
/// The temperature lives only in memory; the published file is an output and
/// is never read back.
#[derive(Debug)]
pub struct Simulation<P> {
    settings: SimulationSettings,
    store: StateStore<P>,
    pause: P,
    temperature: Temperature,
}

impl<P> Simulation<P>
where
    P: Pause + Clone,
{
    /// Builds a loop that waits through `pause`, both between iterations and
    /// between retries.
    pub fn new(settings: SimulationSettings, pause: P) -> Self {
        let store = StateStore::new(settings.policy, pause.clone());
        let temperature = settings.initial;
        Self {
            settings,
            store,
            pause,
            temperature,
        }
    }

    /// Current simulated temperature.
    pub const fn temperature(&self) -> Temperature {
        self.temperature
    }

    /// Creates the state and temperature files when they are missing.
    pub fn prepare(&self) -> Result<(), SimulationError> {
        if ensure_file(&self.settings.state_path)? {
            info!(
                target: SIMULATION_TARGET,
                file = %self.settings.state_path.display(),
                "no state file; creating"
            );
        }
        if ensure_file(&self.settings.temperature_path)? {
            info!(
                target: SIMULATION_TARGET,
                file = %self.settings.temperature_path.display(),
                "no temperature file; creating"
            );
        }
        Ok(())
    }

    /// Runs one iteration: read the heater, step, publish.
    pub fn tick(&mut self) -> Result<Temperature, SimulationError> {
        let heater = self.store.read_heater_state(&self.settings.state_path)?;
        let next = self.temperature.step(heater);
        self.store
            .write_temperature(&self.settings.temperature_path, next)?;
        self.temperature = next;
        debug!(
            target: SIMULATION_TARGET,
            %heater,
            temperature = %next,
            "published temperature"
        );
        Ok(next)
    }

    /// Iterates until a stop is requested or a file operation gives up.
    pub fn run(&mut self) -> Result<Infallible, SimulationError> {
        info!(
            target: SIMULATION_TARGET,
            interval = ?self.settings.interval,
            initial = %self.temperature,
            "beginning thermocouple simulation"
        );
        loop {
            self.pause.checkpoint()?;
            self.tick()?;
            self.pause.pause(self.settings.interval)?;
        }
    }
}
