//! Loads configuration and brings up telemetry before the daemon detaches.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use tcsim_config::{Config, ConfigError, LogSink};

use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that reads files and `TCSIM_*` environment variables. The process
/// arguments are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_without_args(env!("CARGO_PKG_NAME"))
    }
}

/// Loader that always returns the same configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but holds unusable values.
    #[error("invalid configuration: {source}")]
    Invalid {
        /// Validation failure.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Validated configuration paired with the live telemetry handle.
#[derive(Debug)]
pub struct Bootstrapped {
    /// Resolved configuration.
    pub config: Config,
    /// Handle for the installed subscriber.
    pub telemetry: TelemetryHandle,
}

/// Loads and validates configuration, then installs the tracing subscriber.
///
/// When configuration cannot be used, telemetry is still brought up on
/// standard error with default settings so the failure gets reported.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Bootstrapped, BootstrapError> {
    let config = match resolve(loader) {
        Ok(config) => config,
        Err(error) => {
            install_fallback_telemetry();
            return Err(error);
        }
    };
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    Ok(Bootstrapped { config, telemetry })
}

fn resolve(loader: &dyn ConfigLoader) -> Result<Config, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    config
        .validate()
        .map_err(|source| BootstrapError::Invalid { source })?;
    Ok(config)
}

fn install_fallback_telemetry() {
    let fallback = Config {
        log_sink: Some(LogSink::Stderr),
        ..Config::default()
    };
    if let Err(error) = telemetry::initialise(&fallback) {
        eprintln!("{}", fallback_failure_notice(&error));
    }
}

fn fallback_failure_notice(error: &TelemetryError) -> String {
    format!(
        "{}: failed to initialise fallback telemetry: {error}",
        env!("CARGO_PKG_NAME")
    )
}
