//! Shared configuration for the thermocouple simulation daemon.
//!
//! Every setting is optional. Values are layered by [`ortho_config`] from a
//! configuration file (`TCSIM_CONFIG_PATH`) and `TCSIM_*` environment
//! variables; anything left unset falls back to the constants in
//! [`defaults`](crate::DEFAULT_STATE_PATH) which match the fixed behaviour of
//! the daemon when no configuration is present.
//!
//! The daemon accepts no command-line flags, so [`Config::load_without_args`]
//! hands the loader nothing but the program name.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_INITIAL_TEMPERATURE, DEFAULT_LOG_FILTER, DEFAULT_LOOP_INTERVAL, DEFAULT_RETRY_BASE,
    DEFAULT_RETRY_CAP, DEFAULT_STATE_PATH, DEFAULT_TEMPERATURE_PATH, DEFAULT_WORKING_DIR,
    default_log_filter, default_log_format, default_log_sink,
};
pub use logging::{LogFormat, LogFormatParseError, LogSink, LogSinkParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TCSIM")]
pub struct Config {
    /// Heater state file written by the external actuator.
    pub state_path: Option<Utf8PathBuf>,
    /// Temperature file published on every iteration.
    pub temperature_path: Option<Utf8PathBuf>,
    /// Directory the detached daemon changes into.
    pub working_dir: Option<Utf8PathBuf>,
    /// Seconds to pause between simulation iterations.
    pub loop_interval_secs: Option<u64>,
    /// First retry interval, in seconds, for state file I/O.
    pub retry_base_secs: Option<u64>,
    /// Retry interval, in seconds, at which state file I/O gives up.
    pub retry_cap_secs: Option<u64>,
    /// Temperature the simulation starts from.
    pub initial_temperature: Option<f64>,
    /// `tracing` filter expression.
    pub log_filter: Option<String>,
    /// Log line format.
    pub log_format: Option<LogFormat>,
    /// Log destination.
    pub log_sink: Option<LogSink>,
}

impl Config {
    /// Loads configuration from files and the environment only.
    ///
    /// The process arguments are ignored; the daemon has no flags.
    pub fn load_without_args(program: &str) -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(vec![OsString::from(program)])
    }

    /// Heater state file path.
    pub fn state_path(&self) -> &Utf8Path {
        self.state_path
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_STATE_PATH))
    }

    /// Temperature file path.
    pub fn temperature_path(&self) -> &Utf8Path {
        self.temperature_path
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_TEMPERATURE_PATH))
    }

    /// Working directory adopted after detaching.
    pub fn working_dir(&self) -> &Utf8Path {
        self.working_dir
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_WORKING_DIR))
    }

    /// Pause between simulation iterations.
    pub fn loop_interval(&self) -> Duration {
        self.loop_interval_secs
            .map_or(DEFAULT_LOOP_INTERVAL, Duration::from_secs)
    }

    /// First backoff interval.
    pub fn retry_base(&self) -> Duration {
        self.retry_base_secs
            .map_or(DEFAULT_RETRY_BASE, Duration::from_secs)
    }

    /// Backoff interval at which retries stop.
    pub fn retry_cap(&self) -> Duration {
        self.retry_cap_secs
            .map_or(DEFAULT_RETRY_CAP, Duration::from_secs)
    }

    /// Starting temperature.
    pub fn initial_temperature(&self) -> f64 {
        self.initial_temperature
            .unwrap_or(DEFAULT_INITIAL_TEMPERATURE)
    }

    /// Log filter expression.
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Log line format.
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Log destination.
    pub fn log_sink(&self) -> LogSink {
        self.log_sink.unwrap_or_else(default_log_sink)
    }

    /// Rejects settings the daemon cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_interval().is_zero() {
            return Err(ConfigError::ZeroInterval {
                field: "loop_interval_secs",
            });
        }
        if self.retry_base().is_zero() {
            return Err(ConfigError::ZeroInterval {
                field: "retry_base_secs",
            });
        }
        if self.retry_cap() < self.retry_base() {
            return Err(ConfigError::RetryCapBelowBase {
                base: self.retry_base().as_secs(),
                cap: self.retry_cap().as_secs(),
            });
        }
        let initial = self.initial_temperature();
        if !initial.is_finite() {
            return Err(ConfigError::NonFiniteTemperature { value: initial });
        }
        if self.state_path() == self.temperature_path() {
            return Err(ConfigError::SharedPath {
                path: self.state_path().to_owned(),
            });
        }
        Ok(())
    }
}

/// Invalid combinations of configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An interval that drives a loop was set to zero.
    #[error("{field} must be greater than zero")]
    ZeroInterval {
        /// Name of the offending setting.
        field: &'static str,
    },
    /// The retry cap would never allow a retry.
    #[error("retry cap ({cap}s) must not be below the retry base ({base}s)")]
    RetryCapBelowBase {
        /// Configured base interval in seconds.
        base: u64,
        /// Configured cap in seconds.
        cap: u64,
    },
    /// The initial temperature was NaN or infinite.
    #[error("initial temperature must be finite, got {value}")]
    NonFiniteTemperature {
        /// Rejected value.
        value: f64,
    },
    /// Heater state and temperature would share one file.
    #[error("state and temperature files must differ, both are '{path}'")]
    SharedPath {
        /// The shared path.
        path: Utf8PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_fixed_constants() {
        let config = Config::default();
        assert_eq!(config.state_path(), Utf8Path::new("/tmp/status"));
        assert_eq!(config.temperature_path(), Utf8Path::new("/tmp/temp"));
        assert_eq!(config.working_dir(), Utf8Path::new("/"));
        assert_eq!(config.loop_interval(), Duration::from_secs(5));
        assert_eq!(config.retry_base(), Duration::from_secs(1));
        assert_eq!(config.retry_cap(), Duration::from_secs(64));
        assert_eq!(config.initial_temperature(), 64.0);
        assert_eq!(config.log_sink(), LogSink::Syslog);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(Config { loop_interval_secs: Some(0), ..Config::default() })]
    #[case(Config { retry_base_secs: Some(0), ..Config::default() })]
    fn rejects_zero_intervals(#[case] config: Config) {
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval { .. })
        ));
    }

    #[test]
    fn rejects_cap_below_base() {
        let config = Config {
            retry_base_secs: Some(8),
            retry_cap_secs: Some(4),
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::RetryCapBelowBase { base: 8, cap: 4 })
        );
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_non_finite_initial_temperature(#[case] value: f64) {
        let config = Config {
            initial_temperature: Some(value),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFiniteTemperature { .. })
        ));
    }

    #[test]
    fn rejects_shared_state_and_temperature_file() {
        let config = Config {
            state_path: Some(Utf8PathBuf::from("/tmp/shared")),
            temperature_path: Some(Utf8PathBuf::from("/tmp/shared")),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SharedPath { .. })
        ));
    }
}
