use std::time::Duration;

use crate::logging::{LogFormat, LogSink};

/// File the external actuator writes the heater state into.
pub const DEFAULT_STATE_PATH: &str = "/tmp/status";

/// File the daemon publishes the simulated temperature into.
pub const DEFAULT_TEMPERATURE_PATH: &str = "/tmp/temp";

/// Directory the detached daemon changes into.
pub const DEFAULT_WORKING_DIR: &str = "/";

/// Pause between simulation iterations.
pub const DEFAULT_LOOP_INTERVAL: Duration = Duration::from_secs(5);

/// First backoff interval used by state file retries.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(1);

/// Backoff interval at which state file retries give up.
pub const DEFAULT_RETRY_CAP: Duration = Duration::from_secs(64);

/// Temperature the simulation starts from. It's a bit cold.
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 64.0;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the daemon.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the daemon.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default logging destination for the daemon.
pub fn default_log_sink() -> LogSink {
    LogSink::Syslog
}
