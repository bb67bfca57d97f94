//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use crate::error::ErrorKind;
use crate::process::{LaunchError, LifecycleState};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked after the lifecycle moves from `from` to `to`.
    fn lifecycle_transition(&self, from: LifecycleState, to: LifecycleState);

    /// Invoked once the daemon has entered its exit path.
    fn daemon_exiting(&self, kind: ErrorKind, error: &LaunchError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn lifecycle_transition(&self, from: LifecycleState, to: LifecycleState) {
        (**self).lifecycle_transition(from, to);
    }

    fn daemon_exiting(&self, kind: ErrorKind, error: &LaunchError) {
        (**self).daemon_exiting(kind, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn lifecycle_transition(&self, from: LifecycleState, to: LifecycleState) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "lifecycle_transition",
            %from,
            %to,
            "daemon is {to}"
        );
    }

    fn daemon_exiting(&self, kind: ErrorKind, error: &LaunchError) {
        if kind == ErrorKind::TerminatedBySignal {
            tracing::info!(
                target: HEALTH_TARGET,
                event = "daemon_exiting",
                code = kind.code(),
                detail = %error,
                "{kind}"
            );
        } else {
            tracing::error!(
                target: HEALTH_TARGET,
                event = "daemon_exiting",
                code = kind.code(),
                detail = %error,
                "{kind}"
            );
        }
    }
}
