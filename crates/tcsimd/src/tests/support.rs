//! Test doubles shared by the unit and behavioural suites.

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use camino::Utf8PathBuf;
use daemonize_me::DaemonError;
use nix::unistd::Pid;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use tcsim_config::{Config, LogSink};

use crate::bootstrap::ConfigLoader;
use crate::error::ErrorKind;
use crate::health::HealthReporter;
use crate::pause::{Interrupted, Pause};
use crate::process::{
    DaemonizeError, Daemonizer, Detached, LaunchError, LifecycleState, ShutdownError,
    ShutdownListener, ShutdownSignal, ShutdownToken,
};

type PauseHook = Box<dyn Fn(usize)>;

/// Records requested waits instead of sleeping.
#[derive(Default)]
pub struct RecordingPause {
    waits: RefCell<Vec<Duration>>,
    hook: Option<PauseHook>,
    stop: Option<(usize, ErrorKind)>,
}

impl RecordingPause {
    /// Calls `hook` with the running wait count after each recorded wait.
    pub fn with_hook(hook: impl Fn(usize) + 'static) -> Self {
        Self {
            hook: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    /// Interrupts the first wait with `reason`.
    pub fn interrupting(reason: ErrorKind) -> Self {
        Self::stopping_after(1, reason)
    }

    /// Interrupts the `waits`-th wait with `reason`.
    pub fn stopping_after(waits: usize, reason: ErrorKind) -> Self {
        Self {
            stop: Some((waits, reason)),
            ..Self::default()
        }
    }

    /// Every wait requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) -> Result<(), Interrupted> {
        let count = {
            let mut waits = self.waits.borrow_mut();
            waits.push(duration);
            waits.len()
        };
        if let Some(hook) = &self.hook {
            hook(count);
        }
        match self.stop {
            Some((after, reason)) if count >= after => Err(Interrupted { reason }),
            _ => Ok(()),
        }
    }

    fn checkpoint(&self) -> Result<(), Interrupted> {
        Ok(())
    }
}

/// Lifecycle events observed by [`RecordingHealthReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The lifecycle moved between two states.
    Transition(LifecycleState, LifecycleState),
    /// The daemon entered its exit path.
    Exiting(ErrorKind),
}

/// Health reporter that keeps every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingHealthReporter {
    /// Events in the order they were reported.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn lifecycle_transition(&self, from: LifecycleState, to: LifecycleState) {
        self.push(LifecycleEvent::Transition(from, to));
    }

    fn daemon_exiting(&self, kind: ErrorKind, _error: &LaunchError) {
        self.push(LifecycleEvent::Exiting(kind));
    }
}

/// Loader pointing every file at a private temporary directory.
#[derive(Clone)]
pub struct TestConfigLoader {
    dir: Arc<TempDir>,
    config: Config,
}

impl TestConfigLoader {
    /// Builds a loader with short intervals and stderr logging.
    pub fn new() -> Self {
        let dir = Arc::new(TempDir::new().expect("create config directory"));
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("temporary directory should be UTF-8");
        let config = Config {
            state_path: Some(root.join("status")),
            temperature_path: Some(root.join("temp")),
            working_dir: Some(root.clone()),
            loop_interval_secs: Some(1),
            retry_base_secs: Some(1),
            retry_cap_secs: Some(1),
            initial_temperature: Some(64.0),
            log_filter: Some("warn".to_owned()),
            log_sink: Some(LogSink::Stderr),
            ..Config::default()
        };
        Self { dir, config }
    }

    /// Moves the state file into a directory that does not exist.
    pub fn with_unreachable_state_file(mut self) -> Self {
        let root = Utf8PathBuf::from_path_buf(self.root().to_path_buf())
            .expect("temporary directory should be UTF-8");
        self.config.state_path = Some(root.join("missing").join("status"));
        self
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Heater state file the daemon will read.
    pub fn state_path(&self) -> PathBuf {
        self.config.state_path().as_std_path().to_path_buf()
    }

    /// Temperature file the daemon will write.
    pub fn temperature_path(&self) -> PathBuf {
        self.config.temperature_path().as_std_path().to_path_buf()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("tcsimd"),
            OsString::from("--loop-interval-secs"),
            OsString::from("not-a-number"),
        ];
        Config::load_from_iter(args)
    }
}

/// What [`TestDaemonizer`] reports when asked to detach.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DaemonizeOutcome {
    /// Continue as the detached child.
    #[default]
    Child,
    /// Behave as the launching parent.
    Parent,
    /// Fail as if `fork` had failed.
    ForkFails,
    /// Fail as if `setsid` had failed.
    SessionFails,
}

/// Daemoniser that never forks.
#[derive(Debug, Default, Clone)]
pub struct TestDaemonizer {
    outcome: DaemonizeOutcome,
    calls: Arc<AtomicUsize>,
}

impl TestDaemonizer {
    /// Builds a daemoniser that reports `outcome`.
    pub fn with_outcome(outcome: DaemonizeOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::default(),
        }
    }

    /// Number of detach requests received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Daemonizer for TestDaemonizer {
    fn daemonize(&self, _working_dir: &Path) -> Result<Detached, DaemonizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            DaemonizeOutcome::Child => Ok(Detached::Child {
                session: Pid::this(),
            }),
            DaemonizeOutcome::Parent => Ok(Detached::Parent {
                child: Pid::from_raw(4242),
            }),
            DaemonizeOutcome::ForkFails => Err(DaemonError::Fork.into()),
            DaemonizeOutcome::SessionFails => Err(DaemonError::SetSid.into()),
        }
    }
}

/// Shutdown source driven by the test instead of OS signals.
#[derive(Debug, Default, Clone)]
pub struct TestShutdownSignal {
    inner: Arc<Mutex<TriggerState>>,
}

#[derive(Debug, Default)]
struct TriggerState {
    token: Option<ShutdownToken>,
    pending: bool,
}

impl TestShutdownSignal {
    /// Requests termination now, or as soon as the daemon installs its
    /// listener.
    pub fn trigger(&self) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match &state.token {
            Some(token) => token.request(ErrorKind::TerminatedBySignal),
            None => state.pending = true,
        }
    }

    /// Whether the daemon installed its listener.
    pub fn installed(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .is_some()
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn install(&self, token: &ShutdownToken) -> Result<ShutdownListener, ShutdownError> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.pending {
            token.request(ErrorKind::TerminatedBySignal);
        }
        state.token = Some(token.clone());
        Ok(ShutdownListener::detached())
    }
}
