use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use camino::Utf8Path;
use once_cell::sync::Lazy;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use tcsim_config::{
    Config, DEFAULT_INITIAL_TEMPERATURE, DEFAULT_RETRY_CAP, DEFAULT_TEMPERATURE_PATH,
    default_log_filter, default_log_format, default_log_sink,
};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const CONFIG_PATH_VAR: &str = "TCSIM_CONFIG_PATH";

struct Harness {
    temp_dir: TempDir,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let env_guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_guard: env_guard,
        }
    }

    fn write_config(&self, contents: &str) {
        let path = self.temp_dir.path().join("tcsim.toml");
        if let Err(error) = fs::write(&path, contents) {
            panic!("failed to write configuration: {error}");
        }
        let path_text = path.to_string_lossy().into_owned();
        self.set_env(CONFIG_PATH_VAR, &path_text);
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` in edition 2024. `ENV_MUTEX` keeps
        // scenarios serialised and `Drop` restores the previous values.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        match Config::load_without_args("tcsimd") {
            Ok(config) => {
                *self.loaded.borrow_mut() = Some(config);
            }
            Err(error) => {
                *self.error.borrow_mut() = Some(error.to_string());
            }
        }
    }

    fn config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            if let Some(os_value) = value {
                unsafe { std::env::set_var(&key, os_value) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the state path to \"{path}\"")]
fn given_state_path_file(harness: &Harness, path: String) {
    harness.write_config(&format!("state_path = \"{path}\"\n"));
}

#[given("a configuration file setting the loop interval to \"{seconds}\"")]
fn given_loop_interval_file(harness: &Harness, seconds: String) {
    harness.write_config(&format!("loop_interval_secs = {seconds}\n"));
}

#[given("the environment overrides the state path to \"{path}\"")]
fn given_environment_override(harness: &Harness, path: String) {
    harness.set_env("TCSIM_STATE_PATH", &path);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the state path to \"{path}\"")]
fn then_resolved_state_path(harness: &Harness, path: String) {
    let config = harness.config();
    assert_eq!(config.state_path(), Utf8Path::new(&path));
}

#[then("the loop interval resolves to \"{seconds}\" seconds")]
fn then_loop_interval(harness: &Harness, seconds: String) {
    let expected = match seconds.parse::<u64>() {
        Ok(value) => Duration::from_secs(value),
        Err(error) => panic!("invalid expected interval '{seconds}': {error}"),
    };
    assert_eq!(harness.config().loop_interval(), expected);
}

#[then("every other setting uses the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.config();
    assert_eq!(
        config.temperature_path(),
        Utf8Path::new(DEFAULT_TEMPERATURE_PATH)
    );
    assert_eq!(config.retry_cap(), DEFAULT_RETRY_CAP);
    assert_eq!(config.initial_temperature(), DEFAULT_INITIAL_TEMPERATURE);
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.log_sink(), default_log_sink());
}

#[scenario(path = "tests/features/configuration_precedence.feature")]
fn configuration_precedence(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(path = "tests/features/configuration_defaults.feature")]
fn configuration_defaults(#[from(harness)] harness: Harness) {
    let _ = harness;
}
