//! Behavioural tests for layered configuration loading.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use tether_config::{
    ArgsConfigLoader, Config, ConfigLoader, ConnectionDescriptor, ProtocolKind, TlsOptions,
    default_log_filter, default_log_format,
};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_lock: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let env_lock = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("tether")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_lock: env_lock,
        }
    }

    fn write_config(&self, transport: &str) {
        let path = self.temp_dir.path().join("tether.toml");
        if let Err(error) = fs::write(&path, format!("transport_uri = \"{transport}\"\n")) {
            panic!("failed to write configuration: {error}");
        }
        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn set_env(&self, key: &str, value: &str) {
        let key = format!("TETHER_{key}");
        let previous = std::env::var_os(&key);
        // Environment mutation is `unsafe` in edition 2024. `ENV_MUTEX` keeps
        // scenarios in this binary from observing each other's overrides.
        unsafe { std::env::set_var(&key, value) };
        self.env_overrides.borrow_mut().push((key, previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let loader = ArgsConfigLoader::new(self.cli_args.borrow().clone());
        match loader.load() {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn loaded_config(&self) -> Config {
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
            match value {
                Some(previous) => unsafe { std::env::set_var(&key, previous) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the transport to \"{uri}\"")]
fn given_configuration_file(harness: &Harness, uri: String) {
    harness.write_config(&uri);
}

#[given("the environment sets the transport to \"{uri}\"")]
fn given_environment_transport(harness: &Harness, uri: String) {
    harness.set_env("TRANSPORT_URI", &uri);
}

#[given("the environment sets \"{key}\" to \"{value}\"")]
fn given_environment_value(harness: &Harness, key: String, value: String) {
    harness.set_env(&key, &value);
}

#[when("a flag sets the transport to \"{uri}\"")]
fn when_flag(harness: &Harness, uri: String) {
    harness.push_cli_arg("--transport-uri");
    harness.push_cli_arg(uri);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the transport to \"{uri}\"")]
fn then_resolved_transport(harness: &Harness, uri: String) {
    let config = harness.loaded_config();
    let expected = match ConnectionDescriptor::parse(&uri, TlsOptions::default()) {
        Ok(descriptor) => descriptor,
        Err(error) => panic!("invalid expected transport '{uri}': {error}"),
    };
    let actual = match config.descriptor() {
        Ok(descriptor) => descriptor,
        Err(error) => panic!("loaded transport did not resolve: {error}"),
    };
    assert_eq!(actual, expected);
}

#[then("loading the configuration selects the \"{name}\" protocol")]
fn then_selected_protocol(harness: &Harness, name: String) {
    let config = harness.loaded_config();
    let expected = match ProtocolKind::resolve(&name) {
        Ok(kind) => kind,
        Err(error) => panic!("invalid expected protocol '{name}': {error}"),
    };
    assert_eq!(config.protocol_kind(), Ok(expected));
}

#[then("the transport is unset and the built-in defaults apply")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.loaded_config();
    assert_eq!(config.transport_uri, None);
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert!(config.always_connect);
    assert!(config.tls_validate);
}

#[then("loading the configuration fails mentioning \"{needle}\"")]
fn then_load_fails(harness: &Harness, needle: String) {
    harness.load();
    let error = harness.error.borrow();
    let Some(message) = error.as_ref() else {
        panic!("configuration loaded but was expected to fail");
    };
    assert!(
        message.contains(&needle),
        "expected '{needle}' in {message:?}"
    );
}

#[scenario(
    path = "tests/features/configuration_layers.feature",
    name = "Defaults apply without any source"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_layers.feature",
    name = "Environment overrides the configuration file"
)]
fn environment_overrides_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_layers.feature",
    name = "Command-line flags beat every other layer"
)]
fn flags_beat_every_layer(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_layers.feature",
    name = "Protocol name comes from the environment"
)]
fn protocol_name_from_environment(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_layers.feature",
    name = "Malformed boolean in the environment fails loading"
)]
fn malformed_boolean_fails(#[from(harness)] harness: Harness) {
    let _ = harness;
}
