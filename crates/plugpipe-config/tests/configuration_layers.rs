//! Precedence and failure behaviour of the layered configuration loader.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::rstest;
use tempfile::TempDir;

use plugpipe_config::{CodecFormat, Config, LogFormat, default_log_filter};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises environment access and restores the previous value on drop.
struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe under edition 2024; the mutex keeps
        // tests in this binary from racing on it.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            _guard: guard,
        }
    }

    fn lock() -> MutexGuard<'static, ()> {
        ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}

fn args(extra: &[&str]) -> Vec<OsString> {
    std::iter::once("plugpipe")
        .chain(extra.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn defaults_apply_without_overrides() {
    let _guard = EnvOverride::lock();
    let config = Config::from_args(args(&[])).expect("defaults load");
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.codec(), CodecFormat::Yaml);
    assert_eq!(config, Config::default());
}

#[rstest]
#[case::json(&["--codec", "json"], CodecFormat::Json)]
#[case::yaml(&["--codec", "yaml"], CodecFormat::Yaml)]
fn cli_selects_codec(#[case] flags: &[&str], #[case] expected: CodecFormat) {
    let _guard = EnvOverride::lock();
    let config = Config::from_args(args(flags)).expect("config loads");
    assert_eq!(config.codec(), expected);
}

#[test]
fn cli_overrides_environment() {
    let _env = EnvOverride::set_var("PLUGPIPE_LOG_FILTER", OsStr::new("info"));
    let config =
        Config::from_args(args(&["--log-filter", "plugpipe=trace"])).expect("config loads");
    assert_eq!(config.log_filter(), "plugpipe=trace");
}

#[test]
fn environment_overrides_defaults() {
    let _env = EnvOverride::set_var("PLUGPIPE_LOG_FORMAT", OsStr::new("json"));
    let config = Config::from_args(args(&[])).expect("config loads");
    assert_eq!(config.log_format(), LogFormat::Json);
}

#[test]
fn configuration_file_is_applied() {
    let _guard = EnvOverride::lock();
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("plugpipe.toml");
    fs::write(&path, "codec = \"json\"\nlog_filter = \"debug\"\n").expect("write config");

    let path_arg = path.to_string_lossy().into_owned();
    let config =
        Config::from_args(args(&["--config-path", path_arg.as_str()])).expect("config loads");
    assert_eq!(config.codec(), CodecFormat::Json);
    assert_eq!(config.log_filter(), "debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
}

#[test]
fn malformed_configuration_file_fails() {
    let _guard = EnvOverride::lock();
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("plugpipe.toml");
    fs::write(&path, "codec = [not toml").expect("write config");

    let path_arg = path.to_string_lossy().into_owned();
    let result = Config::from_args(args(&["--config-path", path_arg.as_str()]));
    assert!(result.is_err(), "malformed configuration must fail");
}

#[rstest]
#[case("compact", LogFormat::Compact)]
#[case("JSON", LogFormat::Json)]
fn log_format_parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
    assert_eq!(text.parse::<LogFormat>().expect("parse"), expected);
}
