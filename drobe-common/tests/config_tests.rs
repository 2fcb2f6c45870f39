//! Tests for configuration file resolution and loading
//!
//! Note: Uses serial_test to prevent ENV variable race conditions. Tests
//! that manipulate DROBE_CONFIG are marked with #[serial] so they run
//! sequentially, not in parallel.

use drobe_common::config::{load_toml, resolve_config_file, CONFIG_ENV_VAR};
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;

#[derive(Debug, Deserialize, Default)]
struct TestConfig {
    #[serde(default)]
    name: String,
    #[serde(default)]
    count: u32,
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/drobe-env-config.toml");

    let resolved = resolve_config_file(Some("/tmp/drobe-explicit.toml"));
    assert_eq!(
        resolved,
        Some(std::path::PathBuf::from("/tmp/drobe-explicit.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_when_no_explicit_path() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/drobe-env-config.toml");

    let resolved = resolve_config_file(None);
    assert_eq!(
        resolved,
        Some(std::path::PathBuf::from("/tmp/drobe-env-config.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_empty_env_var_ignored() {
    env::set_var(CONFIG_ENV_VAR, "");

    // Empty env var falls through; resolution may still find a platform
    // config file, but must not return an empty path.
    if let Some(path) = resolve_config_file(None) {
        assert!(!path.as_os_str().is_empty());
    }

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_load_toml_none_means_defaults() {
    let loaded: Option<TestConfig> = load_toml(None).unwrap();
    assert!(loaded.is_none(), "no config file means compiled defaults");
}

#[test]
fn test_load_toml_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name = \"closet\"\ncount = 4").unwrap();

    let loaded: Option<TestConfig> = load_toml(Some(file.path().to_path_buf())).unwrap();
    let config = loaded.expect("file exists");
    assert_eq!(config.name, "closet");
    assert_eq!(config.count, 4);
}

#[test]
fn test_load_toml_missing_file_is_error() {
    let result: drobe_common::Result<Option<TestConfig>> =
        load_toml(Some("/nonexistent/drobe-config.toml".into()));
    assert!(result.is_err());
}

#[test]
fn test_load_toml_malformed_file_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name = [unclosed").unwrap();

    let result: drobe_common::Result<Option<TestConfig>> =
        load_toml(Some(file.path().to_path_buf()));
    assert!(result.is_err());
}
