//! Integration tests for layered configuration
//!
//! Loading follows CLI arguments > Environment variables > Config file > Defaults.

use serial_test::serial;
use spotmap_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use spotmap_core::error::SpotmapError;
use spotmap_core::models::FingerprintField;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_KEYS: [&str; 7] = [
    "SPOTMAP_PAGE_SIZE",
    "SPOTMAP_DEBOUNCE_MS",
    "SPOTMAP_SRID",
    "SPOTMAP_IDENTITY_PASS",
    "SPOTMAP_FINGERPRINT_PASS",
    "SPOTMAP_FINGERPRINT_FIELDS",
    "SPOTMAP_IMAGE_BUCKET",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
page_size = 50
srid = 3857
"#
    )
    .unwrap();

    env::set_var("SPOTMAP_PAGE_SIZE", "10");
    env::set_var("SPOTMAP_FINGERPRINT_FIELDS", "name,description");

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.page_size.value, 10);
    assert_eq!(config.page_size.source, ConfigSource::Environment);
    assert_eq!(config.srid.value, 3857);
    assert_eq!(config.srid.source, ConfigSource::File);
    assert_eq!(
        config.fingerprint_fields.value,
        vec![FingerprintField::Name, FingerprintField::Description]
    );

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();
    env::set_var("SPOTMAP_PAGE_SIZE", "zero");
    env::set_var("SPOTMAP_IDENTITY_PASS", "perhaps");
    env::set_var("SPOTMAP_FINGERPRINT_FIELDS", "name,phone");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.page_size.value, 20);
    assert_eq!(config.page_size.source, ConfigSource::Default);
    assert!(config.identity_pass.value);
    assert_eq!(config.fingerprint_fields.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var("SPOTMAP_DEBOUNCE_MS", "500");
    env::set_var("SPOTMAP_FINGERPRINT_PASS", "false");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.debounce_ms.value, 500);
    assert!(!config.fingerprint_pass.value);

    config.update_from_cli(CliConfigOverrides {
        debounce_ms: Some(50),
        fingerprint_pass: Some(true),
        ..Default::default()
    });

    assert_eq!(config.debounce_ms.value, 50);
    assert_eq!(config.debounce_ms.source, ConfigSource::Cli);
    assert!(config.fingerprint_pass.value);

    clear_env();
}

#[test]
fn test_missing_file_is_an_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/spotmap.toml");
    assert!(matches!(result, Err(SpotmapError::ConfigFileNotFound { .. })));
}
