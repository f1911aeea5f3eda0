//! Integration tests for loading runner configuration

use idatest::{Error, LogLevel, TestConfig};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_from_file_overlays_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"timeoutMs": 1500, "logLevel": 3, "verbose": true}}"#).unwrap();

    let config = TestConfig::from_file(file.path()).unwrap();
    assert_eq!(
        config,
        TestConfig {
            timeout_ms: 1500,
            filter: None,
            log_level: 3,
            verbose: true,
        }
    );
    assert_eq!(config.console_level(), LogLevel::Error);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TestConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"timeoutMs": "soon"}}"#).unwrap();
    let err = TestConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().starts_with("ConfigError:"));
}

#[test]
fn test_round_trips_through_camel_case_json() {
    let config = TestConfig::default().with_filter("Core");
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"timeoutMs\":5000"));
    assert_eq!(TestConfig::from_json(&json).unwrap(), config);
}
