//! Integration tests for configuration loading
//! Tests that config files are parsed, merged with defaults and validated

use std::fs;
use tempfile::TempDir;

use remotectl::config::Config;
use remotectl::error::ConfigError;
use remotectl::validation::Validator;

#[test]
fn test_load_without_file_uses_defaults() {
	let config = Config::load(None).expect("defaults should load");
	assert_eq!(config.limits.max_path_segments, 1024);
}

#[test]
fn test_load_full_file() {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let config_path = temp_dir.path().join("remotectl.toml");
	fs::write(
		&config_path,
		r#"
listen_addr = "0.0.0.0:9100"
root_dir = "/srv/export"
allow_execute = true
request_timeout_secs = 5

[limits]
max_payload_bytes = 1048576
max_path_segments = 64
"#,
	)
	.unwrap();

	let config = Config::from_file(&config_path).expect("config should parse");
	assert_eq!(config.listen_addr, "0.0.0.0:9100");
	assert_eq!(config.root_dir, std::path::PathBuf::from("/srv/export"));
	assert!(config.allow_execute);
	assert_eq!(config.request_timeout_secs, 5);
	assert_eq!(config.limits.max_payload_bytes, 1_048_576);
	assert_eq!(config.limits.max_path_segments, 64);
	assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_is_read_error() {
	let temp_dir = TempDir::new().unwrap();
	let result = Config::from_file(&temp_dir.path().join("absent.toml"));
	assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
}

#[test]
fn test_invalid_values_fail_load() {
	let temp_dir = TempDir::new().unwrap();
	let config_path = temp_dir.path().join("bad.toml");
	fs::write(&config_path, "listen_addr = \"no-port-here\"\n").unwrap();

	let result = Config::load(Some(config_path.as_path()));
	assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_wrong_type_is_parse_error() {
	let temp_dir = TempDir::new().unwrap();
	let config_path = temp_dir.path().join("typed.toml");
	fs::write(&config_path, "allow_execute = \"sometimes\"\n").unwrap();

	let err = Config::from_file(&config_path).unwrap_err();
	assert!(matches!(err, ConfigError::ParseFailed { .. }));
	assert!(err.to_string().contains("typed.toml"));
}

#[test]
fn test_config_serialization_roundtrip() {
	let config = Config::default();
	let text = toml::to_string(&config).expect("Failed to serialize");
	let parsed: Config = toml::from_str(&text).expect("Failed to deserialize");
	assert_eq!(config, parsed);
}

// vim: ts=4
