//! Configuration for remotectl
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (TOML, given with `--config`)
//! 3. Environment variables (REMOTECTL_* prefix)
//! 4. CLI flags (highest priority, applied by `main`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::protocol::Limits;
use crate::validation::{self, ValidationError, Validator};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:7471";

/// Configuration shared by `serve` and `connect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Address `serve` listens on
	pub listen_addr: String,

	/// Directory `serve` exports; remote paths resolve below it
	pub root_dir: PathBuf,

	/// Let peers launch processes (execute, drop-and-execute)
	pub allow_execute: bool,

	/// How long `connect` waits for the answer to its command
	pub request_timeout_secs: u64,

	/// Decode limits applied to every connection
	pub limits: Limits,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
			root_dir: PathBuf::from("."),
			allow_execute: false,
			request_timeout_secs: 30,
			limits: Limits::default(),
		}
	}
}

impl Config {
	/// Defaults, overlaid with `path` if given, then with the environment
	pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
		let mut config = match path {
			Some(path) => Config::from_file(path)?,
			None => Config::default(),
		};
		config.apply_env()?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
		let text = std::fs::read_to_string(path)
			.map_err(|e| ConfigError::ReadFailed { path: path.to_path_buf(), source: e })?;
		Config::parse(&text, path)
	}

	/// Parse TOML text; `origin` only appears in error messages
	pub fn parse(text: &str, origin: &Path) -> Result<Config, ConfigError> {
		toml::from_str(text).map_err(|e| ConfigError::ParseFailed {
			path: origin.to_path_buf(),
			message: e.to_string(),
		})
	}

	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_env_from(|var| std::env::var(var).ok())
	}

	/// Apply REMOTECTL_* overrides read through `lookup`
	pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(value) = lookup("REMOTECTL_LISTEN") {
			self.listen_addr = value;
		}
		if let Some(value) = lookup("REMOTECTL_ROOT") {
			self.root_dir = PathBuf::from(value);
		}
		if let Some(value) = lookup("REMOTECTL_ALLOW_EXECUTE") {
			self.allow_execute = parse_flag("REMOTECTL_ALLOW_EXECUTE", &value)?;
		}
		if let Some(value) = lookup("REMOTECTL_TIMEOUT_SECS") {
			self.request_timeout_secs = parse_number("REMOTECTL_TIMEOUT_SECS", &value)?;
		}
		if let Some(value) = lookup("REMOTECTL_MAX_PAYLOAD_BYTES") {
			self.limits.max_payload_bytes = parse_number("REMOTECTL_MAX_PAYLOAD_BYTES", &value)?;
		}
		if let Some(value) = lookup("REMOTECTL_MAX_PATH_SEGMENTS") {
			self.limits.max_path_segments = parse_number("REMOTECTL_MAX_PATH_SEGMENTS", &value)?;
		}
		Ok(())
	}
}

fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::InvalidEnv { var: var.to_string(), value: value.to_string() }),
	}
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
	value
		.trim()
		.parse()
		.map_err(|_| ConfigError::InvalidEnv { var: var.to_string(), value: value.to_string() })
}

impl Validator for Config {
	fn validate(&self) -> Result<(), ValidationError> {
		validation::validate_socket_addr(&self.listen_addr)?;
		validation::validate_timeout_secs(self.request_timeout_secs)?;
		validation::validate_limit("max_payload_bytes", self.limits.max_payload_bytes)?;
		validation::validate_limit("max_path_segments", self.limits.max_path_segments)?;
		if self.limits.max_payload_bytes > i32::MAX as usize {
			return Err(ValidationError::ConfigError(format!(
				"max_payload_bytes cannot exceed {}",
				i32::MAX
			)));
		}
		Ok(())
	}
}


// vim: ts=4
