//! Error types for remotectl operations
//!
//! Protocol-level errors live in [`crate::protocol::error`]; these wrap them
//! for the parts of the program that own sockets and configuration files.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::protocol::ProtocolError;
use crate::validation::ValidationError;

/// Errors from establishing or running a connection
#[derive(Debug)]
pub enum ConnectionError {
	/// Could not bind the listen address
	BindFailed { addr: String, source: io::Error },

	/// Could not reach the peer
	ConnectFailed { addr: String, source: io::Error },

	/// The connection ended before the expected answer arrived
	Disconnected,

	/// No answer within the configured time
	Timeout { secs: u64 },

	/// The peer sent something that cannot be decoded
	Protocol(ProtocolError),

	/// I/O error
	Io(io::Error),
}

impl fmt::Display for ConnectionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConnectionError::BindFailed { addr, source } => {
				write!(f, "Failed to listen on {}: {}", addr, source)
			}
			ConnectionError::ConnectFailed { addr, source } => {
				write!(f, "Failed to connect to {}: {}", addr, source)
			}
			ConnectionError::Disconnected => write!(f, "Connection disconnected"),
			ConnectionError::Timeout { secs } => {
				write!(f, "No answer from peer within {} seconds", secs)
			}
			ConnectionError::Protocol(e) => write!(f, "Protocol error: {}", e),
			ConnectionError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for ConnectionError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			ConnectionError::BindFailed { source, .. } => Some(source),
			ConnectionError::ConnectFailed { source, .. } => Some(source),
			ConnectionError::Protocol(e) => Some(e),
			ConnectionError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<ProtocolError> for ConnectionError {
	fn from(e: ProtocolError) -> Self {
		match e {
			ProtocolError::ConnectionClosed => ConnectionError::Disconnected,
			other => ConnectionError::Protocol(other),
		}
	}
}

impl From<io::Error> for ConnectionError {
	fn from(e: io::Error) -> Self {
		ConnectionError::Io(e)
	}
}

/// Errors from loading the configuration
#[derive(Debug)]
pub enum ConfigError {
	/// Config file could not be read
	ReadFailed { path: PathBuf, source: io::Error },

	/// Config file is not valid TOML for [`Config`](crate::config::Config)
	ParseFailed { path: PathBuf, message: String },

	/// An environment override has an unusable value
	InvalidEnv { var: String, value: String },

	/// Values parsed but failed validation
	Invalid(ValidationError),
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::ReadFailed { path, source } => {
				write!(f, "Failed to read config {}: {}", path.display(), source)
			}
			ConfigError::ParseFailed { path, message } => {
				write!(f, "Failed to parse config {}: {}", path.display(), message)
			}
			ConfigError::InvalidEnv { var, value } => {
				write!(f, "Invalid value for {}: {:?}", var, value)
			}
			ConfigError::Invalid(e) => write!(f, "{}", e),
		}
	}
}

impl Error for ConfigError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			ConfigError::ReadFailed { source, .. } => Some(source),
			ConfigError::Invalid(e) => Some(e),
			_ => None,
		}
	}
}

impl From<ValidationError> for ConfigError {
	fn from(e: ValidationError) -> Self {
		ConfigError::Invalid(e)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_closed_protocol_becomes_disconnected() {
		let err = ConnectionError::from(ProtocolError::ConnectionClosed);
		assert!(matches!(err, ConnectionError::Disconnected));
	}

	#[test]
	fn test_protocol_error_is_wrapped() {
		let err = ConnectionError::from(ProtocolError::UnknownPacketTag(200));
		assert!(err.to_string().contains("Unknown packet tag: 200"));
		assert!(err.source().is_some());
	}

	#[test]
	fn test_config_error_display() {
		let err = ConfigError::InvalidEnv { var: "REMOTECTL_ALLOW_EXECUTE".into(), value: "maybe".into() };
		assert!(err.to_string().contains("REMOTECTL_ALLOW_EXECUTE"));
	}
}

// vim: ts=4
