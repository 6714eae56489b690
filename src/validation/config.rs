//! Configuration validation functions

use super::ValidationError;

/// Validate a `host:port` listen or connect address
pub fn validate_socket_addr(addr: &str) -> Result<(), ValidationError> {
	let (host, port) = addr.rsplit_once(':').ok_or_else(|| {
		ValidationError::ConfigError(format!("Address must be host:port, got {:?}", addr))
	})?;
	if host.is_empty() {
		return Err(ValidationError::ConfigError(format!("Address has no host: {:?}", addr)));
	}
	if port.parse::<u16>().is_err() {
		return Err(ValidationError::ConfigError(format!("Invalid port in {:?}", addr)));
	}
	Ok(())
}

/// Validate a size limit in bytes or items
pub fn validate_limit(name: &str, value: usize) -> Result<(), ValidationError> {
	if value == 0 {
		return Err(ValidationError::ConfigError(format!("{} must be greater than 0", name)));
	}
	Ok(())
}

/// Validate timeout in seconds
pub fn validate_timeout_secs(timeout_secs: u64) -> Result<(), ValidationError> {
	if timeout_secs == 0 {
		return Err(ValidationError::ConfigError("Timeout must be greater than 0".to_string()));
	}
	if timeout_secs > 3600 {
		return Err(ValidationError::ConfigError(format!(
			"Timeout too large: {} seconds (max 3600)",
			timeout_secs
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validate_socket_addr() {
		assert!(validate_socket_addr("127.0.0.1:7471").is_ok());
		assert!(validate_socket_addr("localhost:80").is_ok());
		assert!(validate_socket_addr("[::1]:7471").is_ok());
	}

	#[test]
	fn test_validate_socket_addr_invalid() {
		assert!(validate_socket_addr("").is_err());
		assert!(validate_socket_addr("localhost").is_err());
		assert!(validate_socket_addr(":7471").is_err());
		assert!(validate_socket_addr("host:99999").is_err());
	}

	#[test]
	fn test_validate_limit() {
		assert!(validate_limit("max_payload_bytes", 1).is_ok());
		let err = validate_limit("max_payload_bytes", 0).unwrap_err();
		assert!(err.to_string().contains("max_payload_bytes"));
	}

	#[test]
	fn test_validate_timeout() {
		assert!(validate_timeout_secs(30).is_ok());
		assert!(validate_timeout_secs(0).is_err());
		assert!(validate_timeout_secs(3601).is_err());
	}
}

// vim: ts=4
