//! Identity providers

use sysinfo::System;

use super::IdentityProvider;
use crate::protocol::types::SystemInfo;

/// Software version reported to peers
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reads the identity of the machine we run on
///
/// The user comes from `USER` (or `USERNAME` on Windows), the OS name from
/// `sysinfo`. Missing values are reported as empty strings.
#[derive(Debug, Default, Clone)]
pub struct LocalIdentity;

impl LocalIdentity {
	pub fn new() -> Self {
		LocalIdentity
	}
}

impl IdentityProvider for LocalIdentity {
	fn system_info(&self) -> SystemInfo {
		let name = std::env::var("USER").or_else(|_| std::env::var("USERNAME")).unwrap_or_default();
		let os = match (System::name(), System::os_version()) {
			(Some(name), Some(version)) => format!("{} {}", name, version),
			(Some(name), None) => name,
			(None, _) => std::env::consts::OS.to_string(),
		};
		SystemInfo { name, os, version: VERSION.to_string() }
	}
}

/// Fixed identity, for peers that should not reveal the local one
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub SystemInfo);

impl IdentityProvider for StaticIdentity {
	fn system_info(&self) -> SystemInfo {
		self.0.clone()
	}
}


// vim: ts=4
