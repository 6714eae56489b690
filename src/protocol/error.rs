//! Protocol error types
//!
//! Every variant here is fatal to the connection that produced it: the wire
//! format has no resynchronization marker, so once a frame is misread the
//! rest of the stream cannot be trusted. Failures of the *action* a packet
//! asks for are not errors at this level; they travel back to the peer as
//! [`ActionStatus`](super::types::ActionStatus) payloads.

use std::fmt;
use std::io;
use std::string::FromUtf8Error;

/// Protocol error type
#[derive(Debug)]
pub enum ProtocolError {
	/// I/O error from the underlying stream (includes short reads)
	Io(io::Error),
	/// Frame started with a tag that is not in the catalog
	UnknownPacketTag(u8),
	/// Ping-pong phase byte was neither REQUEST nor DATA
	InvalidPhase(u8),
	/// A length-prefixed block announced more bytes than allowed
	PayloadTooLarge { size: usize, max: usize },
	/// A string is too long for the u16 length prefix
	StringTooLong(usize),
	/// Field content that cannot be decoded (bad UTF-8, negative length, ...)
	Malformed(String),
	/// The writer side of the connection has gone away
	ConnectionClosed,
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
			ProtocolError::UnknownPacketTag(tag) => write!(f, "Unknown packet tag: {}", tag),
			ProtocolError::InvalidPhase(phase) => write!(f, "Invalid packet phase: {}", phase),
			ProtocolError::PayloadTooLarge { size, max } => {
				write!(f, "Payload too large: {} bytes (max {})", size, max)
			}
			ProtocolError::StringTooLong(len) => {
				write!(f, "String too long for wire encoding: {} bytes", len)
			}
			ProtocolError::Malformed(msg) => write!(f, "Malformed frame: {}", msg),
			ProtocolError::ConnectionClosed => write!(f, "Connection closed"),
		}
	}
}

impl std::error::Error for ProtocolError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			ProtocolError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl ProtocolError {
	/// True for errors caused by the stream itself rather than its content
	pub fn is_transport(&self) -> bool {
		matches!(self, ProtocolError::Io(_) | ProtocolError::ConnectionClosed)
	}
}

impl From<io::Error> for ProtocolError {
	fn from(e: io::Error) -> Self {
		ProtocolError::Io(e)
	}
}

impl From<FromUtf8Error> for ProtocolError {
	fn from(e: FromUtf8Error) -> Self {
		ProtocolError::Malformed(format!("invalid UTF-8 string: {}", e))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transport_classification() {
		let io_err = ProtocolError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
		assert!(io_err.is_transport());
		assert!(ProtocolError::ConnectionClosed.is_transport());
		assert!(!ProtocolError::UnknownPacketTag(200).is_transport());
	}

	#[test]
	fn test_display() {
		let err = ProtocolError::PayloadTooLarge { size: 10, max: 5 };
		assert_eq!(err.to_string(), "Payload too large: 10 bytes (max 5)");
	}
}

// vim: ts=4
