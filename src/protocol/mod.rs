//! Packet protocol layer
//!
//! Peers exchange self-describing packets over one bidirectional byte
//! stream. Every packet type knows how to write itself, how to read itself
//! back, and what the receiving peer does with it.
//!
//! # Example Usage
//!
//! ```ignore
//! use remotectl::protocol::{Connection, Limits, Packet, Exchange};
//!
//! let connection = Connection::new(stream, peer, services, events, Limits::default());
//! let handle = connection.handle();
//! tokio::spawn(connection.run());
//! handle.send(Packet::SystemInfo(Exchange::Request(())))?;
//! ```

pub mod codec;
pub mod commands;
pub mod connection;
pub mod error;
pub mod packet;
pub mod types;

// Re-export public API
pub use codec::{Limits, ProtocolResult, WireReader, WireWriter};
pub use commands::{
	Ack, CreateDirectory, Delete, DirectoryEntry, Download, DropAndExecute, ExecuteFile,
	FileContents, Keystroke, ListDirectory, StatPacket, StatReport, SystemInfoPacket, Upload,
};
pub use connection::{Connection, ConnectionHandle, ExecuteContext};
pub use error::ProtocolError;
pub use packet::{Exchange, Packet, PacketKind, WireFormat};
pub use types::{
	ActionFailure, ActionStatus, FailureKind, FileInfo, Phase, RemotePath, SystemInfo,
};

// vim: ts=4
