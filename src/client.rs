//! Requester side convenience API
//!
//! A [`Client`] sends commands through a running connection and reads back
//! the events the peer's answers turn into. It does not wait for anything
//! by itself; [`Client::run_command`] is the one place that knows which
//! event finishes which command.

use serde::Serialize;

use crate::error::ConnectionError;
use crate::events::{EventReceiver, PeerEvent};
use crate::protocol::commands::*;
use crate::protocol::{
	ConnectionHandle, Exchange, Packet, PacketKind, ProtocolResult, RemotePath, SystemInfo,
};

/// File tree commands as offered to a user
///
/// Listing and stat are what a file browser calls "request" and
/// "information".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileCommand {
	List,
	Download,
	Upload,
	Execute,
	Delete,
	NewDirectory,
	DropFile,
	Information,
}

impl FileCommand {
	pub const ALL: [FileCommand; 8] = [
		FileCommand::List,
		FileCommand::Download,
		FileCommand::Upload,
		FileCommand::Execute,
		FileCommand::Delete,
		FileCommand::NewDirectory,
		FileCommand::DropFile,
		FileCommand::Information,
	];

	/// Look a command up by its user-facing name
	pub fn parse(name: &str) -> Option<FileCommand> {
		match name.to_ascii_lowercase().as_str() {
			"list" | "ls" | "request" => Some(FileCommand::List),
			"download" | "get" => Some(FileCommand::Download),
			"upload" | "put" => Some(FileCommand::Upload),
			"execute" | "exec" => Some(FileCommand::Execute),
			"delete" | "rm" => Some(FileCommand::Delete),
			"new-directory" | "mkdir" => Some(FileCommand::NewDirectory),
			"drop-file" | "drop" => Some(FileCommand::DropFile),
			"information" | "stat" => Some(FileCommand::Information),
			_ => None,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			FileCommand::List => "list",
			FileCommand::Download => "download",
			FileCommand::Upload => "upload",
			FileCommand::Execute => "execute",
			FileCommand::Delete => "delete",
			FileCommand::NewDirectory => "new-directory",
			FileCommand::DropFile => "drop-file",
			FileCommand::Information => "information",
		}
	}

	/// Packet type this command sends
	pub fn kind(self) -> PacketKind {
		match self {
			FileCommand::List => PacketKind::ListDirectory,
			FileCommand::Download => PacketKind::Download,
			FileCommand::Upload => PacketKind::Upload,
			FileCommand::Execute => PacketKind::Execute,
			FileCommand::Delete => PacketKind::Delete,
			FileCommand::NewDirectory => PacketKind::CreateDirectory,
			FileCommand::DropFile => PacketKind::DropAndExecute,
			FileCommand::Information => PacketKind::Stat,
		}
	}

	/// Upload and drop-file carry file contents
	pub fn takes_data(self) -> bool {
		matches!(self, FileCommand::Upload | FileCommand::DropFile)
	}

	/// Build the packet for `path`; `data` is ignored unless [`takes_data`](Self::takes_data)
	pub fn into_packet(self, path: RemotePath, data: Vec<u8>) -> Packet {
		match self {
			FileCommand::List => Packet::ListDirectory(ListDirectory::new(path)),
			FileCommand::Download => Packet::Download(Download::new(path)),
			FileCommand::Upload => Packet::Upload(Upload::new(path, data)),
			FileCommand::Execute => Packet::Execute(ExecuteFile::new(path)),
			FileCommand::Delete => Packet::Delete(Delete::new(path)),
			FileCommand::NewDirectory => Packet::CreateDirectory(CreateDirectory::new(path)),
			FileCommand::DropFile => Packet::DropAndExecute(DropAndExecute::new(path, data)),
			FileCommand::Information => Packet::Stat(Exchange::Request(path)),
		}
	}

	/// Whether `event` is the last thing the peer sends for this command on `path`
	pub fn is_final(self, path: &RemotePath, event: &PeerEvent) -> bool {
		match event {
			PeerEvent::Ack(ack) => ack.command == self.kind() && &ack.path == path,
			PeerEvent::FileContents { path: got, .. } => self == FileCommand::Download && got == path,
			PeerEvent::Stat(report) => self == FileCommand::Information && &report.path == path,
			_ => false,
		}
	}
}

/// Requester bound to one connection
pub struct Client {
	handle: ConnectionHandle,
	events: EventReceiver,
}

impl Client {
	pub fn new(handle: ConnectionHandle, events: EventReceiver) -> Self {
		Self { handle, events }
	}

	pub fn handle(&self) -> &ConnectionHandle {
		&self.handle
	}

	pub fn request_system_info(&self) -> ProtocolResult<()> {
		self.handle.send(Packet::SystemInfo(Exchange::Request(())))
	}

	pub fn list(&self, path: RemotePath) -> ProtocolResult<()> {
		self.handle.send(Packet::ListDirectory(ListDirectory::new(path)))
	}

	pub fn download(&self, path: RemotePath) -> ProtocolResult<()> {
		self.handle.send(Packet::Download(Download::new(path)))
	}

	pub fn upload(&self, path: RemotePath, data: Vec<u8>) -> ProtocolResult<()> {
		self.handle.send(Packet::Upload(Upload::new(path, data)))
	}

	pub fn execute(&self, path: RemotePath) -> ProtocolResult<()> {
		self.handle.send(Packet::Execute(ExecuteFile::new(path)))
	}

	pub fn delete(&self, path: RemotePath) -> ProtocolResult<()> {
		self.handle.send(Packet::Delete(Delete::new(path)))
	}

	pub fn create_dir(&self, path: RemotePath) -> ProtocolResult<()> {
		self.handle.send(Packet::CreateDirectory(CreateDirectory::new(path)))
	}

	pub fn drop_and_execute(&self, path: RemotePath, data: Vec<u8>) -> ProtocolResult<()> {
		self.handle.send(Packet::DropAndExecute(DropAndExecute::new(path, data)))
	}

	pub fn stat(&self, path: RemotePath) -> ProtocolResult<()> {
		self.handle.send(Packet::Stat(Exchange::Request(path)))
	}

	/// Next event from the peer; `None` once the connection has ended
	pub async fn next_event(&mut self) -> Option<PeerEvent> {
		self.events.recv().await
	}

	/// Ask for the peer's identity and wait for the answer
	pub async fn system_info(&mut self) -> Result<SystemInfo, ConnectionError> {
		self.request_system_info()?;
		loop {
			match self.next_event().await {
				Some(PeerEvent::SystemInfo(info)) => return Ok(info),
				Some(_) => continue,
				None => return Err(ConnectionError::Disconnected),
			}
		}
	}

	/// Send a file command and pass every event to `on_event` until the final one
	pub async fn run_command<F>(
		&mut self,
		command: FileCommand,
		path: RemotePath,
		data: Vec<u8>,
		mut on_event: F,
	) -> Result<(), ConnectionError>
	where
		F: FnMut(&PeerEvent),
	{
		self.handle.send(command.into_packet(path.clone(), data))?;
		loop {
			let event = self.next_event().await.ok_or(ConnectionError::Disconnected)?;
			on_event(&event);
			if command.is_final(&path, &event) {
				return Ok(());
			}
		}
	}

	/// Stop sending; the connection ends once the peer closes too
	pub fn close(&self) {
		self.handle.close();
	}
}


// vim: ts=4
