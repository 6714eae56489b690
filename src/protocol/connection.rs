//! Per-connection dispatch
//!
//! Each connection runs one read loop and one writer task. The read loop
//! decodes a frame, executes it, and forwards every reply it produced to the
//! writer before it reads the next frame, so replies leave in the order the
//! requests arrived. Anything else that wants to send (the local user, a
//! keystroke source) goes through a cloneable [`ConnectionHandle`] feeding
//! the same writer channel.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;
use tracing::Instrument;
use uuid::Uuid;

use super::codec::{BoxedReader, BoxedWriter, Limits, ProtocolResult, WireReader, WireWriter};
use super::commands::{Ack, Keystroke};
use super::error::ProtocolError;
use super::packet::{Packet, PacketKind};
use super::types::{ActionFailure, ActionStatus, FailureKind, RemotePath};
use crate::events::{EventSink, PeerEvent};
use crate::logging::*;
use crate::provider::{FileSystemProvider, Services};

/// What a packet may touch while it executes
///
/// Replies are collected rather than written, the connection forwards them
/// once execution is over.
pub struct ExecuteContext<'a> {
	services: &'a Services,
	events: &'a EventSink,
	limits: Limits,
	replies: Vec<Packet>,
}

impl<'a> ExecuteContext<'a> {
	pub fn new(services: &'a Services, events: &'a EventSink, limits: Limits) -> Self {
		Self { services, events, limits, replies: Vec::new() }
	}

	pub fn services(&self) -> &Services {
		self.services
	}

	pub fn limits(&self) -> &Limits {
		&self.limits
	}

	/// The exported filesystem, or an `Unsupported` failure if there is none
	pub fn files(&self) -> Result<Arc<dyn FileSystemProvider>, ActionFailure> {
		self.services
			.files
			.clone()
			.ok_or_else(|| ActionFailure::unsupported("this peer exports no filesystem"))
	}

	/// Like [`files`](Self::files), but only if launching processes is allowed
	pub fn launcher(&self) -> Result<Arc<dyn FileSystemProvider>, ActionFailure> {
		if !self.services.allow_execute {
			return Err(ActionFailure::new(
				FailureKind::Disabled,
				"process execution is disabled on this peer",
			));
		}
		self.files()
	}

	/// Queue a packet to send back to the peer
	pub fn reply(&mut self, packet: Packet) {
		self.replies.push(packet);
	}

	/// Queue the ack for a finished command
	pub fn acknowledge(&mut self, command: PacketKind, path: RemotePath, status: ActionStatus) {
		if let ActionStatus::Failed(failure) = &status {
			warn!("{} {} failed: {}", command, path, failure);
		}
		self.reply(Packet::Ack(Ack::new(command, path, status)));
	}

	pub fn notify(&self, event: PeerEvent) {
		self.events.notify(event);
	}

	/// Replies queued so far, in queue order
	pub fn into_replies(self) -> Vec<Packet> {
		self.replies
	}
}

#[derive(Debug)]
enum Outgoing {
	Packet(Packet),
	Close,
}

/// Cloneable sending side of a running connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
	id: Uuid,
	tx: mpsc::UnboundedSender<Outgoing>,
}

impl ConnectionHandle {
	pub fn id(&self) -> Uuid {
		self.id
	}

	/// Queue a packet for the peer
	pub fn send(&self, packet: Packet) -> ProtocolResult<()> {
		self.tx.send(Outgoing::Packet(packet)).map_err(|_| ProtocolError::ConnectionClosed)
	}

	/// Forward one key event from a local keystroke source
	pub fn report_keystroke(&self, key_code: i32) -> ProtocolResult<()> {
		self.send(Packet::Keystroke(Keystroke::new(key_code)))
	}

	/// Finish sending: queued packets are written, then our half is closed
	///
	/// The read side keeps running until the peer closes its half too.
	pub fn close(&self) {
		if self.tx.send(Outgoing::Close).is_err() {
			debug!("connection {} already closed", self.id);
		}
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

/// One protocol session over a byte stream
pub struct Connection {
	id: Uuid,
	peer: String,
	reader: WireReader,
	writer: WireWriter,
	services: Services,
	events: EventSink,
	limits: Limits,
	tx: mpsc::UnboundedSender<Outgoing>,
	rx: mpsc::UnboundedReceiver<Outgoing>,
}

impl Connection {
	pub fn new<S>(
		stream: S,
		peer: impl Into<String>,
		services: Services,
		events: EventSink,
		limits: Limits,
	) -> Self
	where
		S: AsyncRead + AsyncWrite + Send + 'static,
	{
		let (read_half, write_half) = tokio::io::split(stream);
		Self::from_parts(Box::new(read_half), Box::new(write_half), peer, services, events, limits)
	}

	/// Build a connection over separate read and write streams
	pub fn from_parts(
		reader: BoxedReader,
		writer: BoxedWriter,
		peer: impl Into<String>,
		services: Services,
		events: EventSink,
		limits: Limits,
	) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Connection {
			id: Uuid::new_v4(),
			peer: peer.into(),
			reader: WireReader::new(reader, limits),
			writer: WireWriter::new(writer),
			services,
			events,
			limits,
			tx,
			rx,
		}
	}

	pub fn id(&self) -> Uuid {
		self.id
	}

	pub fn peer(&self) -> &str {
		&self.peer
	}

	pub fn handle(&self) -> ConnectionHandle {
		ConnectionHandle { id: self.id, tx: self.tx.clone() }
	}

	/// Serve the connection until the peer closes it or a frame is bad
	///
	/// A clean end of stream between frames returns `Ok`. Any protocol error
	/// ends the connection; queued replies are still flushed before the
	/// write half is closed. A failed write ends the read loop too, nothing
	/// more is executed once replies can no longer reach the peer.
	pub async fn run(self) -> ProtocolResult<()> {
		let span = tracing::info_span!("connection", id = %self.id, peer = %self.peer);
		let Connection { mut reader, writer, services, events, limits, tx, rx, .. } = self;

		let (shutdown_tx, shutdown_rx) = oneshot::channel();
		let mut writer_task =
			tokio::spawn(write_loop(writer, rx, shutdown_rx).instrument(span.clone()));
		let mut write_result = None;

		let read = read_loop(&mut reader, &services, &events, limits, &tx).instrument(span.clone());
		tokio::pin!(read);
		let read_result = loop {
			tokio::select! {
				biased;
				joined = &mut writer_task, if write_result.is_none() => match join_result(joined) {
					// our half was closed on request, keep reading until the peer closes too
					Ok(()) => write_result = Some(Ok(())),
					Err(e) => {
						span.in_scope(|| error!("write failed, dropping connection: {}", e));
						return Err(e);
					}
				},
				result = &mut read => break result,
			}
		};
		if let Err(e) = &read_result {
			span.in_scope(|| error!("connection failed: {}", e));
		}

		let write_result = match write_result {
			Some(result) => result,
			None => {
				let _ = shutdown_tx.send(());
				join_result(writer_task.await)
			}
		};
		read_result.and(write_result)
	}
}

fn join_result(joined: Result<ProtocolResult<()>, JoinError>) -> ProtocolResult<()> {
	match joined {
		Ok(result) => result,
		Err(e) => Err(ProtocolError::Io(io::Error::new(io::ErrorKind::Other, e.to_string()))),
	}
}

async fn read_loop(
	reader: &mut WireReader,
	services: &Services,
	events: &EventSink,
	limits: Limits,
	tx: &mpsc::UnboundedSender<Outgoing>,
) -> ProtocolResult<()> {
	while let Some(packet) = Packet::read_frame(reader).await? {
		trace!("received {} {:?}", packet.kind(), packet.phase());
		let mut ctx = ExecuteContext::new(services, events, limits);
		packet.execute(&mut ctx).await;
		for reply in ctx.into_replies() {
			let kind = reply.kind();
			if tx.send(Outgoing::Packet(reply)).is_err() {
				debug!("writer gone, dropping {} reply", kind);
			}
		}
	}
	debug!("peer closed the stream");
	Ok(())
}

async fn write_loop(
	mut writer: WireWriter,
	mut rx: mpsc::UnboundedReceiver<Outgoing>,
	mut shutdown: oneshot::Receiver<()>,
) -> ProtocolResult<()> {
	loop {
		tokio::select! {
			biased;
			outgoing = rx.recv() => match outgoing {
				Some(Outgoing::Packet(packet)) => {
					trace!("sending {}", packet.kind());
					packet.send(&mut writer).await?;
					writer.flush().await?;
				}
				Some(Outgoing::Close) | None => break,
			},
			_ = &mut shutdown => {
				while let Ok(Outgoing::Packet(packet)) = rx.try_recv() {
					packet.send(&mut writer).await?;
				}
				break;
			}
		}
	}
	writer.shutdown().await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::protocol::commands::{ListDirectory, Upload};
	use crate::protocol::packet::Exchange;
	use crate::protocol::types::SystemInfo;
	use crate::provider::StaticIdentity;
	use std::pin::Pin;
	use std::task::{Context, Poll};
	use std::time::Duration;
	use tokio::io::AsyncWriteExt;

	fn identity() -> SystemInfo {
		SystemInfo { name: "tester".into(), os: "TestOS 1".into(), version: "9.9".into() }
	}

	#[tokio::test]
	async fn test_keystroke_produces_no_reply() {
		let services = Services::requester();
		let (events, mut rx) = EventSink::channel();
		let mut ctx = ExecuteContext::new(&services, &events, Limits::default());
		Packet::Keystroke(Keystroke::new(65)).execute(&mut ctx).await;
		assert!(ctx.into_replies().is_empty());
		assert_eq!(rx.recv().await, Some(PeerEvent::Keystroke { key_code: 65 }));
	}

	#[tokio::test]
	async fn test_list_without_filesystem_is_unsupported() {
		let services = Services::requester();
		let events = EventSink::discard();
		let mut ctx = ExecuteContext::new(&services, &events, Limits::default());
		Packet::ListDirectory(ListDirectory::new(RemotePath::root())).execute(&mut ctx).await;
		let replies = ctx.into_replies();
		assert_eq!(replies.len(), 1);
		match &replies[0] {
			Packet::Ack(ack) => {
				assert_eq!(ack.command, PacketKind::ListDirectory);
				assert_eq!(ack.status.failure().map(|f| f.kind), Some(FailureKind::Unsupported));
			}
			other => panic!("expected ack, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_system_info_request_is_answered() {
		let services = Services::requester().with_identity(Arc::new(StaticIdentity(identity())));
		let events = EventSink::discard();
		let mut ctx = ExecuteContext::new(&services, &events, Limits::default());
		Packet::SystemInfo(Exchange::Request(())).execute(&mut ctx).await;
		assert_eq!(ctx.into_replies(), vec![Packet::SystemInfo(Exchange::Data(identity()))]);
	}

	#[tokio::test]
	async fn test_connections_exchange_system_info() {
		let (a, b) = tokio::io::duplex(4096);
		let responder_services =
			Services::requester().with_identity(Arc::new(StaticIdentity(identity())));
		let responder =
			Connection::new(a, "requester", responder_services, EventSink::discard(), Limits::default());
		let (events, mut rx) = EventSink::channel();
		let requester =
			Connection::new(b, "responder", Services::requester(), events, Limits::default());
		let handle = requester.handle();

		let responder_task = tokio::spawn(responder.run());
		let requester_task = tokio::spawn(requester.run());

		handle.send(Packet::SystemInfo(Exchange::Request(()))).unwrap();
		assert_eq!(rx.recv().await, Some(PeerEvent::SystemInfo(identity())));

		handle.close();
		requester_task.await.unwrap().unwrap();
		responder_task.await.unwrap().unwrap();
		assert!(handle.is_closed());
	}

	#[tokio::test]
	async fn test_unknown_tag_ends_connection() {
		let (a, mut b) = tokio::io::duplex(64);
		let connection =
			Connection::new(a, "raw", Services::requester(), EventSink::discard(), Limits::default());
		b.write_all(&[0xee]).await.unwrap();
		let result = connection.run().await;
		assert!(matches!(result, Err(ProtocolError::UnknownPacketTag(0xee))));
	}

	struct BrokenPipe;

	impl AsyncWrite for BrokenPipe {
		fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
			Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone")))
		}

		fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
			Poll::Ready(Ok(()))
		}

		fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
			Poll::Ready(Ok(()))
		}
	}

	#[tokio::test]
	async fn test_write_failure_stops_dispatch() {
		let root = tempfile::TempDir::new().unwrap();
		let (peer, ours) = tokio::io::duplex(4096);
		let connection = Connection::from_parts(
			Box::new(ours),
			Box::new(BrokenPipe),
			"peer",
			Services::responder(root.path(), false),
			EventSink::discard(),
			Limits::default(),
		);
		let task = tokio::spawn(connection.run());

		let mut writer = WireWriter::new(Box::new(peer));
		Packet::Upload(Upload::new(RemotePath::new(["one"]), b"1".to_vec()))
			.send(&mut writer)
			.await
			.unwrap();
		writer.flush().await.unwrap();

		let result = tokio::time::timeout(Duration::from_secs(5), task)
			.await
			.expect("dispatch loop kept running after the write failed")
			.unwrap();
		assert!(matches!(&result, Err(ProtocolError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe));
		assert!(root.path().join("one").exists());

		// nobody reads the stream any more, later commands are never executed
		let _ = Packet::Upload(Upload::new(RemotePath::new(["two"]), b"2".to_vec()))
			.send(&mut writer)
			.await;
		let _ = writer.flush().await;
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(!root.path().join("two").exists());
	}

	#[tokio::test]
	async fn test_clean_eof_is_ok() {
		let (a, b) = tokio::io::duplex(64);
		let connection =
			Connection::new(a, "raw", Services::requester(), EventSink::discard(), Limits::default());
		drop(b);
		assert!(connection.run().await.is_ok());
	}
}

// vim: ts=4
