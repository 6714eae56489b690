//! Wire round-trip tests
//!
//! Every catalog member written with `Packet::send` must come back from
//! `Packet::read_frame` as an equal value, with nothing left over.

use remotectl::protocol::commands::*;
use remotectl::protocol::{
	ActionFailure, ActionStatus, Exchange, FailureKind, FileInfo, Limits, Packet, PacketKind,
	ProtocolError, RemotePath, SystemInfo, WireReader, WireWriter,
};
use tokio::io::AsyncWriteExt;

// ============================================================================
// Helper Functions
// ============================================================================

fn pipe(limits: Limits) -> (WireWriter, WireReader) {
	let (a, b) = tokio::io::duplex(1 << 20);
	(WireWriter::new(Box::new(a)), WireReader::new(Box::new(b), limits))
}

fn docs() -> RemotePath {
	RemotePath::new(["docs", "a.txt"])
}

fn catalog() -> Vec<Packet> {
	let info = SystemInfo { name: "alice".into(), os: "Linux 6.1".into(), version: "1.0".into() };
	let stat_ok = StatReport {
		path: docs(),
		result: Ok(FileInfo {
			size: 1234,
			directory: false,
			created: 1_600_000_000_000,
			modified: 1_700_000_000_000,
			accessed: 0,
		}),
	};
	let stat_failed = StatReport {
		path: docs(),
		result: Err(ActionFailure::new(FailureKind::NotFound, "no such file")),
	};
	vec![
		Packet::SystemInfo(Exchange::Request(())),
		Packet::SystemInfo(Exchange::Data(info)),
		Packet::Keystroke(Keystroke::new(65)),
		Packet::Keystroke(Keystroke::default()),
		Packet::ListDirectory(ListDirectory::new(RemotePath::root())),
		Packet::DirectoryEntry(DirectoryEntry::new(docs())),
		Packet::Download(Download::new(docs())),
		Packet::FileContents(FileContents { path: docs(), data: vec![0, 1, 2, 255] }),
		Packet::Upload(Upload::new(docs(), b"hello".to_vec())),
		Packet::Execute(ExecuteFile::new(RemotePath::new(["bin", "tool"]))),
		Packet::Delete(Delete::new(docs())),
		Packet::CreateDirectory(CreateDirectory::new(RemotePath::new(["new", "dir"]))),
		Packet::DropAndExecute(DropAndExecute::new(RemotePath::new(["run.sh"]), b"#!/bin/sh\n".to_vec())),
		Packet::Stat(Exchange::Request(docs())),
		Packet::Stat(Exchange::Data(stat_ok)),
		Packet::Stat(Exchange::Data(stat_failed)),
		Packet::Ack(Ack::new(PacketKind::Upload, docs(), ActionStatus::Ok)),
		Packet::Ack(Ack::new(
			PacketKind::Delete,
			docs(),
			ActionStatus::Failed(ActionFailure::new(FailureKind::PermissionDenied, "read-only")),
		)),
	]
}

// ============================================================================
// Round Trips
// ============================================================================

#[tokio::test]
async fn test_every_packet_roundtrips() {
	for packet in catalog() {
		let (mut writer, mut reader) = pipe(Limits::default());
		packet.send(&mut writer).await.unwrap();
		writer.shutdown().await.unwrap();

		let decoded = Packet::read_frame(&mut reader).await.unwrap();
		assert_eq!(decoded.as_ref(), Some(&packet), "{} did not round-trip", packet.kind());
		assert!(Packet::read_frame(&mut reader).await.unwrap().is_none(), "trailing bytes after {}", packet.kind());
	}
}

#[tokio::test]
async fn test_catalog_covers_every_kind() {
	let mut kinds: Vec<PacketKind> = catalog().iter().map(Packet::kind).collect();
	kinds.dedup();
	for kind in PacketKind::ALL {
		assert!(kinds.contains(&kind), "{} missing from catalog fixture", kind);
	}
}

#[tokio::test]
async fn test_frames_back_to_back() {
	let packets = catalog();
	let (mut writer, mut reader) = pipe(Limits::default());
	for packet in &packets {
		packet.send(&mut writer).await.unwrap();
	}
	writer.shutdown().await.unwrap();

	for expected in &packets {
		assert_eq!(Packet::read_frame(&mut reader).await.unwrap().as_ref(), Some(expected));
	}
	assert!(Packet::read_frame(&mut reader).await.unwrap().is_none());
}

#[tokio::test]
async fn test_ping_pong_phase_byte_leads_body() {
	let (a, mut b) = tokio::io::duplex(64);
	let mut writer = WireWriter::new(Box::new(a));
	Packet::SystemInfo(Exchange::Request(())).send(&mut writer).await.unwrap();
	writer.shutdown().await.unwrap();

	let mut raw = Vec::new();
	tokio::io::AsyncReadExt::read_to_end(&mut b, &mut raw).await.unwrap();
	assert_eq!(raw, vec![PacketKind::SystemInfo.tag(), 0]);
}

// ============================================================================
// Decode Failures
// ============================================================================

#[tokio::test]
async fn test_bad_phase_byte() {
	let (mut a, b) = tokio::io::duplex(64);
	let mut reader = WireReader::new(Box::new(b), Limits::default());
	a.write_all(&[PacketKind::Stat.tag(), 7]).await.unwrap();
	drop(a);
	let err = Packet::read_frame(&mut reader).await.unwrap_err();
	assert!(matches!(err, ProtocolError::InvalidPhase(7)));
}

#[tokio::test]
async fn test_truncated_frame_is_error() {
	let (mut a, b) = tokio::io::duplex(64);
	let mut reader = WireReader::new(Box::new(b), Limits::default());
	// keystroke tag followed by half an int
	a.write_all(&[PacketKind::Keystroke.tag(), 0, 0]).await.unwrap();
	drop(a);
	let err = Packet::read_frame(&mut reader).await.unwrap_err();
	assert!(err.is_transport());
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
	let limits = Limits { max_payload_bytes: 4, ..Limits::default() };
	let (mut writer, mut reader) = pipe(limits);
	Packet::Upload(Upload::new(docs(), vec![0; 16])).send(&mut writer).await.unwrap();
	writer.shutdown().await.unwrap();
	let err = Packet::read_frame(&mut reader).await.unwrap_err();
	assert!(matches!(err, ProtocolError::PayloadTooLarge { size: 16, max: 4 }));
}

#[tokio::test]
async fn test_deep_path_rejected() {
	let limits = Limits { max_path_segments: 2, ..Limits::default() };
	let (mut writer, mut reader) = pipe(limits);
	Packet::Delete(Delete::new(RemotePath::new(["a", "b", "c"]))).send(&mut writer).await.unwrap();
	writer.shutdown().await.unwrap();
	let err = Packet::read_frame(&mut reader).await.unwrap_err();
	assert!(matches!(err, ProtocolError::Malformed(_)));
}

#[tokio::test]
async fn test_oversized_string_cannot_be_written() {
	let (mut writer, _reader) = pipe(Limits::default());
	let long = "x".repeat(70_000);
	let err = Packet::DirectoryEntry(DirectoryEntry::new(RemotePath::new([long])))
		.send(&mut writer)
		.await
		.unwrap_err();
	assert!(matches!(err, ProtocolError::StringTooLong(70_000)));
}

// vim: ts=4
