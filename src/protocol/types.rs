//! Value types carried inside packets

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

use super::codec::{ProtocolResult, WireReader, WireWriter};
use super::error::ProtocolError;
use super::packet::WireFormat;

/// Phase of a ping-pong packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
	Request,
	Data,
}

impl Phase {
	pub fn to_wire(self) -> u8 {
		match self {
			Phase::Request => 0,
			Phase::Data => 1,
		}
	}

	pub fn from_wire(byte: u8) -> ProtocolResult<Self> {
		match byte {
			0 => Ok(Phase::Request),
			1 => Ok(Phase::Data),
			other => Err(ProtocolError::InvalidPhase(other)),
		}
	}
}

/// Path of a node in the peer's filesystem, as a list of segment names
///
/// The empty path is the root of whatever the peer exports. Whether a node
/// is a file or a directory is not part of the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemotePath(Vec<String>);

impl RemotePath {
	pub fn new<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		RemotePath(segments.into_iter().map(Into::into).collect())
	}

	pub fn root() -> Self {
		RemotePath(Vec::new())
	}

	/// Split a display string on either separator style, dropping empty parts
	///
	/// `"C:\\Users\\me"` and `"/home/me/"` both work; the result is only as
	/// good as the input, the segment list is what travels on the wire.
	pub fn from_display(s: &str) -> Self {
		RemotePath(
			s.split(|c: char| c == '/' || c == '\\')
				.filter(|part| !part.is_empty())
				.map(str::to_string)
				.collect(),
		)
	}

	pub fn segments(&self) -> &[String] {
		&self.0
	}

	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn file_name(&self) -> Option<&str> {
		self.0.last().map(String::as_str)
	}

	pub fn parent(&self) -> Option<RemotePath> {
		if self.0.is_empty() {
			return None;
		}
		Some(RemotePath(self.0[..self.0.len() - 1].to_vec()))
	}

	pub fn join(&self, name: impl Into<String>) -> RemotePath {
		let mut segments = self.0.clone();
		segments.push(name.into());
		RemotePath(segments)
	}
}

impl fmt::Display for RemotePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "/{}", self.0.join("/"))
	}
}

#[async_trait]
impl WireFormat for RemotePath {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_length(self.0.len()).await?;
		for segment in &self.0 {
			w.write_utf(segment).await?;
		}
		Ok(())
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let count = r.read_length().await?;
		let max = r.limits().max_path_segments;
		if count > max {
			return Err(ProtocolError::Malformed(format!(
				"path has {} segments (max {})",
				count, max
			)));
		}
		let mut segments = Vec::with_capacity(count);
		for _ in 0..count {
			segments.push(r.read_utf().await?);
		}
		Ok(RemotePath(segments))
	}
}

/// Identity of the responding peer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
	pub name: String,
	pub os: String,
	pub version: String,
}

#[async_trait]
impl WireFormat for SystemInfo {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_utf(&self.name).await?;
		w.write_utf(&self.os).await?;
		w.write_utf(&self.version).await
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let name = r.read_utf().await?;
		let os = r.read_utf().await?;
		let version = r.read_utf().await?;
		Ok(SystemInfo { name, os, version })
	}
}

/// Metadata of one filesystem node
///
/// Timestamps are unix milliseconds; 0 means the platform did not report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
	pub size: i64,
	pub directory: bool,
	pub created: i64,
	pub modified: i64,
	pub accessed: i64,
}

#[async_trait]
impl WireFormat for FileInfo {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_long(self.size).await?;
		w.write_bool(self.directory).await?;
		w.write_long(self.created).await?;
		w.write_long(self.modified).await?;
		w.write_long(self.accessed).await
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let size = r.read_long().await?;
		let directory = r.read_bool().await?;
		let created = r.read_long().await?;
		let modified = r.read_long().await?;
		let accessed = r.read_long().await?;
		Ok(FileInfo { size, directory, created, modified, accessed })
	}
}

/// Category of a failed local action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
	NotFound,
	PermissionDenied,
	AlreadyExists,
	InvalidPath,
	Unsupported,
	Disabled,
	TooLarge,
	Other,
}

impl FailureKind {
	fn code(self) -> i32 {
		match self {
			FailureKind::NotFound => 1,
			FailureKind::PermissionDenied => 2,
			FailureKind::AlreadyExists => 3,
			FailureKind::InvalidPath => 4,
			FailureKind::Unsupported => 5,
			FailureKind::Disabled => 6,
			FailureKind::TooLarge => 7,
			FailureKind::Other => 8,
		}
	}

	fn from_code(code: i32) -> ProtocolResult<Self> {
		Ok(match code {
			1 => FailureKind::NotFound,
			2 => FailureKind::PermissionDenied,
			3 => FailureKind::AlreadyExists,
			4 => FailureKind::InvalidPath,
			5 => FailureKind::Unsupported,
			6 => FailureKind::Disabled,
			7 => FailureKind::TooLarge,
			8 => FailureKind::Other,
			other => {
				return Err(ProtocolError::Malformed(format!("unknown failure code: {}", other)))
			}
		})
	}
}

/// A local action that failed on the responder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
	pub kind: FailureKind,
	pub message: String,
}

impl ActionFailure {
	pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into() }
	}

	pub fn unsupported(message: impl Into<String>) -> Self {
		Self::new(FailureKind::Unsupported, message)
	}

	async fn write_body(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		w.write_int(self.kind.code()).await?;
		w.write_utf(&self.message).await
	}
}

impl fmt::Display for ActionFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}: {}", self.kind, self.message)
	}
}

impl From<io::Error> for ActionFailure {
	fn from(e: io::Error) -> Self {
		let kind = match e.kind() {
			io::ErrorKind::NotFound => FailureKind::NotFound,
			io::ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
			io::ErrorKind::AlreadyExists => FailureKind::AlreadyExists,
			io::ErrorKind::InvalidInput => FailureKind::InvalidPath,
			io::ErrorKind::Unsupported => FailureKind::Unsupported,
			_ => FailureKind::Other,
		};
		ActionFailure::new(kind, e.to_string())
	}
}

/// Outcome of a local action, as reported back to the requester
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
	Ok,
	Failed(ActionFailure),
}

impl ActionStatus {
	pub fn is_ok(&self) -> bool {
		matches!(self, ActionStatus::Ok)
	}

	pub fn failure(&self) -> Option<&ActionFailure> {
		match self {
			ActionStatus::Ok => None,
			ActionStatus::Failed(failure) => Some(failure),
		}
	}
}

impl From<Result<(), ActionFailure>> for ActionStatus {
	fn from(result: Result<(), ActionFailure>) -> Self {
		match result {
			Ok(()) => ActionStatus::Ok,
			Err(failure) => ActionStatus::Failed(failure),
		}
	}
}

#[async_trait]
impl WireFormat for ActionStatus {
	async fn write_to(&self, w: &mut WireWriter) -> ProtocolResult<()> {
		match self {
			ActionStatus::Ok => w.write_int(0).await,
			ActionStatus::Failed(failure) => failure.write_body(w).await,
		}
	}

	async fn read_from(r: &mut WireReader) -> ProtocolResult<Self> {
		let code = r.read_int().await?;
		if code == 0 {
			return Ok(ActionStatus::Ok);
		}
		let kind = FailureKind::from_code(code)?;
		let message = r.read_utf().await?;
		Ok(ActionStatus::Failed(ActionFailure { kind, message }))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_display_mixed_separators() {
		assert_eq!(RemotePath::from_display("C:\\Users\\me"), RemotePath::new(["C:", "Users", "me"]));
		assert_eq!(RemotePath::from_display("/home//me/"), RemotePath::new(["home", "me"]));
		assert!(RemotePath::from_display("/").is_root());
	}

	#[test]
	fn test_join_and_parent() {
		let docs = RemotePath::new(["docs"]);
		let file = docs.join("a.txt");
		assert_eq!(file.segments(), &["docs".to_string(), "a.txt".to_string()]);
		assert_eq!(file.file_name(), Some("a.txt"));
		assert_eq!(file.parent(), Some(docs));
		assert_eq!(RemotePath::root().parent(), None);
	}

	#[test]
	fn test_display() {
		assert_eq!(RemotePath::new(["a", "b"]).to_string(), "/a/b");
		assert_eq!(RemotePath::root().to_string(), "/");
	}

	#[test]
	fn test_phase_wire_values() {
		assert_eq!(Phase::from_wire(Phase::Request.to_wire()).unwrap(), Phase::Request);
		assert_eq!(Phase::from_wire(Phase::Data.to_wire()).unwrap(), Phase::Data);
		assert!(matches!(Phase::from_wire(9), Err(ProtocolError::InvalidPhase(9))));
	}

	#[test]
	fn test_failure_from_io_error() {
		let failure = ActionFailure::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
		assert_eq!(failure.kind, FailureKind::NotFound);
		assert!(failure.message.contains("gone"));
	}

	#[test]
	fn test_failure_codes_are_distinct() {
		let kinds = [
			FailureKind::NotFound,
			FailureKind::PermissionDenied,
			FailureKind::AlreadyExists,
			FailureKind::InvalidPath,
			FailureKind::Unsupported,
			FailureKind::Disabled,
			FailureKind::TooLarge,
			FailureKind::Other,
		];
		for kind in kinds {
			assert_ne!(kind.code(), 0);
			assert_eq!(FailureKind::from_code(kind.code()).unwrap(), kind);
		}
	}
}

// vim: ts=4
