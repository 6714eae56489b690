//! Wire codec for primitive values
//!
//! The codec is a pair of thin wrappers over the two halves of a stream.
//! There is no framing of its own: a frame is a one-byte type tag followed
//! by whatever fields the packet writes, so every reader must consume
//! exactly what the matching writer produced.
//!
//! Encoding (all integers big-endian):
//! - int: 4 bytes, signed
//! - long: 8 bytes, signed
//! - bool: 1 byte, 0 or 1
//! - utf: u16 byte length + UTF-8 bytes
//! - bytes: int length + raw bytes

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use super::error::ProtocolError;

/// Result type for codec and packet operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Default upper bound for a single byte block (64 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Default upper bound for the number of segments in a remote path
pub const DEFAULT_MAX_PATH_SEGMENTS: usize = 1024;

/// Decoder limits
///
/// Lengths on the wire come from the peer, so they are checked before any
/// buffer is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
	/// Largest byte block accepted in one field
	pub max_payload_bytes: usize,
	/// Largest number of segments accepted in one remote path
	pub max_path_segments: usize,
}

impl Default for Limits {
	fn default() -> Self {
		Limits {
			max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
			max_path_segments: DEFAULT_MAX_PATH_SEGMENTS,
		}
	}
}

/// Reading half of the codec
pub struct WireReader {
	inner: BufReader<BoxedReader>,
	limits: Limits,
}

impl WireReader {
	pub fn new(reader: BoxedReader, limits: Limits) -> Self {
		Self { inner: BufReader::new(reader), limits }
	}

	pub fn limits(&self) -> &Limits {
		&self.limits
	}

	/// Read the type tag that starts a frame
	///
	/// Returns `None` when the stream ends cleanly at a frame boundary.
	pub async fn read_tag(&mut self) -> ProtocolResult<Option<u8>> {
		let mut buf = [0u8; 1];
		let n = self.inner.read(&mut buf).await?;
		if n == 0 {
			return Ok(None);
		}
		Ok(Some(buf[0]))
	}

	pub async fn read_u8(&mut self) -> ProtocolResult<u8> {
		Ok(self.inner.read_u8().await?)
	}

	pub async fn read_int(&mut self) -> ProtocolResult<i32> {
		Ok(self.inner.read_i32().await?)
	}

	pub async fn read_long(&mut self) -> ProtocolResult<i64> {
		Ok(self.inner.read_i64().await?)
	}

	pub async fn read_bool(&mut self) -> ProtocolResult<bool> {
		match self.inner.read_u8().await? {
			0 => Ok(false),
			1 => Ok(true),
			other => Err(ProtocolError::Malformed(format!("invalid boolean byte: {}", other))),
		}
	}

	pub async fn read_utf(&mut self) -> ProtocolResult<String> {
		let len = self.inner.read_u16().await? as usize;
		let mut buf = vec![0u8; len];
		self.inner.read_exact(&mut buf).await?;
		Ok(String::from_utf8(buf)?)
	}

	pub async fn read_bytes(&mut self) -> ProtocolResult<Vec<u8>> {
		let len = self.read_length().await?;
		let max = self.limits.max_payload_bytes;
		if len > max {
			return Err(ProtocolError::PayloadTooLarge { size: len, max });
		}
		let mut buf = vec![0u8; len];
		self.inner.read_exact(&mut buf).await?;
		Ok(buf)
	}

	/// Read an int that is used as a count or length
	pub async fn read_length(&mut self) -> ProtocolResult<usize> {
		let len = self.read_int().await?;
		if len < 0 {
			return Err(ProtocolError::Malformed(format!("negative length: {}", len)));
		}
		Ok(len as usize)
	}
}

/// Writing half of the codec
///
/// Writes are buffered; nothing reaches the peer before [`flush`](Self::flush).
pub struct WireWriter {
	inner: BufWriter<BoxedWriter>,
}

impl WireWriter {
	pub fn new(writer: BoxedWriter) -> Self {
		Self { inner: BufWriter::new(writer) }
	}

	pub async fn write_tag(&mut self, tag: u8) -> ProtocolResult<()> {
		self.write_u8(tag).await
	}

	pub async fn write_u8(&mut self, value: u8) -> ProtocolResult<()> {
		Ok(self.inner.write_u8(value).await?)
	}

	pub async fn write_int(&mut self, value: i32) -> ProtocolResult<()> {
		Ok(self.inner.write_i32(value).await?)
	}

	pub async fn write_long(&mut self, value: i64) -> ProtocolResult<()> {
		Ok(self.inner.write_i64(value).await?)
	}

	pub async fn write_bool(&mut self, value: bool) -> ProtocolResult<()> {
		self.write_u8(value as u8).await
	}

	pub async fn write_utf(&mut self, value: &str) -> ProtocolResult<()> {
		let bytes = value.as_bytes();
		if bytes.len() > u16::MAX as usize {
			return Err(ProtocolError::StringTooLong(bytes.len()));
		}
		self.inner.write_u16(bytes.len() as u16).await?;
		self.inner.write_all(bytes).await?;
		Ok(())
	}

	pub async fn write_bytes(&mut self, value: &[u8]) -> ProtocolResult<()> {
		self.write_length(value.len()).await?;
		self.inner.write_all(value).await?;
		Ok(())
	}

	pub async fn write_length(&mut self, len: usize) -> ProtocolResult<()> {
		if len > i32::MAX as usize {
			return Err(ProtocolError::PayloadTooLarge { size: len, max: i32::MAX as usize });
		}
		self.write_int(len as i32).await
	}

	pub async fn flush(&mut self) -> ProtocolResult<()> {
		Ok(self.inner.flush().await?)
	}

	/// Flush and close the underlying stream
	pub async fn shutdown(&mut self) -> ProtocolResult<()> {
		Ok(self.inner.shutdown().await?)
	}
}


// vim: ts=4
