//! Local collaborators a responder acts through
//!
//! The protocol decides *when* a filesystem or identity lookup happens and
//! what goes on the wire; these traits decide *how*. A peer that exports no
//! filesystem answers every file command with an `Unsupported` ack.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::protocol::types::{ActionFailure, FileInfo, RemotePath, SystemInfo};

pub mod fs;
pub mod identity;

pub use fs::RootedFileSystem;
pub use identity::{LocalIdentity, StaticIdentity};

/// Result of a local action
pub type ActionResult<T> = Result<T, ActionFailure>;

/// Supplies the identity reported in system info answers
pub trait IdentityProvider: Send + Sync {
	fn system_info(&self) -> SystemInfo;
}

/// Filesystem primitives keyed by remote path
#[async_trait]
pub trait FileSystemProvider: Send + Sync {
	/// Names of the direct children of a directory, in the order to report them
	async fn list(&self, path: &RemotePath) -> ActionResult<Vec<String>>;

	/// Contents of a file, or `TooLarge` if it holds more than `max_bytes`
	///
	/// The limit is enforced without reading more than `max_bytes + 1` bytes.
	async fn read(&self, path: &RemotePath, max_bytes: usize) -> ActionResult<Vec<u8>>;

	/// Create or replace a file
	async fn write(&self, path: &RemotePath, data: &[u8]) -> ActionResult<()>;

	/// Remove a file, or a directory with everything below it
	async fn delete(&self, path: &RemotePath) -> ActionResult<()>;

	async fn create_dir(&self, path: &RemotePath) -> ActionResult<()>;

	/// Start the file as a detached process and return its pid
	async fn launch(&self, path: &RemotePath) -> ActionResult<u32>;

	async fn stat(&self, path: &RemotePath) -> ActionResult<FileInfo>;
}

/// Everything a connection may act through while executing packets
#[derive(Clone)]
pub struct Services {
	pub identity: Arc<dyn IdentityProvider>,
	pub files: Option<Arc<dyn FileSystemProvider>>,
	/// Whether execute and drop-and-execute may start processes
	pub allow_execute: bool,
}

impl Services {
	/// Services for the side that only issues requests
	pub fn requester() -> Self {
		Services { identity: Arc::new(LocalIdentity::new()), files: None, allow_execute: false }
	}

	/// Services for a responder exporting `root`
	pub fn responder(root: impl Into<PathBuf>, allow_execute: bool) -> Self {
		Services {
			identity: Arc::new(LocalIdentity::new()),
			files: Some(Arc::new(RootedFileSystem::new(root))),
			allow_execute,
		}
	}

	pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
		self.identity = identity;
		self
	}

	pub fn with_files(mut self, files: Arc<dyn FileSystemProvider>) -> Self {
		self.files = Some(files);
		self
	}

	pub fn with_allow_execute(mut self, allow: bool) -> Self {
		self.allow_execute = allow;
		self
	}
}

impl Default for Services {
	fn default() -> Self {
		Self::requester()
	}
}

impl fmt::Debug for Services {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Services")
			.field("files", &self.files.is_some())
			.field("allow_execute", &self.allow_execute)
			.finish()
	}
}

// vim: ts=4
