//! Filesystem provider rooted at one local directory

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs as afs;
use tokio::io::AsyncReadExt;

use super::{ActionResult, FileSystemProvider};
use crate::logging::*;
use crate::protocol::types::{ActionFailure, FailureKind, FileInfo, RemotePath};
use crate::validation;

/// Exports the tree below `root`; the empty remote path is `root` itself
#[derive(Debug, Clone)]
pub struct RootedFileSystem {
	root: PathBuf,
}

impl RootedFileSystem {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Map a remote path onto the local tree without touching the disk
	fn local_path(&self, path: &RemotePath) -> ActionResult<PathBuf> {
		validation::resolve_under_root(&self.root, path)
			.map_err(|e| ActionFailure::new(FailureKind::InvalidPath, e.to_string()))
	}

	/// Like `local_path`, but the root itself is not an acceptable target
	fn local_path_below_root(&self, path: &RemotePath, action: &str) -> ActionResult<PathBuf> {
		if path.is_root() {
			return Err(ActionFailure::new(
				FailureKind::InvalidPath,
				format!("cannot {} the exported root", action),
			));
		}
		self.local_path(path)
	}

	async fn resolve(&self, path: &RemotePath) -> ActionResult<PathBuf> {
		self.confine(self.local_path(path)?).await
	}

	async fn resolve_below_root(&self, path: &RemotePath, action: &str) -> ActionResult<PathBuf> {
		self.confine(self.local_path_below_root(path, action)?).await
	}

	/// Reject `local` if following symlinks along it leaves the root
	///
	/// The deepest existing ancestor is canonicalized, so paths that do not
	/// exist yet can still be created. A dangling symlink is rejected since
	/// writing through it would create its target.
	async fn confine(&self, local: PathBuf) -> ActionResult<PathBuf> {
		let root = afs::canonicalize(&self.root).await?;
		let mut existing = local.as_path();
		let real = loop {
			match afs::canonicalize(existing).await {
				Ok(real) => break real,
				Err(e) if e.kind() == io::ErrorKind::NotFound => {
					if afs::symlink_metadata(existing).await.is_ok() {
						return Err(ActionFailure::new(
							FailureKind::InvalidPath,
							format!("{} is a dangling symlink", existing.display()),
						));
					}
					match existing.parent() {
						Some(parent) => existing = parent,
						None => return Err(e.into()),
					}
				}
				Err(e) => return Err(e.into()),
			}
		};
		validation::validate_path_within_root(&real, &root)
			.map_err(|e| ActionFailure::new(FailureKind::InvalidPath, e.to_string()))?;
		Ok(local)
	}
}

fn too_large(size: u64, max: usize) -> ActionFailure {
	ActionFailure::new(
		FailureKind::TooLarge,
		format!("file is {} bytes, transfer limit is {}", size, max),
	)
}

fn unix_millis(time: std::io::Result<SystemTime>) -> i64 {
	time.ok()
		.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
		.map(|d| d.as_millis() as i64)
		.unwrap_or(0)
}

#[async_trait]
impl FileSystemProvider for RootedFileSystem {
	async fn list(&self, path: &RemotePath) -> ActionResult<Vec<String>> {
		let dir = self.resolve(path).await?;
		let mut entries = afs::read_dir(&dir).await?;
		let mut names = Vec::new();
		while let Some(entry) = entries.next_entry().await? {
			match entry.file_name().into_string() {
				Ok(name) => names.push(name),
				Err(raw) => warn!("skipping non UTF-8 name {:?} in {}", raw, dir.display()),
			}
		}
		names.sort();
		Ok(names)
	}

	async fn read(&self, path: &RemotePath, max_bytes: usize) -> ActionResult<Vec<u8>> {
		let file = self.resolve_below_root(path, "read").await?;
		let handle = afs::File::open(&file).await?;
		let size = handle.metadata().await?.len();
		if size > max_bytes as u64 {
			return Err(too_large(size, max_bytes));
		}
		// the file may grow after the size check
		let mut data = Vec::with_capacity(size as usize);
		handle.take(max_bytes as u64 + 1).read_to_end(&mut data).await?;
		if data.len() > max_bytes {
			return Err(too_large(data.len() as u64, max_bytes));
		}
		Ok(data)
	}

	async fn write(&self, path: &RemotePath, data: &[u8]) -> ActionResult<()> {
		let file = self.resolve_below_root(path, "write").await?;
		afs::write(&file, data).await?;
		debug!("wrote {} bytes to {}", data.len(), file.display());
		Ok(())
	}

	async fn delete(&self, path: &RemotePath) -> ActionResult<()> {
		// the link itself is removed, only its parent has to stay inside
		let target = self.local_path_below_root(path, "delete")?;
		if let Some(parent) = target.parent() {
			self.confine(parent.to_path_buf()).await?;
		}
		let meta = afs::symlink_metadata(&target).await?;
		if meta.is_dir() {
			afs::remove_dir_all(&target).await?;
		} else {
			afs::remove_file(&target).await?;
		}
		debug!("deleted {}", target.display());
		Ok(())
	}

	async fn create_dir(&self, path: &RemotePath) -> ActionResult<()> {
		let dir = self.resolve_below_root(path, "create").await?;
		afs::create_dir_all(&dir).await?;
		Ok(())
	}

	async fn launch(&self, path: &RemotePath) -> ActionResult<u32> {
		let program = self.resolve_below_root(path, "launch").await?;
		let mut command = tokio::process::Command::new(&program);
		if let Some(parent) = program.parent() {
			command.current_dir(parent);
		}
		let child = command
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()?;
		Ok(child.id().unwrap_or(0))
	}

	async fn stat(&self, path: &RemotePath) -> ActionResult<FileInfo> {
		let target = self.resolve(path).await?;
		let meta = afs::metadata(&target).await?;
		Ok(FileInfo {
			size: meta.len() as i64,
			directory: meta.is_dir(),
			created: unix_millis(meta.created()),
			modified: unix_millis(meta.modified()),
			accessed: unix_millis(meta.accessed()),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	fn fixture() -> (TempDir, RootedFileSystem) {
		let dir = TempDir::new().unwrap();
		fs::create_dir(dir.path().join("docs")).unwrap();
		fs::write(dir.path().join("docs/b.txt"), b"bee").unwrap();
		fs::write(dir.path().join("docs/a.txt"), b"ay").unwrap();
		let provider = RootedFileSystem::new(dir.path());
		(dir, provider)
	}

	#[tokio::test]
	async fn test_list_is_sorted() {
		let (_dir, provider) = fixture();
		let names = provider.list(&RemotePath::new(["docs"])).await.unwrap();
		assert_eq!(names, vec!["a.txt", "b.txt"]);
		assert_eq!(provider.list(&RemotePath::root()).await.unwrap(), vec!["docs"]);
	}

	#[tokio::test]
	async fn test_read_write_roundtrip() {
		let (dir, provider) = fixture();
		let path = RemotePath::new(["docs", "c.bin"]);
		provider.write(&path, &[0, 1, 2]).await.unwrap();
		assert_eq!(provider.read(&path, 1024).await.unwrap(), vec![0, 1, 2]);
		assert!(dir.path().join("docs/c.bin").exists());
	}

	#[tokio::test]
	async fn test_delete_missing_is_not_found() {
		let (_dir, provider) = fixture();
		let err = provider.delete(&RemotePath::new(["nope"])).await.unwrap_err();
		assert_eq!(err.kind, FailureKind::NotFound);
	}

	#[tokio::test]
	async fn test_delete_subtree() {
		let (dir, provider) = fixture();
		provider.delete(&RemotePath::new(["docs"])).await.unwrap();
		assert!(!dir.path().join("docs").exists());
	}

	#[tokio::test]
	async fn test_root_cannot_be_deleted() {
		let (dir, provider) = fixture();
		let err = provider.delete(&RemotePath::root()).await.unwrap_err();
		assert_eq!(err.kind, FailureKind::InvalidPath);
		assert!(dir.path().exists());
	}

	#[tokio::test]
	async fn test_escape_rejected() {
		let (_dir, provider) = fixture();
		let err = provider.read(&RemotePath::new(["..", "etc", "passwd"]), 1024).await.unwrap_err();
		assert_eq!(err.kind, FailureKind::InvalidPath);
	}

	#[tokio::test]
	async fn test_read_over_limit_is_too_large() {
		let (_dir, provider) = fixture();
		let path = RemotePath::new(["docs", "b.txt"]);
		let err = provider.read(&path, 2).await.unwrap_err();
		assert_eq!(err.kind, FailureKind::TooLarge);
		assert_eq!(provider.read(&path, 3).await.unwrap(), b"bee".to_vec());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_symlink_out_of_root_rejected() {
		let (dir, provider) = fixture();
		let outside = TempDir::new().unwrap();
		fs::write(outside.path().join("secret"), b"s").unwrap();
		std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();

		let secret = RemotePath::new(["escape", "secret"]);
		assert_eq!(provider.read(&secret, 1024).await.unwrap_err().kind, FailureKind::InvalidPath);
		assert_eq!(provider.stat(&secret).await.unwrap_err().kind, FailureKind::InvalidPath);
		let planted = RemotePath::new(["escape", "planted"]);
		assert_eq!(provider.write(&planted, b"x").await.unwrap_err().kind, FailureKind::InvalidPath);
		assert!(!outside.path().join("planted").exists());

		// removing the link leaves its target alone
		provider.delete(&RemotePath::new(["escape"])).await.unwrap();
		assert!(outside.path().join("secret").exists());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_dangling_symlink_not_written_through() {
		let (dir, provider) = fixture();
		let outside = TempDir::new().unwrap();
		std::os::unix::fs::symlink(outside.path().join("new"), dir.path().join("link")).unwrap();
		let err = provider.write(&RemotePath::new(["link"]), b"x").await.unwrap_err();
		assert_eq!(err.kind, FailureKind::InvalidPath);
		assert!(!outside.path().join("new").exists());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_symlink_inside_root_followed() {
		let (dir, provider) = fixture();
		std::os::unix::fs::symlink(dir.path().join("docs"), dir.path().join("alias")).unwrap();
		let data = provider.read(&RemotePath::new(["alias", "a.txt"]), 1024).await.unwrap();
		assert_eq!(data, b"ay".to_vec());
	}

	#[tokio::test]
	async fn test_create_dir_nested() {
		let (dir, provider) = fixture();
		provider.create_dir(&RemotePath::new(["x", "y"])).await.unwrap();
		assert!(dir.path().join("x/y").is_dir());
	}

	#[tokio::test]
	async fn test_stat() {
		let (_dir, provider) = fixture();
		let info = provider.stat(&RemotePath::new(["docs", "b.txt"])).await.unwrap();
		assert_eq!(info.size, 3);
		assert!(!info.directory);
		assert!(info.modified > 0);
		assert!(provider.stat(&RemotePath::new(["docs"])).await.unwrap().directory);
	}
}

// vim: ts=4
