//! Remote path validation
//!
//! A remote path arrives as a list of segment names chosen by the peer. Each
//! segment must name exactly one directory level, otherwise a peer could
//! climb out of the exported root or address a different node than the one
//! the path spells.

use std::path::{Component, Path, PathBuf};

use super::ValidationError;
use crate::protocol::types::RemotePath;

/// Check whether one segment names exactly one normal path component
///
/// Rejects empty names, `.` and `..`, anything containing a separator or a
/// NUL byte, and anything the platform would treat as a prefix or root.
pub fn is_segment_safe(segment: &str) -> bool {
	if segment.is_empty() || segment.contains(|c: char| c == '/' || c == '\\' || c == '\0') {
		return false;
	}
	let mut components = Path::new(segment).components();
	matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Validate every segment of a remote path
pub fn validate_remote_path(path: &RemotePath) -> Result<(), ValidationError> {
	for segment in path.segments() {
		if !is_segment_safe(segment) {
			return Err(ValidationError::PathError(format!(
				"Unsafe path segment {:?} in {}",
				segment, path
			)));
		}
	}
	Ok(())
}

/// Map a remote path onto the local filesystem below `root`
pub fn resolve_under_root(root: &Path, path: &RemotePath) -> Result<PathBuf, ValidationError> {
	validate_remote_path(path)?;
	let mut local = root.to_path_buf();
	for segment in path.segments() {
		local.push(segment);
	}
	validate_path_within_root(&local, root)?;
	Ok(local)
}

/// Check if path is within a root directory
pub fn is_path_within_root(path: &Path, root: &Path) -> bool {
	path.starts_with(root)
}

/// Validate that path is within root directory
pub fn validate_path_within_root(path: &Path, root: &Path) -> Result<(), ValidationError> {
	if !is_path_within_root(path, root) {
		return Err(ValidationError::PathError(format!(
			"Path {:?} is outside root directory {:?}",
			path, root
		)));
	}
	Ok(())
}


// vim: ts=4
