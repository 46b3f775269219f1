//! Recursive directory size calculation on the local filesystem.

use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};
use tracing::instrument;

enum WalkEntry {
    File(u64),
    Descend(PathBuf),
    Skip,
}

fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
    match e.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(e),
    }
}

/// Classify a directory entry without following symbolic links.
async fn process_entry(entry: DirEntry) -> Result<WalkEntry> {
    let path = entry.path();
    let file_type = entry.file_type().await.map_err(|e| map_io_error(e, &path))?;
    if file_type.is_symlink() {
        return Ok(WalkEntry::Skip);
    }
    if file_type.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if file_type.is_file() {
        // On Unix `DirEntry::metadata` does not traverse symlinks, and we've
        // already skipped those anyway.
        let metadata = entry.metadata().await.map_err(|e| map_io_error(e, &path))?;
        return Ok(WalkEntry::File(metadata.len()));
    }
    // Sockets, FIFOs, device nodes.
    Ok(WalkEntry::Skip)
}

/// Sum the sizes of all regular files below `root`, in bytes.
///
/// - Symbolic links below `root` are never counted and never followed,
///   whether they point at files or directories.
/// - Directories themselves contribute nothing.
/// - If `root` is a regular file, its own size is returned.
///
/// Unlike a storage listing, a missing root is an error rather than an empty
/// result: a tier directory that has vanished is a deployment problem the
/// caller needs to hear about.
#[instrument(skip_all, fields(root = %root.as_ref().display()))]
pub async fn directory_size(root: impl AsRef<Path>) -> Result<u64> {
    let root = root.as_ref();
    // The root itself may be a link to the real tier directory.
    let metadata = fs::metadata(root).await.map_err(|e| map_io_error(e, root))?;
    if metadata.is_file() {
        return Ok(metadata.len());
    }
    if !metadata.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(root.to_path_buf()));
    }

    let mut total: u64 = 0;
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut entries = fs::read_dir(&current).await.map_err(|e| map_io_error(e, &current))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| map_io_error(e, &current))? {
            match process_entry(entry).await? {
                WalkEntry::File(size) => total = total.saturating_add(size),
                WalkEntry::Descend(dir) => stack.push(dir),
                WalkEntry::Skip => {},
            }
        }
    }
    tracing::debug!(bytes = total, "calculated directory size");
    Ok(total)
}
