//! File operation utilities
//!
//! Both downloaders write into a `.partial` sibling of the target and only
//! rename it into place once the transfer has completed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::downloader::core::{DownloadError, FileOperation, Result};

pub const PARTIAL_SUFFIX: &str = ".partial";

/// Path of the temporary file a transfer to `target` is written to
///
/// `.partial` is appended to the final component, so `data/model.bin` is
/// staged as `data/model.bin.partial`.
pub fn partial_path(target: &Path) -> Result<PathBuf> {
    let file_name = target.file_name().ok_or_else(|| DownloadError::InvalidTarget {
        path: target.to_path_buf(),
    })?;

    let mut partial_name = OsString::from(file_name);
    partial_name.push(PARTIAL_SUFFIX);
    Ok(target.with_file_name(partial_name))
}

/// Move a fully written temporary file over its final destination
///
/// An existing file at `dest_path` is replaced.
pub async fn atomic_rename(temp_path: &Path, dest_path: &Path) -> Result<()> {
    tokio::fs::rename(temp_path, dest_path)
        .await
        .map_err(|e| rename_error(dest_path, e))?;
    debug!("Atomically renamed {} to {}", temp_path.display(), dest_path.display());
    Ok(())
}

/// Blocking counterpart of [`atomic_rename`]
pub fn atomic_rename_blocking(temp_path: &Path, dest_path: &Path) -> Result<()> {
    std::fs::rename(temp_path, dest_path).map_err(|e| rename_error(dest_path, e))?;
    debug!("Atomically renamed {} to {}", temp_path.display(), dest_path.display());
    Ok(())
}

fn rename_error(dest_path: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::FileSystem {
        path: dest_path.to_path_buf(),
        operation: FileOperation::Move,
        source,
    }
}

pub(crate) fn fs_error(
    path: &Path,
    operation: FileOperation,
) -> impl FnOnce(std::io::Error) -> DownloadError + '_ {
    move |source| DownloadError::FileSystem {
        path: path.to_path_buf(),
        operation,
        source,
    }
}
