//! Atomic publication of output files
//!
//! Outputs are written to a temporary file in the destination directory and
//! renamed over the target only once complete, so readers never observe a
//! half-written report.

use crate::result::{FuzzcovError, FuzzcovResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically replace `path` with `bytes`, creating parent directories
pub fn publish_bytes(path: &Path, bytes: &[u8]) -> FuzzcovResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| FuzzcovError::Io(e.error))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "published");
    Ok(())
}

/// Validate `content` and only then publish it.
///
/// On validation failure the destination is left untouched.
pub fn publish_validated<F>(path: &Path, content: &str, validate: F) -> FuzzcovResult<()>
where
    F: FnOnce(&str) -> FuzzcovResult<()>,
{
    validate(content)?;
    publish_bytes(path, content.as_bytes())
}

/// Replace the directory `dir` with one holding exactly `files`.
///
/// The new contents are staged in a sibling directory and renamed into
/// place, so nothing from an earlier publication survives. With no files the
/// directory is removed.
pub fn publish_dir(dir: &Path, files: &[(String, Vec<u8>)]) -> FuzzcovResult<Vec<PathBuf>> {
    if files.is_empty() {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
            tracing::debug!(path = %dir.display(), "removed stale output directory");
        }
        return Ok(Vec::new());
    }

    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(parent)?;
    for (name, bytes) in files {
        fs::write(staging.path().join(name), bytes)?;
    }
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::rename(staging.path(), dir)?;
    tracing::debug!(path = %dir.display(), files = files.len(), "published directory");

    Ok(files.iter().map(|(name, _)| dir.join(name)).collect())
}
