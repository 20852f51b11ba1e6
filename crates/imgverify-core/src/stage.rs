//! Staging of downloaded bytes on disk so they can be hashed like the original.
//!
//! Either an anonymous temp file (removed on drop) or a caller-chosen path,
//! written via a `.part` sibling and renamed into place once synced.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Suffix of the in-progress file before the atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// `file.png` → `file.png.part`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// True when both paths exist and resolve to the same file.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A downloaded copy on disk.
#[derive(Debug)]
pub enum StagedFile {
    /// Deleted when dropped.
    Temp(NamedTempFile),
    /// Left in place for inspection.
    Kept(PathBuf),
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        match self {
            StagedFile::Temp(f) => f.path(),
            StagedFile::Kept(p) => p,
        }
    }

    pub fn is_kept(&self) -> bool {
        matches!(self, StagedFile::Kept(_))
    }
}

/// Writes `bytes` to `keep_at` if given, else to a fresh temp file.
pub fn stage_bytes(bytes: &[u8], keep_at: Option<&Path>) -> Result<StagedFile> {
    match keep_at {
        Some(path) => {
            write_atomic(path, bytes)?;
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "staged download");
            Ok(StagedFile::Kept(path.to_path_buf()))
        }
        None => {
            let mut f = tempfile::Builder::new()
                .prefix("imgverify-")
                .suffix(".download")
                .tempfile()
                .context("create temp file for download")?;
            f.write_all(bytes)
                .and_then(|_| f.as_file().sync_all())
                .with_context(|| format!("write {}", f.path().display()))?;
            tracing::debug!(path = %f.path().display(), bytes = bytes.len(), "staged download");
            Ok(StagedFile::Temp(f))
        }
    }
}

fn write_atomic(final_path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tp = temp_path(final_path);
    let result = File::create(&tp)
        .and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        })
        .and_then(|_| fs::rename(&tp, final_path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tp);
        return Err(e).with_context(|| format!("write {}", final_path.display()));
    }
    Ok(())
}
