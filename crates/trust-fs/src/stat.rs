//! Captured filesystem metadata used for staleness checks
//!
//! A [`FileStat`] is the `(mode, mtime, size)` triple observed when a path was
//! last loaded. Two captures are equal exactly when all three fields are
//! equal; file contents are never hashed.

use std::fs::Metadata;
use std::time::SystemTime;

use crate::{Error, NormalizedPath, Result};

const TYPE_MASK: u32 = 0o170_000;
const TYPE_DIR: u32 = 0o040_000;

/// Metadata triple captured by `stat(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// File type and permission bits
    pub mode: u32,
    /// Last modification time, if the platform reports one
    pub modified: Option<SystemTime>,
    /// Size in bytes
    pub size: u64,
}

impl FileStat {
    /// Capture the triple from already-fetched metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            mode: mode_bits(metadata),
            modified: metadata.modified().ok(),
            size: metadata.len(),
        }
    }

    /// Whether the captured mode describes a directory.
    pub fn is_dir(&self) -> bool {
        self.mode & TYPE_MASK == TYPE_DIR
    }
}

/// Stat `path`, following symlinks.
///
/// # Errors
///
/// Returns [`Error::Io`] carrying the path; use [`Error::is_not_found`] to
/// tell a vanished path from other failures.
pub fn stat(path: &NormalizedPath) -> Result<FileStat> {
    let native = path.to_native();
    std::fs::metadata(&native)
        .map(|metadata| FileStat::from_metadata(&metadata))
        .map_err(|e| Error::io(native, e))
}

#[cfg(unix)]
fn mode_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn mode_bits(metadata: &Metadata) -> u32 {
    let kind = if metadata.is_dir() { TYPE_DIR } else { 0o100_000 };
    let perms = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    kind | perms
}
