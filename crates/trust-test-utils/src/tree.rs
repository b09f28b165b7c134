//! [`TestTree`]: a temporary trust directory for load scenarios.
//!
//! Filesystem timestamps can be coarse, so a rewrite within the same tick may
//! leave the mtime unchanged. Tests that need a change to be seen call
//! [`TestTree::bump_mtime`] instead of relying on the clock.

use std::fs::{self, File};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use trust_fs::NormalizedPath;

/// A temporary directory with helpers for writing and changing trust files.
///
/// # Example
///
/// ```rust,no_run
/// use trust_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.write("anchors/root.pem", "object:root\n");
/// tree.remove("anchors/root.pem");
/// ```
pub struct TestTree {
    _temp_dir: TempDir,
    root: NormalizedPath,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        // Resolve symlinked temp roots so origins match what the loader sees
        let root = dunce::canonicalize(temp_dir.path()).unwrap();
        Self {
            _temp_dir: temp_dir,
            root: NormalizedPath::new(root),
        }
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Absolute path of `rel` below the root.
    pub fn path(&self, rel: &str) -> NormalizedPath {
        self.root.join(rel)
    }

    fn native(&self, rel: &str) -> PathBuf {
        self.path(rel).to_native()
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> NormalizedPath {
        let path = self.native(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        self.path(rel)
    }

    /// Create directory `rel` and its parents.
    pub fn mkdir(&self, rel: &str) -> NormalizedPath {
        fs::create_dir_all(self.native(rel)).unwrap();
        self.path(rel)
    }

    /// Remove the file or directory tree at `rel`.
    pub fn remove(&self, rel: &str) {
        let path = self.native(rel);
        if path.is_dir() {
            fs::remove_dir_all(&path).unwrap();
        } else {
            fs::remove_file(&path).unwrap();
        }
    }

    /// Move the mtime of `rel` (file or directory) forward by one minute.
    pub fn bump_mtime(&self, rel: &str) {
        let path = self.native(rel);
        let current = fs::metadata(&path).unwrap().modified().unwrap();
        let later = current.max(SystemTime::now()) + Duration::from_secs(60);
        File::open(&path).unwrap().set_modified(later).unwrap();
    }

    /// Set the mtime of `rel` to exactly `time`.
    pub fn set_mtime(&self, rel: &str, time: SystemTime) {
        File::open(self.native(rel))
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    /// Set the permission bits of `rel`.
    #[cfg(unix)]
    pub fn set_mode(&self, rel: &str, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(self.native(rel), fs::Permissions::from_mode(mode)).unwrap();
    }
}
