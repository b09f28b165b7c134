//! Normalized path handling for trust directories
//!
//! Paths double as the origin of every file-derived trust object, so two
//! spellings of the same location must compare equal. Normalization is purely
//! lexical: it never touches the filesystem.

use std::path::{Path, PathBuf};

/// A path normalized to use single forward slashes internally.
///
/// Runs of slashes collapse to one and a trailing slash is dropped (except
/// for the filesystem root itself). On Windows backslashes become forward
/// slashes; elsewhere a backslash is an ordinary file name byte and is kept.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let path_str = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };
        Self {
            inner: clean(&path_str),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner.is_empty() {
            return Self::new(segment);
        }
        Self::new(format!("{}/{}", self.inner, segment))
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        match self.inner.rsplit('/').next() {
            Some("") | None => None,
            Some(name) => Some(name),
        }
    }

    /// Whether this path lies strictly below `dir`.
    ///
    /// `dir` itself is not within `dir`, and `/a/bc` is not within `/a/b`.
    pub fn is_within(&self, dir: &NormalizedPath) -> bool {
        let prefix = dir.as_str();
        match self.inner.strip_prefix(prefix) {
            Some(rest) if prefix.ends_with('/') => !rest.is_empty(),
            Some(rest) => rest.len() > 1 && rest.starts_with('/'),
            None => false,
        }
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }
}

fn clean(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_slash = false;
    for c in raw.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(c);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
