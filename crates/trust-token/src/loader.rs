//! Loader: mirrors trust files into the object index
//!
//! Every file-derived object is tagged with its file path as `Origin`, and
//! every index mutation replaces objects by that origin. Reloading a file
//! therefore swaps exactly its own objects, and retracting a file drops them.
//!
//! The stat cache decides what needs work:
//! - a file is parsed again only when its `(mode, mtime, size)` changed;
//! - a directory is listed again only when its own stat changed; otherwise
//!   only the children already in the cache are re-checked.
//!
//! `anchors/` and `blacklist/` belong to their own passes. A root scan skips
//! them, so their files are never retracted and reloaded just because the
//! root directory changed.
//!
//! Callers must serialize all loads on one token; the walk assumes nobody else
//! mutates the cache or index while it runs.

use std::collections::BTreeSet;
use std::fs;

use trust_fs::{FileStat, NormalizedPath};

use crate::Result;
use crate::attrs::AttributeType;
use crate::cache::StatCache;
use crate::error::Error;
use crate::index::ObjectIndex;
use crate::object::{Classification, TrustObject, origin_template};
use crate::parser::{ParseOutcome, Parser};

/// The three paths a token loads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPaths {
    /// Token root, a directory tree or a single file
    pub root: NormalizedPath,
    /// `root/anchors`: everything below is loaded as anchors
    pub anchors: NormalizedPath,
    /// `root/blacklist`: everything below is loaded as distrusted
    pub blacklist: NormalizedPath,
}

impl TokenPaths {
    pub fn new(root: NormalizedPath) -> Self {
        Self {
            anchors: root.join("anchors"),
            blacklist: root.join("blacklist"),
            root,
        }
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLoad {
    /// Stat unchanged since the last load; nothing was done
    Unchanged,
    /// Parsed and committed to the index
    Loaded,
    /// Unparseable, gone, or not a regular file; its objects were retracted
    Skipped,
    /// The index refused the objects; left unrecorded so it is retried
    Failed,
}

impl FileLoad {
    /// Contribution to a load count.
    pub fn count(self) -> usize {
        match self {
            Self::Loaded => 1,
            Self::Unchanged | Self::Skipped | Self::Failed => 0,
        }
    }
}

/// Running totals of one directory pass.
#[derive(Debug, Default)]
struct Scan {
    loaded: usize,
    unsettled: bool,
}

impl Scan {
    fn add(&mut self, load: FileLoad) {
        self.loaded += load.count();
        self.unsettled |= load == FileLoad::Failed;
    }
}

/// Collaborators a load pass works against.
pub struct LoadContext<'a> {
    pub parser: &'a mut dyn Parser,
    pub index: &'a mut dyn ObjectIndex,
}

/// Loader state: the token paths and the stat cache.
#[derive(Debug)]
pub struct Loader {
    paths: TokenPaths,
    cache: StatCache,
}

impl Loader {
    pub fn new(paths: TokenPaths) -> Self {
        Self {
            paths,
            cache: StatCache::new(),
        }
    }

    pub fn paths(&self) -> &TokenPaths {
        &self.paths
    }

    pub fn cache(&self) -> &StatCache {
        &self.cache
    }

    /// Classification for the file at `path`.
    ///
    /// A token whose root is a single file treats that file as anchors.
    pub fn classify(&self, path: &NormalizedPath, stat: &FileStat) -> Classification {
        if path.is_within(&self.paths.anchors) {
            Classification::Anchor
        } else if path.is_within(&self.paths.blacklist) {
            Classification::Blacklist
        } else if *path == self.paths.root && !stat.is_dir() {
            Classification::Anchor
        } else {
            Classification::Plain
        }
    }

    /// Load one file unless its stat is unchanged.
    ///
    /// A file the parser rejects is retracted as if it had been deleted.
    pub fn load_file(
        &mut self,
        cx: &mut LoadContext<'_>,
        path: &NormalizedPath,
        stat: &FileStat,
    ) -> Result<FileLoad> {
        if !self.cache.is_reload_necessary(path, stat) {
            tracing::trace!(path = %path, "unchanged");
            return Ok(FileLoad::Unchanged);
        }

        let classification = self.classify(path, stat);
        let parsed = match cx.parser.parse_file(path, classification) {
            ParseOutcome::Parsed(parsed) => parsed,
            ParseOutcome::Unrecognized => {
                tracing::debug!(path = %path, "skipped: unrecognized format");
                self.retract(cx, path)?;
                return Ok(FileLoad::Skipped);
            }
            ParseOutcome::Failed(reason) => {
                tracing::warn!(path = %path, "failed to parse: {}", reason);
                self.retract(cx, path)?;
                return Ok(FileLoad::Skipped);
            }
        };

        let objects: Vec<_> = parsed
            .into_iter()
            .map(|fields| TrustObject::new(path.clone(), fields).into_attributes())
            .collect();
        let count = objects.len();

        cx.index.batch();
        let result = cx
            .index
            .replace_all(&origin_template(path), Some(AttributeType::Class), objects);
        cx.index.finish();

        if let Err(e) = result {
            tracing::warn!(path = %path, "couldn't load file into objects: {}", e);
            return Ok(FileLoad::Failed);
        }

        tracing::debug!(path = %path, ?classification, objects = count, "loaded");
        self.cache.record_loaded(path, stat);
        Ok(FileLoad::Loaded)
    }

    /// Load `path` if it is still a regular file, otherwise retract it.
    ///
    /// Directories are never loaded as files; their contents are walked by
    /// [`Loader::load_path`].
    pub fn load_if_file(
        &mut self,
        cx: &mut LoadContext<'_>,
        path: &NormalizedPath,
    ) -> Result<FileLoad> {
        match trust_fs::stat(path) {
            Ok(stat) if !stat.is_dir() => return self.load_file(cx, path, &stat),
            Ok(_) => {}
            Err(e) if e.is_not_found() => tracing::debug!(path = %path, "gone"),
            Err(e) => tracing::warn!(path = %path, "couldn't stat path: {}", e),
        }

        self.retract(cx, path)?;
        Ok(FileLoad::Skipped)
    }

    /// List `dir`, load every entry, and retract whatever in `present` was not
    /// seen in the listing.
    pub fn load_directory(
        &mut self,
        cx: &mut LoadContext<'_>,
        dir: &NormalizedPath,
        present: BTreeSet<NormalizedPath>,
    ) -> Result<usize> {
        Ok(self.scan_directory(cx, dir, present)?.loaded)
    }

    fn scan_directory(
        &mut self,
        cx: &mut LoadContext<'_>,
        dir: &NormalizedPath,
        mut present: BTreeSet<NormalizedPath>,
    ) -> Result<Scan> {
        present.retain(|path| !self.is_owned_below(dir, path));

        let mut scan = Scan::default();
        let entries = match fs::read_dir(dir.to_native()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir, "couldn't list directory: {}", e);
                scan.unsettled = true;
                return Ok(scan);
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(path = %dir, "couldn't read directory entry: {}", e);
                    continue;
                }
            };
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(path = %dir, name = ?raw, "skipping entry with non-UTF-8 name");
                    continue;
                }
            };
            let path = dir.join(&name);
            present.remove(&path);
            if self.is_owned_below(dir, &path) {
                continue;
            }
            scan.add(self.load_if_file(cx, &path)?);
        }

        for gone in present {
            tracing::debug!(path = %gone, "no longer present");
            self.retract(cx, &gone)?;
        }

        Ok(scan)
    }

    /// Load a token path: a directory is scanned, a file is loaded.
    pub fn load_path(&mut self, cx: &mut LoadContext<'_>, path: &NormalizedPath) -> Result<usize> {
        let stat = match trust_fs::stat(path) {
            Ok(stat) => stat,
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(path = %path, "cannot access trust certificate path: {}", e);
                }
                // Whatever was loaded from below a vanished directory is gone too
                for gone in self.cache.present_under(path) {
                    self.retract(cx, &gone)?;
                }
                self.retract(cx, path)?;
                return Ok(0);
            }
        };

        if !stat.is_dir() {
            return Ok(self.load_file(cx, path, &stat)?.count());
        }

        let mut present = self.cache.present_under(path);
        present.retain(|child| !self.is_owned_below(path, child));
        let scan = if self.cache.is_reload_necessary(path, &stat) {
            tracing::debug!(path = %path, "directory changed, listing");
            self.scan_directory(cx, path, present)?
        } else {
            let mut scan = Scan::default();
            for child in &present {
                scan.add(self.load_if_file(cx, child)?);
            }
            scan
        };

        // A directory with unsettled entries is listed again on the next pass
        if scan.unsettled {
            tracing::debug!(path = %path, "directory not fully loaded");
            self.cache.record_unloaded(path);
        } else {
            self.cache.record_loaded(path, &stat);
        }
        Ok(scan.loaded)
    }

    /// Whether `path` is the anchors or blacklist directory (or lies within
    /// one) while that directory sits below `dir`.
    ///
    /// Those subtrees are loaded by their own pass, so a scan of `dir` neither
    /// loads nor retracts them.
    fn is_owned_below(&self, dir: &NormalizedPath, path: &NormalizedPath) -> bool {
        [&self.paths.anchors, &self.paths.blacklist]
            .into_iter()
            .filter(|subtree| subtree.is_within(dir))
            .any(|subtree| path == subtree || path.is_within(subtree))
    }

    /// Drop every object loaded from `path` and forget its stat.
    pub fn retract(&mut self, cx: &mut LoadContext<'_>, path: &NormalizedPath) -> Result<()> {
        cx.index.batch();
        let result = cx.index.replace_all(&origin_template(path), None, Vec::new());
        cx.index.finish();

        result.map_err(|source| Error::Retract {
            origin: path.clone(),
            source,
        })?;
        self.cache.record_unloaded(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn file_stat() -> FileStat {
        FileStat {
            mode: 0o100_644,
            modified: Some(SystemTime::UNIX_EPOCH),
            size: 1,
        }
    }

    fn dir_stat() -> FileStat {
        FileStat {
            mode: 0o040_755,
            modified: Some(SystemTime::UNIX_EPOCH),
            size: 4096,
        }
    }

    #[test]
    fn token_paths_derive_from_root() {
        let paths = TokenPaths::new(NormalizedPath::new("/etc/trust/"));
        assert_eq!(paths.root.as_str(), "/etc/trust");
        assert_eq!(paths.anchors.as_str(), "/etc/trust/anchors");
        assert_eq!(paths.blacklist.as_str(), "/etc/trust/blacklist");
    }

    #[test]
    fn classification_follows_path_prefix() {
        let loader = Loader::new(TokenPaths::new(NormalizedPath::new("/etc/trust")));
        let classify = |path: &str| loader.classify(&NormalizedPath::new(path), &file_stat());

        assert_eq!(classify("/etc/trust/anchors/ca.pem"), Classification::Anchor);
        assert_eq!(classify("/etc/trust/anchors/nested/ca.pem"), Classification::Anchor);
        assert_eq!(classify("/etc/trust/blacklist/bad.pem"), Classification::Blacklist);
        assert_eq!(classify("/etc/trust/ca.pem"), Classification::Plain);
        assert_eq!(classify("/etc/trust/anchors-extra/ca.pem"), Classification::Plain);
    }

    #[test]
    fn bare_file_root_is_anchor_but_directory_root_is_not() {
        let loader = Loader::new(TokenPaths::new(NormalizedPath::new("/etc/ca-bundle.pem")));
        let root = NormalizedPath::new("/etc/ca-bundle.pem");

        assert_eq!(loader.classify(&root, &file_stat()), Classification::Anchor);
        assert_eq!(loader.classify(&root, &dir_stat()), Classification::Plain);
    }

    #[test]
    fn subtrees_are_owned_only_below_their_parent() {
        let loader = Loader::new(TokenPaths::new(NormalizedPath::new("/etc/trust")));
        let root = NormalizedPath::new("/etc/trust");
        let anchors = NormalizedPath::new("/etc/trust/anchors");
        let owned = |dir: &NormalizedPath, path: &str| {
            loader.is_owned_below(dir, &NormalizedPath::new(path))
        };

        assert!(owned(&root, "/etc/trust/anchors"));
        assert!(owned(&root, "/etc/trust/anchors/ca.pem"));
        assert!(owned(&root, "/etc/trust/blacklist/bad.pem"));
        assert!(!owned(&root, "/etc/trust/ca.pem"));
        assert!(!owned(&root, "/etc/trust/anchors-old"));
        assert!(!owned(&anchors, "/etc/trust/anchors/ca.pem"));
    }

    #[test]
    fn only_loaded_files_count() {
        assert_eq!(FileLoad::Loaded.count(), 1);
        assert_eq!(FileLoad::Unchanged.count(), 0);
        assert_eq!(FileLoad::Skipped.count(), 0);
        assert_eq!(FileLoad::Failed.count(), 0);
    }

    #[test]
    fn failed_file_leaves_scan_unsettled() {
        let mut scan = Scan::default();
        scan.add(FileLoad::Loaded);
        scan.add(FileLoad::Skipped);
        assert!(!scan.unsettled);

        scan.add(FileLoad::Failed);
        assert_eq!(scan.loaded, 1);
        assert!(scan.unsettled);
    }
}
