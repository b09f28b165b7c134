//! Stat cache: what the token last loaded, and when
//!
//! An entry exists for a path exactly while objects loaded from it may be in
//! the index, or while it is a directory that has been scanned. Diffing the
//! cached paths under a directory against a fresh listing is how vanished
//! files are found.

use std::collections::{BTreeSet, HashMap};

use trust_fs::{FileStat, NormalizedPath};

#[derive(Debug, Default)]
pub struct StatCache {
    loaded: HashMap<NormalizedPath, FileStat>,
}

impl StatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `path` was never recorded, or any of mode, mtime or size
    /// differs from what was recorded.
    pub fn is_reload_necessary(&self, path: &NormalizedPath, current: &FileStat) -> bool {
        match self.loaded.get(path) {
            None => true,
            Some(last) => {
                last.mode != current.mode
                    || last.modified != current.modified
                    || last.size != current.size
            }
        }
    }

    pub fn record_loaded(&mut self, path: &NormalizedPath, stat: &FileStat) {
        self.loaded.insert(path.clone(), *stat);
    }

    pub fn record_unloaded(&mut self, path: &NormalizedPath) {
        self.loaded.remove(path);
    }

    /// Every recorded path strictly below `dir`, at any depth.
    pub fn present_under(&self, dir: &NormalizedPath) -> BTreeSet<NormalizedPath> {
        self.loaded
            .keys()
            .filter(|path| path.is_within(dir))
            .cloned()
            .collect()
    }

    pub fn get(&self, path: &NormalizedPath) -> Option<&FileStat> {
        self.loaded.get(path)
    }

    pub fn contains(&self, path: &NormalizedPath) -> bool {
        self.loaded.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}
