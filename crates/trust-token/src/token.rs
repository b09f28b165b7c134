//! Trust token: one slot backed by a trust directory tree
//!
//! A token owns its parser, its object index (and through it, the builder),
//! and the loader state. [`Token::load`] brings the index in line with the
//! filesystem; [`Token::reload_one`] refreshes a single origin.
//!
//! Tokens are not internally synchronized. Callers serialize every call on a
//! token, typically by keeping it behind a mutex.

use std::cell::OnceCell;

use trust_fs::NormalizedPath;

use crate::Result;
use crate::attrs::{AttributeType, Attributes};
use crate::builder::{BuilderFlags, TrustBuilder};
use crate::cache::StatCache;
use crate::error::Error;
use crate::index::{MemoryIndex, ObjectIndex};
use crate::loader::{LoadContext, Loader, TokenPaths};
use crate::object::builtin_root_list;
use crate::parser::{PemParser, Parser};

/// PKCS#11 slot identifier.
pub type SlotId = u64;

pub struct Token {
    // Field order is drop order: the index goes first.
    index: Box<dyn ObjectIndex>,
    parser: Box<dyn Parser>,
    loader: Loader,
    label: String,
    slot: SlotId,
    writable: OnceCell<bool>,
}

impl Token {
    /// Create a token with the default parser, builder and index.
    ///
    /// The index starts out holding the builtin root-list object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Seed`] if the builtin object is rejected.
    pub fn new(
        slot: SlotId,
        path: impl Into<NormalizedPath>,
        label: impl Into<String>,
    ) -> Result<Self> {
        Self::with_parser(slot, path, label, Box::new(PemParser::new()))
    }

    /// Create a token with a custom parser and the default builder and index.
    pub fn with_parser(
        slot: SlotId,
        path: impl Into<NormalizedPath>,
        label: impl Into<String>,
        parser: Box<dyn Parser>,
    ) -> Result<Self> {
        let index = MemoryIndex::new(Box::new(TrustBuilder::new(BuilderFlags::Token)));
        Self::with_collaborators(slot, path, label, parser, Box::new(index))
    }

    /// Create a token around caller-supplied collaborators.
    pub fn with_collaborators(
        slot: SlotId,
        path: impl Into<NormalizedPath>,
        label: impl Into<String>,
        parser: Box<dyn Parser>,
        index: Box<dyn ObjectIndex>,
    ) -> Result<Self> {
        let mut token = Self {
            index,
            parser,
            loader: Loader::new(TokenPaths::new(path.into())),
            label: label.into(),
            slot,
            writable: OnceCell::new(),
        };
        token.load_builtin_objects()?;

        tracing::debug!(label = %token.label, path = %token.path(), "token created");
        Ok(token)
    }

    fn load_builtin_objects(&mut self) -> Result<()> {
        self.index.batch();
        let result = self.index.take(builtin_root_list());
        self.index.finish();

        result.map(|_| ()).map_err(|source| Error::Seed {
            label: self.label.clone(),
            source,
        })
    }

    /// Bring the index in line with the token's root, anchors and blacklist
    /// paths, in that order.
    ///
    /// Returns how many files were (re)loaded. Unreadable files and
    /// directories are logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Retract`] if the index refuses to drop the objects of
    /// a vanished origin; the scan stops there.
    pub fn load(&mut self) -> Result<usize> {
        let paths = self.loader.paths().clone();
        let mut cx = LoadContext {
            parser: self.parser.as_mut(),
            index: self.index.as_mut(),
        };

        let mut total = 0;
        for path in [&paths.root, &paths.anchors, &paths.blacklist] {
            total += self.loader.load_path(&mut cx, path)?;
        }

        tracing::debug!(label = %self.label, loaded = total, "token load finished");
        Ok(total)
    }

    /// Re-check the single file named by the `Origin` attribute of `attrs`.
    ///
    /// Returns 1 if the file was reloaded. Objects without an origin are
    /// ignored; a vanished origin is retracted.
    ///
    /// Any other stat failure (permission denied, for one) is only logged:
    /// the origin's objects stay in the index until a [`Token::load`] pass,
    /// which does retract unreadable files.
    pub fn reload_one(&mut self, attrs: &Attributes) -> Result<usize> {
        let Some(origin) = attrs.text(AttributeType::Origin) else {
            return Ok(0);
        };
        let origin = NormalizedPath::new(origin);
        let mut cx = LoadContext {
            parser: self.parser.as_mut(),
            index: self.index.as_mut(),
        };

        match trust_fs::stat(&origin) {
            Ok(stat) => Ok(self.loader.load_file(&mut cx, &origin, &stat)?.count()),
            Err(e) if e.is_not_found() => {
                self.loader.retract(&mut cx, &origin)?;
                Ok(0)
            }
            Err(e) => {
                tracing::warn!(path = %origin, "cannot access trust file: {}", e);
                Ok(0)
            }
        }
    }

    /// Whether a later write to this token is expected to succeed.
    ///
    /// Computed once per token and remembered; permissions may change
    /// afterwards, so this is a prediction rather than a promise.
    pub fn is_writable(&self) -> bool {
        *self
            .writable
            .get_or_init(|| trust_fs::is_writable_directory(self.path()))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.loader.paths().root
    }

    pub fn anchors_path(&self) -> &NormalizedPath {
        &self.loader.paths().anchors
    }

    pub fn blacklist_path(&self) -> &NormalizedPath {
        &self.loader.paths().blacklist
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn index(&self) -> &dyn ObjectIndex {
        self.index.as_ref()
    }

    pub fn index_mut(&mut self) -> &mut dyn ObjectIndex {
        self.index.as_mut()
    }

    pub fn stat_cache(&self) -> &StatCache {
        self.loader.cache()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("slot", &self.slot)
            .field("label", &self.label)
            .field("path", self.path())
            .field("objects", &self.index.len())
            .finish()
    }
}
