//! Object builder: derived attributes and policy
//!
//! The index calls its builder for every object it stores or updates
//! ([`Builder::build`]) and notifies it after objects change
//! ([`Builder::changed`]).

use crate::attrs::{AttributeType, Attributes};
use crate::error::IndexError;
use crate::index::ObjectHandle;

/// Build and change callbacks used by an object index.
pub trait Builder: Send {
    /// Produce the attributes to store.
    ///
    /// `existing` is the stored object when `merge` updates one in place, or
    /// `None` when a new object is being added.
    fn build(
        &mut self,
        existing: Option<&Attributes>,
        merge: Attributes,
    ) -> Result<Attributes, IndexError>;

    /// An object was added, updated (`Some`) or removed (`None`).
    fn changed(&mut self, handle: ObjectHandle, attrs: Option<&Attributes>);
}

/// Scope of the objects a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderFlags {
    /// Session objects
    None,
    /// Token objects, persisted by a trust token
    Token,
}

/// Default builder for trust tokens.
#[derive(Debug)]
pub struct TrustBuilder {
    flags: BuilderFlags,
    changes: u64,
}

impl TrustBuilder {
    pub fn new(flags: BuilderFlags) -> Self {
        Self { flags, changes: 0 }
    }

    pub fn flags(&self) -> BuilderFlags {
        self.flags
    }

    /// Number of change notifications received so far.
    pub fn changes(&self) -> u64 {
        self.changes
    }
}

impl Builder for TrustBuilder {
    fn build(
        &mut self,
        existing: Option<&Attributes>,
        merge: Attributes,
    ) -> Result<Attributes, IndexError> {
        let mut attrs = match existing {
            Some(existing) => existing.clone(),
            None => Attributes::new()
                .with(AttributeType::Token, self.flags == BuilderFlags::Token)
                .with(AttributeType::Private, false),
        };
        attrs.merge(merge);

        if attrs.class().is_none() {
            return Err(IndexError::TemplateIncomplete {
                missing: AttributeType::Class,
            });
        }

        let trusted = attrs.bool(AttributeType::Trusted).unwrap_or(false);
        let distrusted = attrs.bool(AttributeType::Distrusted).unwrap_or(false);
        if trusted && distrusted {
            return Err(IndexError::TemplateInconsistent {
                reason: "object is both trusted and distrusted".to_string(),
            });
        }

        Ok(attrs)
    }

    fn changed(&mut self, handle: ObjectHandle, attrs: Option<&Attributes>) {
        self.changes += 1;
        match attrs {
            Some(attrs) => tracing::trace!(%handle, class = ?attrs.class(), "object changed"),
            None => tracing::trace!(%handle, "object removed"),
        }
    }
}
