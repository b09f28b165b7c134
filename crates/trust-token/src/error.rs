//! Error types for trust-token

use crate::attrs::AttributeType;
use crate::index::ObjectHandle;
use trust_fs::NormalizedPath;

/// Result type for trust-token operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in trust-token operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The index refused to drop the objects of a vanished origin
    #[error("Couldn't retract objects loaded from {origin}: {source}")]
    Retract {
        origin: NormalizedPath,
        #[source]
        source: IndexError,
    },

    /// The builtin root-list object could not be placed in a new token
    #[error("Couldn't seed builtin objects for token {label}: {source}")]
    Seed {
        label: String,
        #[source]
        source: IndexError,
    },

    /// Invalid trust configuration
    #[error("Invalid trust configuration: {message}")]
    Config { message: String },

    /// Filesystem error from trust-fs
    #[error(transparent)]
    Fs(#[from] trust_fs::Error),
}

/// Errors reported by an object index and its builder
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A required attribute is missing from the object template
    #[error("Template incomplete: missing {missing:?}")]
    TemplateIncomplete { missing: AttributeType },

    /// The object template contradicts itself or index policy
    #[error("Template inconsistent: {reason}")]
    TemplateInconsistent { reason: String },

    /// No object is stored under the handle
    #[error("Invalid object handle: {0}")]
    HandleInvalid(ObjectHandle),
}
