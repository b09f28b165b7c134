//! File-derived trust objects and their classification

use crate::attrs::{AttributeType, Attributes, ObjectClass};
use trust_fs::NormalizedPath;

/// Label of the builtin root-list object seeded into every token.
pub const TRUST_ANCHOR_ROOTS_LABEL: &str = "Trust Anchor Roots";

/// How the objects of one file should be treated by the parser.
///
/// Derived from where the file lives; never stored on the objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Classification {
    /// No trust designation
    #[default]
    Plain,
    /// Trusted roots
    Anchor,
    /// Explicitly distrusted
    Blacklist,
}

/// An object produced by the parser, bound to the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustObject {
    origin: NormalizedPath,
    fields: Attributes,
}

impl TrustObject {
    pub fn new(origin: NormalizedPath, fields: Attributes) -> Self {
        Self { origin, fields }
    }

    pub fn origin(&self) -> &NormalizedPath {
        &self.origin
    }

    /// The attribute set to hand to the index.
    ///
    /// `Origin` and `Modifiable = false` always reflect the loader's view,
    /// whatever the parser put there.
    pub fn into_attributes(self) -> Attributes {
        self.fields
            .with(AttributeType::Origin, self.origin.as_str())
            .with(AttributeType::Modifiable, false)
    }
}

/// Template matching every object loaded from `origin`.
pub fn origin_template(origin: &NormalizedPath) -> Attributes {
    Attributes::new().with(AttributeType::Origin, origin.as_str())
}

/// The synthetic "Trust Anchor Roots" container object.
pub fn builtin_root_list() -> Attributes {
    Attributes::new()
        .with(AttributeType::Class, ObjectClass::NssBuiltinRootList)
        .with(AttributeType::Token, true)
        .with(AttributeType::Private, false)
        .with(AttributeType::Modifiable, false)
        .with(AttributeType::Label, TRUST_ANCHOR_ROOTS_LABEL)
}
