//! Attribute sets describing trust objects
//!
//! Every object held by an index is an [`Attributes`] bag: an ordered map from
//! [`AttributeType`] to a typed [`AttributeValue`]. There is no fixed schema;
//! parsers, builders and the loader each add the attributes they own.

use std::collections::BTreeMap;

/// PKCS#11 object classes the trust module deals with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectClass {
    Data,
    Certificate,
    PublicKey,
    /// Stapled certificate extension (p11-kit vendor class)
    CertificateExtension,
    /// NSS trust object
    NssTrust,
    /// NSS builtin root list marker
    NssBuiltinRootList,
    /// Any other class, by raw value
    Other(u64),
}

/// Attribute identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeType {
    Class,
    Token,
    Private,
    Label,
    Value,
    Modifiable,
    Id,
    Subject,
    Issuer,
    SerialNumber,
    CertificateCategory,
    Trusted,
    /// Explicitly distrusted (p11-kit vendor attribute)
    Distrusted,
    /// File path the object was loaded from (p11-kit vendor attribute)
    Origin,
    /// Any other attribute, by raw value
    Other(u64),
}

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Bool(bool),
    Ulong(u64),
    Class(ObjectClass),
    Text(String),
    Bytes(Vec<u8>),
}

impl AttributeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<ObjectClass> {
        match self {
            Self::Class(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        Self::Ulong(value)
    }
}

impl From<ObjectClass> for AttributeValue {
    fn from(value: ObjectClass) -> Self {
        Self::Class(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// An ordered set of attributes, at most one value per type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: BTreeMap<AttributeType, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, kind: AttributeType, value: impl Into<AttributeValue>) -> Self {
        self.set(kind, value);
        self
    }

    /// Insert or overwrite an attribute.
    pub fn set(&mut self, kind: AttributeType, value: impl Into<AttributeValue>) {
        self.entries.insert(kind, value.into());
    }

    pub fn get(&self, kind: AttributeType) -> Option<&AttributeValue> {
        self.entries.get(&kind)
    }

    pub fn remove(&mut self, kind: AttributeType) -> Option<AttributeValue> {
        self.entries.remove(&kind)
    }

    pub fn contains(&self, kind: AttributeType) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn bool(&self, kind: AttributeType) -> Option<bool> {
        self.get(kind).and_then(AttributeValue::as_bool)
    }

    pub fn text(&self, kind: AttributeType) -> Option<&str> {
        self.get(kind).and_then(AttributeValue::as_text)
    }

    pub fn class(&self) -> Option<ObjectClass> {
        self.get(AttributeType::Class)
            .and_then(AttributeValue::as_class)
    }

    /// Whether every attribute of `template` is present here with an equal value.
    ///
    /// An empty template matches everything.
    pub fn matches(&self, template: &Attributes) -> bool {
        template
            .iter()
            .all(|(kind, value)| self.get(kind) == Some(value))
    }

    /// Overlay `other` onto this set; values in `other` win.
    pub fn merge(&mut self, other: Attributes) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeType, &AttributeValue)> {
        self.entries.iter().map(|(kind, value)| (*kind, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(AttributeType, AttributeValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (AttributeType, AttributeValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
