//! Resource tags.

use std::borrow::Cow;
use std::fmt;

/// A label for a group of cached results.
///
/// A tag without an id stands for the whole resource kind ("all offers"); a
/// tag with an id for one item ("offer 7").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    kind: Cow<'static, str>,
    id: Option<String>,
}

impl Tag {
    /// A tag for a whole resource kind.
    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    /// A tag for a single item of a resource kind.
    pub fn with_id(kind: impl Into<Cow<'static, str>>, id: impl fmt::Display) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.to_string()),
        }
    }

    /// Returns the resource kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the item id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether invalidating `self` evicts a result that provides `provided`.
    ///
    /// A kind-only tag matches every tag of that kind. A tag with an id
    /// matches only the same kind and id; results that provide the bare kind
    /// are left alone.
    pub fn invalidates(&self, provided: &Tag) -> bool {
        self.kind == provided.kind && (self.id.is_none() || self.id == provided.id)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => f.write_str(&self.kind),
        }
    }
}
