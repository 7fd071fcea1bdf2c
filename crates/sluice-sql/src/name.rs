//! Qualified object names.

use serde::{Serialize, Serializer};
use std::fmt;

/// A `[catalog.][schema.]object` reference with one to three parts.
///
/// Parts are lower-cased when read from a statement, matching how the engine
/// resolves identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName {
    parts: Vec<String>,
}

impl QualifiedName {
    /// Maximum number of parts a name may carry.
    pub const MAX_PARTS: usize = 3;

    /// Build a name from its parts.
    ///
    /// Returns `None` for an empty list. Names longer than three parts keep
    /// only the trailing three.
    pub fn new<I, S>(parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() {
            return None;
        }
        if parts.len() > Self::MAX_PARTS {
            parts.drain(..parts.len() - Self::MAX_PARTS);
        }
        Some(Self { parts })
    }

    /// Build a fully qualified three-part name.
    pub fn of(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            parts: vec![catalog.into(), schema.into(), object.into()],
        }
    }

    /// The name's parts, outermost first.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Number of parts (1 to 3).
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Always false; a name has at least one part.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

impl Serialize for QualifiedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
