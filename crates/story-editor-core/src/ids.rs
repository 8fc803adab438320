//! Identifiers for pages and elements, and the generators that mint them.
//!
//! Ids are opaque strings. The reducer never generates ids itself; callers
//! draw them from an [`IdGenerator`] before building an action, which keeps
//! every transition deterministic.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use story_editor_config::IdStrategy;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifies a page within a story.
    PageId
);

string_id!(
    /// Identifies an element within its page. Two pages may reuse an id.
    ElementId
);

/// Reads an optional id, treating `""` the same as `null`.
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()).map(T::from))
}

/// Source of fresh page and element ids.
pub trait IdGenerator {
    fn next_page_id(&mut self) -> PageId;
    fn next_element_id(&mut self) -> ElementId;
}

/// Random v4 UUIDs for both pages and elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_page_id(&mut self) -> PageId {
        PageId(uuid::Uuid::new_v4().to_string())
    }

    fn next_element_id(&mut self) -> ElementId {
        ElementId(uuid::Uuid::new_v4().to_string())
    }
}

/// Counts upward: `page-1`, `page-2`, ... and `el-1`, `el-2`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    pages: u64,
    elements: u64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_page_id(&mut self) -> PageId {
        self.pages += 1;
        PageId(format!("page-{}", self.pages))
    }

    fn next_element_id(&mut self) -> ElementId {
        self.elements += 1;
        ElementId(format!("el-{}", self.elements))
    }
}

/// Builds the generator selected by the editor configuration.
pub fn id_generator_for(strategy: IdStrategy) -> Box<dyn IdGenerator> {
    match strategy {
        IdStrategy::Uuid => Box::new(UuidIdGenerator),
        IdStrategy::Sequential => Box::new(SequentialIdGenerator::new()),
    }
}
