//! Tag catalog used as the completion source.

/// Tag fragments offered when no catalog is configured
pub const DEFAULT_TAGS: &[&str] = &[
    "<?xml version='1.0' encoding='UTF-8'?>",
    "<root>",
    "</root>",
    "<item>",
    "</item>",
    "<name>",
    "</name>",
    "<id>",
    "</id>",
];

/// Immutable ordered list of completion candidates.
///
/// Order is significant: completion results are reported in catalog order.
/// Duplicates are kept as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCatalog {
    entries: Vec<String>,
}

impl TagCatalog {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TagCatalog {
    fn default() -> Self {
        DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect()
    }
}

impl FromIterator<String> for TagCatalog {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
