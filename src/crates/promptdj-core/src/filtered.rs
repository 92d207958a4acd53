use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Prompt texts rejected by the generation session
///
/// Matching is by text, so a prompt added later with a rejected text is
/// excluded as well. Entries are only removed by an explicit [`clear`].
///
/// [`clear`]: FilteredPrompts::clear
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredPrompts {
    texts: BTreeSet<String>,
}

impl FilteredPrompts {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejected text; returns false if it was already recorded
    pub fn insert(&mut self, text: impl Into<String>) -> bool {
        self.texts.insert(text.into())
    }

    /// Check whether a text has been rejected
    pub fn contains(&self, text: &str) -> bool {
        self.texts.contains(text)
    }

    /// Forget every rejected text
    pub fn clear(&mut self) {
        self.texts.clear();
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Iterate rejected texts in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.texts.iter().map(String::as_str)
    }
}
