//! Secondary indices enumerating account and legal entity ids
//!
//! The indices exist so hosts can enumerate entities without scanning the
//! store; they are updated in the same commit as the records they index.

use serde::Serialize;

/// Set of all known account identifiers, in creation order
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct AccountIndex {
    /// Account ids
    pub ids: Vec<String>,
}

impl AccountIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an id is present
    pub fn has(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    /// Append an id
    pub fn add(&mut self, id: String) {
        self.ids.push(id);
    }
}

/// Set of all known legal entity identifiers, in creation order
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct LegalEntityIndex {
    /// Legal entity ids
    pub ids: Vec<String>,
}

impl LegalEntityIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an id is present
    pub fn has(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    /// Append an id
    pub fn add(&mut self, id: String) {
        self.ids.push(id);
    }
}
