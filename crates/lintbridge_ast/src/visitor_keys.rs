//! Visitor-key vocabularies.
//!
//! A vocabulary names, for each node type, which child fields a traversal
//! visits. Hosts and linters have shipped incompatible vocabularies over
//! time, so each one carries the name of its flavor.

use std::collections::BTreeMap;

use serde::Serialize;

/// A named visitor-key table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisitorKeys {
    /// Name of the vocabulary flavor (e.g. `"host"` or `"engine"`).
    pub flavor: String,
    /// Child keys per node type.
    pub keys: BTreeMap<String, Vec<String>>,
}

impl VisitorKeys {
    /// Creates an empty vocabulary of the given flavor.
    pub fn new(flavor: impl Into<String>) -> Self {
        Self {
            flavor: flavor.into(),
            keys: BTreeMap::new(),
        }
    }

    /// Adds the child keys for a node type.
    pub fn with(mut self, kind: impl Into<String>, children: &[&str]) -> Self {
        self.keys.insert(
            kind.into(),
            children.iter().map(|c| (*c).to_string()).collect(),
        );
        self
    }

    /// Returns the child keys for a node type.
    pub fn get(&self, kind: &str) -> Option<&[String]> {
        self.keys.get(kind).map(Vec::as_slice)
    }

    /// Returns true if the vocabulary knows no node types.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
