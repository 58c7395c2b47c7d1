//! Host source documents.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lintbridge_ast::HostTree;

/// An immutable host-parsed source file.
#[derive(Clone)]
pub struct SourceDocument {
    /// File path.
    pub path: PathBuf,
    /// Full text.
    pub text: Arc<str>,
    /// The host's syntax tree for `text`, when the host exposes one.
    pub tree: Option<Arc<dyn HostTree>>,
}

impl SourceDocument {
    /// Creates a document without a host tree.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            tree: None,
        }
    }

    /// Attaches the host's syntax tree.
    pub fn with_tree(mut self, tree: Arc<dyn HostTree>) -> Self {
        self.tree = Some(tree);
        self
    }
}

impl fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDocument")
            .field("path", &self.path)
            .field("text_len", &self.text.len())
            .field("tree", &self.tree.as_ref().map(|_| "<HostTree>"))
            .finish()
    }
}

/// Gives access to the host's parsed source files.
pub trait HostProject: Send + Sync {
    /// Returns the current document for `path`, if the host has one.
    fn source_file(&self, path: &Path) -> Option<SourceDocument>;
}
