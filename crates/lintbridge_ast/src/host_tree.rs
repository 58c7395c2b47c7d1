//! Handles into the host's own syntax tree.

use serde::Serialize;

use crate::{Span, VisitorKeys};

/// Opaque identity of a node in the host's syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HostNodeId(pub u64);

/// Read-only view of a host-native syntax tree.
///
/// The bridge never walks the host tree itself; it hands this view to the
/// linter's parser so the converted tree can be mapped back to host nodes.
pub trait HostTree: Send + Sync {
    /// Returns the root node.
    fn root(&self) -> HostNodeId;

    /// Returns the innermost host node covering exactly `span`, if any.
    fn node_at(&self, span: Span) -> Option<HostNodeId>;

    /// Returns the host's own visitor-key vocabulary, when it ships one.
    fn visitor_keys(&self) -> Option<VisitorKeys> {
        None
    }
}
