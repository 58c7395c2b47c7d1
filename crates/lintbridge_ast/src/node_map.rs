//! Bidirectional mapping between converted nodes and host nodes.

use std::collections::HashMap;

use crate::{EsNode, HostNodeId, NodeId};

/// Maps each converted node to the host node it came from, and back.
///
/// Several converted nodes may share one host node (a statement and its
/// expression often do); the reverse direction keeps the first, outermost
/// node registered.
#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    to_host: HashMap<NodeId, HostNodeId>,
    from_host: HashMap<HostNodeId, NodeId>,
}

/// A converted node violating the one-entry-per-node rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMapViolation {
    /// The node has no host counterpart.
    Missing(NodeId),
    /// The node id occurs more than once in the tree.
    Duplicate(NodeId),
    /// The map holds entries for nodes that are not in the tree.
    Extra(usize),
}

impl NodeMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `node` was derived from `host`.
    ///
    /// Returns `false` if `node` was already mapped; the first mapping wins.
    pub fn insert(&mut self, node: NodeId, host: HostNodeId) -> bool {
        if self.to_host.contains_key(&node) {
            return false;
        }
        self.to_host.insert(node, host);
        self.from_host.entry(host).or_insert(node);
        true
    }

    /// Returns the host node a converted node came from.
    pub fn host_of(&self, node: NodeId) -> Option<HostNodeId> {
        self.to_host.get(&node).copied()
    }

    /// Returns the outermost converted node derived from a host node.
    pub fn node_of(&self, host: HostNodeId) -> Option<NodeId> {
        self.from_host.get(&host).copied()
    }

    /// Number of converted nodes mapped.
    pub fn len(&self) -> usize {
        self.to_host.len()
    }

    /// Returns true if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.to_host.is_empty()
    }

    /// Checks that every node of `tree` has exactly one entry and that the
    /// map holds nothing else.
    pub fn check_covers(&self, tree: &EsNode<'_>) -> Result<(), NodeMapViolation> {
        let mut seen = std::collections::HashSet::new();
        let mut violation = None;
        tree.walk(&mut |node| {
            if violation.is_some() {
                return;
            }
            if !seen.insert(node.id) {
                violation = Some(NodeMapViolation::Duplicate(node.id));
            } else if !self.to_host.contains_key(&node.id) {
                violation = Some(NodeMapViolation::Missing(node.id));
            }
        });
        if let Some(v) = violation {
            return Err(v);
        }
        if self.to_host.len() != seen.len() {
            return Err(NodeMapViolation::Extra(self.to_host.len() - seen.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AstArena, Location, Position, Span};

    fn loc() -> Location {
        Location::new(Position::new(1, 1), Position::new(1, 2))
    }

    #[test]
    fn test_bidirectional_lookup() {
        let mut map = NodeMap::new();
        assert!(map.insert(NodeId(0), HostNodeId(10)));
        assert!(map.insert(NodeId(1), HostNodeId(10)));
        assert!(!map.insert(NodeId(1), HostNodeId(11)));

        assert_eq!(map.host_of(NodeId(1)), Some(HostNodeId(10)));
        assert_eq!(map.node_of(HostNodeId(10)), Some(NodeId(0)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_check_covers() {
        let arena = AstArena::new();
        let leaf = EsNode::new_leaf(NodeId(1), "Identifier", Span::new(0, 1), loc(), None);
        let root = EsNode::new_parent(
            NodeId(0),
            "Program",
            Span::new(0, 1),
            loc(),
            arena.alloc_slice_copy(&[leaf]),
        );

        let mut map = NodeMap::new();
        map.insert(NodeId(0), HostNodeId(1));
        assert_eq!(
            map.check_covers(&root),
            Err(NodeMapViolation::Missing(NodeId(1)))
        );

        map.insert(NodeId(1), HostNodeId(2));
        assert_eq!(map.check_covers(&root), Ok(()));

        map.insert(NodeId(9), HostNodeId(3));
        assert_eq!(map.check_covers(&root), Err(NodeMapViolation::Extra(1)));
    }

    #[test]
    fn test_duplicate_node_ids_are_rejected() {
        let arena = AstArena::new();
        let a = EsNode::new_leaf(NodeId(1), "Identifier", Span::new(0, 1), loc(), None);
        let root = EsNode::new_parent(
            NodeId(0),
            "Program",
            Span::new(0, 1),
            loc(),
            arena.alloc_slice_copy(&[a, a]),
        );
        let mut map = NodeMap::new();
        map.insert(NodeId(0), HostNodeId(1));
        map.insert(NodeId(1), HostNodeId(2));
        assert_eq!(
            map.check_covers(&root),
            Err(NodeMapViolation::Duplicate(NodeId(1)))
        );
    }
}
