//! EsNode definition.
//!
//! The node shape the linter walks: a `type` name following the linter's
//! naming convention (`Program`, `VariableDeclaration`, ...), byte range,
//! 1-based location and children.

use serde::Serialize;

use crate::{Location, Span};

/// Identity of a node inside one converted tree.
///
/// Ids are unique per tree and only meaningful for the request that
/// produced the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// A node in the linter-shaped tree.
///
/// Allocated in an [`crate::AstArena`]; the `'a` lifetime ties every child
/// slice and string to that arena.
///
/// # Example
///
/// ```rust
/// use lintbridge_ast::{AstArena, EsNode, Location, NodeId, Position, Span};
///
/// let arena = AstArena::new();
/// let loc = Location::new(Position::new(1, 1), Position::new(1, 2));
/// let ident = EsNode::new_leaf(NodeId(1), "Identifier", Span::new(0, 1), loc, Some("x"));
/// let children = arena.alloc_slice_copy(&[ident]);
/// let program = EsNode::new_parent(NodeId(0), "Program", Span::new(0, 1), loc, children);
/// assert_eq!(program.count(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EsNode<'a> {
    /// Identity within this tree.
    pub id: NodeId,

    /// Node type name.
    pub kind: &'a str,

    /// Byte span in the source text.
    pub span: Span,

    /// Line/column location.
    pub loc: Location,

    /// Child nodes.
    pub children: &'a [EsNode<'a>],

    /// Raw source text for leaf nodes (identifiers, literals).
    pub value: Option<&'a str>,
}

impl<'a> Serialize for EsNode<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut len = 3; // type, range, loc
        if !self.children.is_empty() {
            len += 1;
        }
        if self.value.is_some() {
            len += 1;
        }

        let mut state = serializer.serialize_struct("EsNode", len)?;
        state.serialize_field("type", self.kind)?;
        state.serialize_field("range", &[self.span.start, self.span.end])?;
        state.serialize_field("loc", &self.loc)?;
        if !self.children.is_empty() {
            state.serialize_field("children", &self.children)?;
        }
        if let Some(value) = &self.value {
            state.serialize_field("value", value)?;
        }
        state.end()
    }
}

impl<'a> EsNode<'a> {
    /// Creates a node with children.
    #[inline]
    pub const fn new_parent(
        id: NodeId,
        kind: &'a str,
        span: Span,
        loc: Location,
        children: &'a [EsNode<'a>],
    ) -> Self {
        Self {
            id,
            kind,
            span,
            loc,
            children,
            value: None,
        }
    }

    /// Creates a leaf node.
    #[inline]
    pub const fn new_leaf(
        id: NodeId,
        kind: &'a str,
        span: Span,
        loc: Location,
        value: Option<&'a str>,
    ) -> Self {
        Self {
            id,
            kind,
            span,
            loc,
            children: &[],
            value,
        }
    }

    /// Visits this node and all descendants in pre-order.
    pub fn walk(&self, f: &mut impl FnMut(&EsNode<'a>)) {
        f(self);
        for child in self.children {
            child.walk(f);
        }
    }

    /// Returns the number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }
}
