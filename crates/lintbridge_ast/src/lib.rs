//! # lintbridge_ast
//!
//! Source coordinates and the linter-shaped node tree for lintbridge.
//!
//! Two coordinate systems meet in this crate:
//!
//! - The host speaks 0-based byte offsets ([`Span`]).
//! - The linter speaks 1-based line/column pairs ([`Position`], [`Location`]),
//!   with columns counted in UTF-16 code units.
//!
//! [`LineIndex`] converts between the two using a line-start offset table.
//!
//! ## Architecture
//!
//! - Uses `bumpalo` for arena allocation of [`EsNode`] trees
//! - One arena per request; the whole tree is freed when the request ends
//! - Every node carries a [`NodeId`] so it can be mapped back to the host tree
//!
//! ## Example
//!
//! ```rust
//! use lintbridge_ast::{LineIndex, Position};
//!
//! let index = LineIndex::new("abc\nconst x = 1");
//! assert_eq!(index.offset_of(Position::new(2, 1)), 4);
//! ```

mod arena;
mod host_tree;
mod line_index;
mod node;
mod node_map;
mod span;
mod visitor_keys;

pub use arena::AstArena;
pub use host_tree::{HostNodeId, HostTree};
pub use line_index::LineIndex;
pub use node::{EsNode, NodeId};
pub use node_map::{NodeMap, NodeMapViolation};
pub use span::{Location, Position, Span};
pub use visitor_keys::VisitorKeys;
