//! The analyzable representation a linter runs against.

use std::path::Path;

use serde::Serialize;
use lintbridge_ast::{EsNode, HostNodeId, LineIndex, Location, NodeId, NodeMap, Span, VisitorKeys};

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Punctuator,
    Numeric,
    String,
    Template,
    RegularExpression,
}

/// A source token with both coordinate systems attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub loc: Location,
    /// Raw source text of the token.
    pub value: String,
}

/// A line or block comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    /// `true` for `/* */`, `false` for `//`.
    pub block: bool,
    pub span: Span,
    pub loc: Location,
    /// Comment body without delimiters.
    pub value: String,
}

/// Kind of lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
}

/// One lexical scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub kind: ScopeKind,
    /// The node that opens this scope.
    pub block: NodeId,
    /// Names declared directly in this scope.
    pub variables: Vec<String>,
    /// Index of the enclosing scope in [`ScopeInfo::scopes`].
    pub parent: Option<usize>,
}

/// Lexical-scope graph of a converted tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeInfo {
    /// All scopes; index 0 is the outermost one.
    pub scopes: Vec<Scope>,
}

impl ScopeInfo {
    /// Returns the outermost scope.
    pub fn global(&self) -> Option<&Scope> {
        self.scopes.first()
    }

    /// Returns true if `name` is declared in scope `index` or any ancestor.
    pub fn resolves(&self, index: usize, name: &str) -> bool {
        let mut current = Some(index);
        while let Some(i) = current {
            let Some(scope) = self.scopes.get(i) else {
                return false;
            };
            if scope.variables.iter().any(|v| v == name) {
                return true;
            }
            current = scope.parent;
        }
        false
    }
}

/// Request-scoped structure the linter analyzes.
///
/// Built by the bridge from a host document; discarded when the request
/// ends, together with the arena holding `tree`.
#[derive(Debug)]
pub struct AnalyzableSource<'a> {
    /// File the text belongs to.
    pub path: &'a Path,
    /// Full source text.
    pub text: &'a str,
    /// Root of the converted tree.
    pub tree: EsNode<'a>,
    /// All tokens in source order.
    pub tokens: Vec<Token>,
    /// All comments in source order.
    pub comments: Vec<Comment>,
    /// Lexical scopes.
    pub scope: ScopeInfo,
    /// Vocabulary used to traverse `tree`.
    pub visitor_keys: VisitorKeys,
    /// Converted node to host node mapping.
    pub node_map: NodeMap,
    /// Line-start table for `text`.
    pub line_index: LineIndex<'a>,
}

impl<'a> AnalyzableSource<'a> {
    /// Returns the token starting at `offset`.
    pub fn token_at(&self, offset: u32) -> Option<&Token> {
        self.tokens
            .binary_search_by_key(&offset, |t| t.span.start)
            .ok()
            .map(|i| &self.tokens[i])
    }

    /// Returns the tokens fully inside `span`.
    pub fn tokens_in(&self, span: Span) -> impl Iterator<Item = &Token> {
        self.tokens
            .iter()
            .filter(move |t| t.span.start >= span.start && t.span.end <= span.end)
    }

    /// Resolves a converted node back to its host node.
    pub fn host_node_of(&self, node: NodeId) -> Option<HostNodeId> {
        self.node_map.host_of(node)
    }

    /// Returns the source text covered by `span`.
    pub fn slice(&self, span: Span) -> &'a str {
        self.text
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(kind: ScopeKind, vars: &[&str], parent: Option<usize>) -> Scope {
        Scope {
            kind,
            block: NodeId(0),
            variables: vars.iter().map(|v| v.to_string()).collect(),
            parent,
        }
    }

    #[test]
    fn test_scope_resolution_walks_parents() {
        let info = ScopeInfo {
            scopes: vec![
                scope(ScopeKind::Global, &["x"], None),
                scope(ScopeKind::Block, &["y"], Some(0)),
            ],
        };
        assert!(info.resolves(1, "x"));
        assert!(info.resolves(1, "y"));
        assert!(!info.resolves(0, "y"));
        assert!(!info.resolves(5, "x"));
        assert_eq!(info.global().map(|s| s.kind), Some(ScopeKind::Global));
    }
}
