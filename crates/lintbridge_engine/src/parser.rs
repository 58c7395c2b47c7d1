//! Parse/convert entry point of the linter.

use std::path::PathBuf;

use serde_json::{Map, Value};
use lintbridge_ast::{AstArena, EsNode, HostTree, NodeMap, VisitorKeys};

use crate::{Comment, EngineError, ScopeInfo, Token};

/// Options for [`LintParser::parse_for_lint`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// File being parsed.
    pub file_path: PathBuf,
    /// Capture tokens.
    pub tokens: bool,
    /// Capture comments.
    pub comment: bool,
    /// Attach 1-based line/column locations.
    pub loc: bool,
    /// Attach byte ranges.
    pub range: bool,
    /// Parser options from the effective configuration.
    pub parser_options: Map<String, Value>,
    /// Vocabulary the caller wants the tree expressed in.
    pub visitor_keys: Option<VisitorKeys>,
}

/// Input for one parse.
pub struct ParseInput<'s> {
    /// Full source text.
    pub text: &'s str,
    /// The host's own tree for the same text, used to build the node map.
    pub host_tree: Option<&'s dyn HostTree>,
}

/// Output of one parse.
#[derive(Debug)]
pub struct ParseOutput<'a> {
    pub tree: EsNode<'a>,
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    pub scope: ScopeInfo,
    pub node_map: NodeMap,
    /// Vocabulary the tree was built with.
    pub visitor_keys: VisitorKeys,
}

/// Converts raw text into the linter's tree shape.
///
/// # Example
///
/// ```rust,ignore
/// use lintbridge_engine::{LintParser, ParseInput, ParseOptions};
/// use lintbridge_ast::AstArena;
///
/// let arena = AstArena::new();
/// let input = ParseInput { text: "const x = 1;", host_tree: None };
/// let output = parser.parse_for_lint(&arena, &input, &ParseOptions::default())?;
/// ```
pub trait LintParser: Send + Sync {
    /// Module identity of this parser (what configs name in `parser`).
    fn name(&self) -> &str;

    /// The parser's own visitor-key vocabulary.
    fn visitor_keys(&self) -> VisitorKeys;

    /// Parses `input` into a tree allocated in `arena`.
    fn parse_for_lint<'a>(
        &self,
        arena: &'a AstArena,
        input: &ParseInput<'_>,
        options: &ParseOptions,
    ) -> Result<ParseOutput<'a>, EngineError>;
}
