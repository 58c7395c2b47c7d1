//! Converts host documents into sources the engine can verify.

use std::sync::Arc;

use lintbridge_ast::{AstArena, LineIndex, VisitorKeys};
use lintbridge_engine::{AnalyzableSource, LintParser, ParseInput, ParseOptions};
use lintbridge_host::SourceDocument;
use serde_json::{Map, Value};
use tracing::debug;

use crate::BridgeError;

/// Runs the engine-compatible parser over host documents.
pub struct SourceAdapter {
    parser: Arc<dyn LintParser>,
}

impl SourceAdapter {
    pub fn new(parser: Arc<dyn LintParser>) -> Self {
        Self { parser }
    }

    /// Picks the node vocabulary: the host's own when it ships one, the
    /// parser's otherwise.
    pub fn vocabulary(&self, document: &SourceDocument) -> VisitorKeys {
        document
            .tree
            .as_ref()
            .and_then(|tree| tree.visitor_keys())
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(|| self.parser.visitor_keys())
    }

    /// Parse options for `document`. Tokens, comments, locations and ranges
    /// are always requested.
    pub fn parse_options(
        &self,
        document: &SourceDocument,
        parser_options: &Map<String, Value>,
    ) -> ParseOptions {
        ParseOptions {
            file_path: document.path.clone(),
            tokens: true,
            comment: true,
            loc: true,
            range: true,
            parser_options: parser_options.clone(),
            visitor_keys: Some(self.vocabulary(document)),
        }
    }

    /// Converts `document` into an [`AnalyzableSource`] allocated in `arena`.
    pub fn convert<'a>(
        &self,
        arena: &'a AstArena,
        document: &'a SourceDocument,
        parser_options: &Map<String, Value>,
    ) -> Result<AnalyzableSource<'a>, BridgeError> {
        let options = self.parse_options(document, parser_options);
        let input = ParseInput {
            text: &document.text,
            host_tree: document.tree.as_deref(),
        };

        let output = self
            .parser
            .parse_for_lint(arena, &input, &options)
            .map_err(|e| {
                BridgeError::conversion(format!("{}: {}", document.path.display(), e))
            })?;

        // A covering map also resolves every host node back to a tree node.
        output.node_map.check_covers(&output.tree).map_err(|violation| {
            BridgeError::conversion(format!(
                "{}: inconsistent node map ({:?})",
                document.path.display(),
                violation
            ))
        })?;

        debug!(
            "Converted {} ({} nodes, {} tokens, vocabulary '{}')",
            document.path.display(),
            output.tree.count(),
            output.tokens.len(),
            output.visitor_keys.flavor
        );

        Ok(AnalyzableSource {
            path: &document.path,
            text: &document.text,
            tree: output.tree,
            tokens: output.tokens,
            comments: output.comments,
            scope: output.scope,
            visitor_keys: output.visitor_keys,
            node_map: output.node_map,
            line_index: LineIndex::new(&document.text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintbridge_ast::{EsNode, HostNodeId, Location, NodeId, NodeMap, Position, Span};
    use lintbridge_engine::test_utils::{MiniParser, SpanHostTree};
    use lintbridge_engine::{EngineError, ParseOutput, ScopeInfo};
    use pretty_assertions::assert_eq;

    fn adapter() -> (Arc<MiniParser>, SourceAdapter) {
        let parser = Arc::new(MiniParser::new());
        let adapter = SourceAdapter::new(Arc::clone(&parser) as Arc<dyn LintParser>);
        (parser, adapter)
    }

    #[test]
    fn test_forces_tokens_comments_and_locations() {
        let (parser, adapter) = adapter();
        let document = SourceDocument::new("/p/a.js", "const x = 1; // done");
        let arena = AstArena::new();
        let mut parser_options = Map::new();
        parser_options.insert("ecmaVersion".into(), Value::from(2020));

        let source = adapter.convert(&arena, &document, &parser_options).unwrap();
        assert!(!source.tokens.is_empty());
        assert_eq!(source.comments.len(), 1);

        let options = parser.last_options().unwrap();
        assert!(options.tokens && options.comment && options.loc && options.range);
        assert_eq!(options.file_path, document.path);
        assert_eq!(options.parser_options.get("ecmaVersion"), Some(&Value::from(2020)));
    }

    #[test]
    fn test_vocabulary_prefers_host() {
        let (_, adapter) = adapter();
        let host_keys = VisitorKeys::new("host").with("Program", &["body"]);
        let document = SourceDocument::new("/p/a.js", "x;")
            .with_tree(Arc::new(SpanHostTree::with_vocabulary(host_keys)));

        let arena = AstArena::new();
        let source = adapter.convert(&arena, &document, &Map::new()).unwrap();
        assert_eq!(source.visitor_keys.flavor, "host");
    }

    #[test]
    fn test_vocabulary_falls_back_to_engine() {
        let (_, adapter) = adapter();
        let empty_host = SourceDocument::new("/p/a.js", "x;")
            .with_tree(Arc::new(SpanHostTree::with_vocabulary(VisitorKeys::new("host"))));
        let no_host = SourceDocument::new("/p/a.js", "x;").with_tree(Arc::new(SpanHostTree::new()));

        assert_eq!(adapter.vocabulary(&empty_host).flavor, "engine");
        assert_eq!(adapter.vocabulary(&no_host).flavor, "engine");
    }

    #[test]
    fn test_node_map_resolves_host_nodes() {
        let (_, adapter) = adapter();
        let document =
            SourceDocument::new("/p/a.js", "let a = b;").with_tree(Arc::new(SpanHostTree::new()));
        let arena = AstArena::new();
        let source = adapter.convert(&arena, &document, &Map::new()).unwrap();

        let statement = source.tree.children[0];
        assert_eq!(
            source.host_node_of(statement.id),
            Some(SpanHostTree::id_for(statement.span))
        );
        assert_eq!(source.node_map.len(), source.tree.count());
    }

    #[test]
    fn test_host_nodes_resolve_back_into_tree() {
        let (_, adapter) = adapter();
        let document = SourceDocument::new("/p/a.js", "let a = b;\nlet c = a;")
            .with_tree(Arc::new(SpanHostTree::new()));
        let arena = AstArena::new();
        let source = adapter.convert(&arena, &document, &Map::new()).unwrap();

        let mut tree_nodes = std::collections::HashSet::new();
        source.tree.walk(&mut |node| {
            tree_nodes.insert(node.id);
        });
        source.tree.walk(&mut |node| {
            let host = source.node_map.host_of(node.id).unwrap();
            let first = source.node_map.node_of(host).unwrap();
            assert!(tree_nodes.contains(&first), "{first:?}");
            assert_eq!(source.node_map.host_of(first), Some(host));
        });
    }

    #[test]
    fn test_parse_failure_is_conversion_error() {
        let (_, adapter) = adapter();
        let document = SourceDocument::new("/p/a.js", "let s = 'open");
        let arena = AstArena::new();
        let err = adapter.convert(&arena, &document, &Map::new()).unwrap_err();
        assert!(matches!(err, BridgeError::Conversion(_)), "{err}");
        assert!(err.to_string().contains("/p/a.js"));
    }

    struct IncompleteMapParser;

    impl LintParser for IncompleteMapParser {
        fn name(&self) -> &str {
            "incomplete"
        }

        fn visitor_keys(&self) -> VisitorKeys {
            VisitorKeys::new("engine")
        }

        fn parse_for_lint<'a>(
            &self,
            _arena: &'a AstArena,
            input: &ParseInput<'_>,
            _options: &ParseOptions,
        ) -> Result<ParseOutput<'a>, EngineError> {
            let span = Span::new(0, input.text.len() as u32);
            let loc = Location::new(Position::new(1, 1), Position::new(1, 1));
            let mut node_map = NodeMap::new();
            node_map.insert(NodeId(7), HostNodeId(7));
            Ok(ParseOutput {
                tree: EsNode::new_leaf(NodeId(0), "Program", span, loc, None),
                tokens: Vec::new(),
                comments: Vec::new(),
                scope: ScopeInfo::default(),
                node_map,
                visitor_keys: VisitorKeys::new("engine"),
            })
        }
    }

    #[test]
    fn test_incomplete_node_map_is_conversion_error() {
        let adapter = SourceAdapter::new(Arc::new(IncompleteMapParser));
        let document = SourceDocument::new("/p/a.js", "x");
        let arena = AstArena::new();
        let err = adapter.convert(&arena, &document, &Map::new()).unwrap_err();
        assert!(err.to_string().contains("inconsistent node map"), "{err}");
    }
}
