//! Test utilities for lintbridge_engine.
//!
//! A deliberately small engine understanding flat JavaScript-like
//! statements, enough to exercise the bridge end to end.

use std::path::Path;
use std::sync::Mutex;

use lintbridge_ast::{
    AstArena, EsNode, HostNodeId, HostTree, LineIndex, NodeId, NodeMap, Span, VisitorKeys,
};

use crate::{
    AnalyzableSource, Comment, EffectiveConfig, EngineError, Finding, Fix, LintEngine, LintParser,
    ParseInput, ParseOptions, ParseOutput, Scope, ScopeInfo, ScopeKind, Severity, Token,
    TokenKind, VerifyContext,
};

/// Parser identity of [`MiniParser`].
pub const MINI_PARSER_NAME: &str = "@lintbridge/parser";

const KEYWORDS: &[&str] = &[
    "const", "let", "var", "function", "return", "if", "else", "debugger",
];

/// Host tree that derives node ids from spans.
#[derive(Debug, Default)]
pub struct SpanHostTree {
    vocabulary: Option<VisitorKeys>,
}

impl SpanHostTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host tree that ships its own vocabulary.
    pub fn with_vocabulary(vocabulary: VisitorKeys) -> Self {
        Self {
            vocabulary: Some(vocabulary),
        }
    }

    pub fn id_for(span: Span) -> HostNodeId {
        HostNodeId(((span.start as u64) << 32) | span.end as u64)
    }
}

impl HostTree for SpanHostTree {
    fn root(&self) -> HostNodeId {
        HostNodeId(u64::MAX)
    }

    fn node_at(&self, span: Span) -> Option<HostNodeId> {
        Some(Self::id_for(span))
    }

    fn visitor_keys(&self) -> Option<VisitorKeys> {
        self.vocabulary.clone()
    }
}

/// The engine's own vocabulary.
pub fn engine_visitor_keys() -> VisitorKeys {
    VisitorKeys::new("engine")
        .with("Program", &["body"])
        .with("VariableDeclaration", &["declarations"])
        .with("ExpressionStatement", &["expression"])
        .with("DebuggerStatement", &[])
}

/// Tokenizing parser for flat statements.
#[derive(Debug, Default)]
pub struct MiniParser {
    last_options: Mutex<Option<ParseOptions>>,
}

impl MiniParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options of the most recent parse.
    pub fn last_options(&self) -> Option<ParseOptions> {
        self.last_options.lock().ok().and_then(|o| o.clone())
    }
}

fn tokenize(text: &str, index: &LineIndex<'_>) -> Result<(Vec<Token>, Vec<Comment>), EngineError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            let span = Span::new(start as u32, i as u32);
            comments.push(Comment {
                block: false,
                span,
                loc: index.location_of(span),
                value: text[start + 2..i].to_string(),
            });
            continue;
        }
        if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
            let Some(close) = text[i + 2..].find("*/") else {
                return Err(EngineError::parse_at("Unterminated comment", start as u32));
            };
            i = i + 2 + close + 2;
            let span = Span::new(start as u32, i as u32);
            comments.push(Comment {
                block: true,
                span,
                loc: index.location_of(span),
                value: text[start + 2..i - 2].to_string(),
            });
            continue;
        }

        let kind = if c.is_ascii_alphabetic() || c == b'_' || c == b'$' {
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
            {
                i += 1;
            }
            if KEYWORDS.contains(&&text[start..i]) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            }
        } else if c.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            TokenKind::Numeric
        } else if c == b'\'' || c == b'"' {
            i += 1;
            loop {
                match bytes.get(i) {
                    None | Some(b'\n') => {
                        return Err(EngineError::parse_at(
                            "Unterminated string literal",
                            start as u32,
                        ));
                    }
                    Some(b'\\') => i += 2,
                    Some(&q) if q == c => {
                        i += 1;
                        break;
                    }
                    Some(_) => i += 1,
                }
            }
            TokenKind::String
        } else if b"{}()[];,=+-*/<>!.:?".contains(&c) {
            i += 1;
            TokenKind::Punctuator
        } else {
            return Err(EngineError::parse_at(
                format!("Unexpected character '{}'", &text[start..].chars().next().unwrap_or('?')),
                start as u32,
            ));
        };

        let span = Span::new(start as u32, i as u32);
        tokens.push(Token {
            kind,
            span,
            loc: index.location_of(span),
            value: text[start..i].to_string(),
        });
    }

    Ok((tokens, comments))
}

/// Splits tokens into statements at `;` or at a line break outside braces.
fn split_statements(tokens: &[Token]) -> Vec<&[Token]> {
    let mut statements = Vec::new();
    let mut begin = 0;
    let mut depth = 0i32;
    for (i, token) in tokens.iter().enumerate() {
        match token.value.as_str() {
            "{" => depth += 1,
            "}" => depth -= 1,
            _ => {}
        }
        let ends_here = depth <= 0
            && (token.value == ";"
                || tokens
                    .get(i + 1)
                    .is_none_or(|next| next.loc.start.line > token.loc.end.line));
        if ends_here {
            statements.push(&tokens[begin..=i]);
            begin = i + 1;
        }
    }
    statements
}

impl LintParser for MiniParser {
    fn name(&self) -> &str {
        MINI_PARSER_NAME
    }

    fn visitor_keys(&self) -> VisitorKeys {
        engine_visitor_keys()
    }

    fn parse_for_lint<'a>(
        &self,
        arena: &'a AstArena,
        input: &ParseInput<'_>,
        options: &ParseOptions,
    ) -> Result<ParseOutput<'a>, EngineError> {
        if let Ok(mut last) = self.last_options.lock() {
            *last = Some(options.clone());
        }

        let text = input.text;
        let index = LineIndex::new(text);
        let (tokens, comments) = tokenize(text, &index)?;

        let mut next_id = 0u32;
        let mut fresh = || {
            let id = NodeId(next_id);
            next_id += 1;
            id
        };
        let program_id = fresh();
        let mut declared = Vec::new();
        let mut statements = Vec::new();

        for stmt in split_statements(&tokens) {
            let (Some(first), Some(last)) = (stmt.first(), stmt.last()) else {
                continue;
            };
            let span = Span::new(first.span.start, last.span.end);
            let kind = match (first.kind, first.value.as_str()) {
                (TokenKind::Keyword, "const" | "let" | "var") => {
                    if let Some(name) = stmt.get(1).filter(|t| t.kind == TokenKind::Identifier) {
                        declared.push(name.value.clone());
                    }
                    "VariableDeclaration"
                }
                (TokenKind::Keyword, "debugger") => "DebuggerStatement",
                _ => "ExpressionStatement",
            };
            let stmt_id = fresh();
            let children: Vec<EsNode<'a>> = stmt
                .iter()
                .filter_map(|t| {
                    let leaf_kind = match t.kind {
                        TokenKind::Identifier => "Identifier",
                        TokenKind::String | TokenKind::Numeric => "Literal",
                        _ => return None,
                    };
                    Some(EsNode::new_leaf(
                        fresh(),
                        leaf_kind,
                        t.span,
                        t.loc,
                        Some(arena.alloc_str(&t.value)),
                    ))
                })
                .collect();
            statements.push(EsNode::new_parent(
                stmt_id,
                kind,
                span,
                index.location_of(span),
                arena.alloc_slice_copy(&children),
            ));
        }

        let program_span = Span::new(0, text.len() as u32);
        let tree = EsNode::new_parent(
            program_id,
            "Program",
            program_span,
            index.location_of(program_span),
            arena.alloc_slice_copy(&statements),
        );

        let mut node_map = NodeMap::new();
        tree.walk(&mut |node| {
            let host = match input.host_tree {
                Some(host) => host.node_at(node.span).unwrap_or_else(|| host.root()),
                None => HostNodeId(node.id.0 as u64),
            };
            node_map.insert(node.id, host);
        });

        Ok(ParseOutput {
            tree,
            tokens: if options.tokens { tokens } else { Vec::new() },
            comments: if options.comment { comments } else { Vec::new() },
            scope: ScopeInfo {
                scopes: vec![Scope {
                    kind: ScopeKind::Global,
                    block: program_id,
                    variables: declared,
                    parent: None,
                }],
            },
            node_map,
            visitor_keys: options
                .visitor_keys
                .clone()
                .unwrap_or_else(engine_visitor_keys),
        })
    }
}

/// Engine implementing `semi`, `quotes` and `no-debugger`.
#[derive(Debug, Default)]
pub struct MiniEngine {
    calls: Mutex<usize>,
}

impl MiniEngine {
    pub const RULES: &'static [&'static str] = &["semi", "quotes", "no-debugger"];

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `verify` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

fn requote(raw: &str, quote: char) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(raw.len() + 2);
    out.push(quote);
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                if next != quote && (next == '"' || next == '\'') {
                    out.push(next);
                } else {
                    out.push('\\');
                    out.push(next);
                }
            }
        } else if c == quote {
            out.push('\\');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out.push(quote);
    out
}

impl LintEngine for MiniEngine {
    fn verify(
        &self,
        source: &AnalyzableSource<'_>,
        config: &EffectiveConfig,
        _context: &VerifyContext<'_>,
    ) -> Result<Vec<Finding>, EngineError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }

        let mut findings = Vec::new();
        for (rule_id, setting) in config.enabled_rules() {
            let severity = Severity::from_level(setting.severity.level());
            match rule_id {
                "semi" => {
                    for stmt in source.tree.children {
                        let Some(last) = source.tokens_in(stmt.span).last() else {
                            continue;
                        };
                        if last.value != ";" {
                            findings.push(
                                Finding::new("Missing semicolon.", last.loc.end)
                                    .with_rule("semi")
                                    .with_severity(severity)
                                    .with_end(last.loc.end)
                                    .with_fix(Fix::insert(last.span.end, ";")),
                            );
                        }
                    }
                }
                "quotes" => {
                    let quote = match setting.options.first().and_then(|v| v.as_str()) {
                        Some("single") => '\'',
                        _ => '"',
                    };
                    let label = if quote == '"' { "doublequote" } else { "singlequote" };
                    for token in source.tokens.iter().filter(|t| t.kind == TokenKind::String) {
                        if !token.value.starts_with(quote) {
                            findings.push(
                                Finding::new(format!("Strings must use {label}."), token.loc.start)
                                    .with_rule("quotes")
                                    .with_severity(severity)
                                    .with_end(token.loc.end)
                                    .with_fix(Fix::new(token.span, requote(&token.value, quote))),
                            );
                        }
                    }
                }
                "no-debugger" => {
                    for stmt in source.tree.children.iter().filter(|n| n.kind == "DebuggerStatement") {
                        findings.push(
                            Finding::new("Unexpected 'debugger' statement.", stmt.loc.start)
                                .with_rule("no-debugger")
                                .with_severity(severity)
                                .with_end(stmt.loc.end),
                        );
                    }
                }
                unknown => findings.push(
                    Finding::new(
                        format!("Definition for rule '{unknown}' was not found."),
                        lintbridge_ast::Position::new(1, 1),
                    )
                    .with_rule(unknown)
                    .with_severity(severity),
                ),
            }
        }

        findings.sort_by_key(|f| (f.start.line, f.start.column));
        Ok(findings)
    }

    fn has_rule(&self, rule_id: &str) -> bool {
        Self::RULES.contains(&rule_id)
    }
}

/// Engine whose `verify` always fails.
#[derive(Debug, Default)]
pub struct FailingEngine;

impl LintEngine for FailingEngine {
    fn verify(
        &self,
        _source: &AnalyzableSource<'_>,
        _config: &EffectiveConfig,
        _context: &VerifyContext<'_>,
    ) -> Result<Vec<Finding>, EngineError> {
        Err(EngineError::rule("semi", "rule crashed"))
    }

    fn has_rule(&self, _rule_id: &str) -> bool {
        true
    }
}

/// Engine whose `verify` panics.
#[derive(Debug, Default)]
pub struct PanickingEngine;

impl LintEngine for PanickingEngine {
    fn verify(
        &self,
        _source: &AnalyzableSource<'_>,
        _config: &EffectiveConfig,
        _context: &VerifyContext<'_>,
    ) -> Result<Vec<Finding>, EngineError> {
        panic!("engine blew up")
    }

    fn has_rule(&self, _rule_id: &str) -> bool {
        true
    }
}

/// Parser claiming the [`MiniParser`] identity whose parse panics.
#[derive(Debug, Default)]
pub struct PanickingParser;

impl LintParser for PanickingParser {
    fn name(&self) -> &str {
        MINI_PARSER_NAME
    }

    fn visitor_keys(&self) -> VisitorKeys {
        engine_visitor_keys()
    }

    fn parse_for_lint<'a>(
        &self,
        _arena: &'a AstArena,
        _input: &ParseInput<'_>,
        _options: &ParseOptions,
    ) -> Result<ParseOutput<'a>, EngineError> {
        panic!("parser blew up")
    }
}

/// Parses `text` with [`MiniParser`] into a ready-to-verify source.
pub fn analyzable<'a>(
    arena: &'a AstArena,
    path: &'a Path,
    text: &'a str,
) -> Result<AnalyzableSource<'a>, EngineError> {
    let parser = MiniParser::new();
    let options = ParseOptions {
        file_path: path.to_path_buf(),
        tokens: true,
        comment: true,
        loc: true,
        range: true,
        ..Default::default()
    };
    let output = parser.parse_for_lint(arena, &ParseInput { text, host_tree: None }, &options)?;
    Ok(AnalyzableSource {
        path,
        text,
        tree: output.tree,
        tokens: output.tokens,
        comments: output.comments,
        scope: output.scope,
        visitor_keys: output.visitor_keys,
        node_map: output.node_map,
        line_index: LineIndex::new(text),
    })
}
