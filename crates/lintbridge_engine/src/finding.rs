//! Finding types reported by the linter.

use serde::{Deserialize, Serialize};
use lintbridge_ast::{Position, Span};

/// Severity level for findings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - level 2.
    #[default]
    Error,
    /// Warning - level 1.
    Warning,
    /// Anything else the engine reports.
    Info,
}

impl Severity {
    /// Maps a numeric engine level to a severity.
    ///
    /// `2` is an error, `1` a warning, anything else informational.
    pub fn from_level(level: u8) -> Self {
        match level {
            2 => Severity::Error,
            1 => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

/// One issue reported by the linter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    /// The rule that produced this finding. `None` for engine-internal
    /// findings such as parse failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    /// The message text.
    pub message: String,

    /// Severity level.
    #[serde(default)]
    pub severity: Severity,

    /// 1-based start position.
    pub start: Position,

    /// 1-based end position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,

    /// Optional auto-fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Finding {
    /// Creates an engine-internal error finding at `start`.
    pub fn new(message: impl Into<String>, start: Position) -> Self {
        Self {
            rule_id: None,
            message: message.into(),
            severity: Severity::Error,
            start,
            end: None,
            fix: None,
        }
    }

    /// Sets the rule id.
    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// Sets the severity level.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the end position.
    pub fn with_end(mut self, end: Position) -> Self {
        self.end = Some(end);
        self
    }

    /// Sets an auto-fix.
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }
}

/// A contiguous replacement of `span` (half-open byte range) with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fix {
    /// The byte span to replace.
    pub span: Span,

    /// The replacement text.
    pub text: String,
}

impl Fix {
    /// Creates a new fix.
    pub fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }

    /// Creates a fix that inserts text at a position.
    pub fn insert(offset: u32, text: impl Into<String>) -> Self {
        Self {
            span: Span::empty(offset),
            text: text.into(),
        }
    }

    /// Creates a fix that deletes a span.
    pub fn delete(span: Span) -> Self {
        Self {
            span,
            text: String::new(),
        }
    }
}
