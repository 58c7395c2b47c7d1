//! Host-native diagnostic and code-fix shapes.

use std::path::PathBuf;

use serde::Serialize;

/// Diagnostic category as the host understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

/// A diagnostic in host coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDiagnostic {
    /// Source file.
    pub file: Option<PathBuf>,
    /// 0-based byte offset.
    pub start: u32,
    /// Length in bytes.
    pub length: u32,
    pub category: DiagnosticCategory,
    /// Numeric diagnostic code.
    pub code: u32,
    pub message: String,
}

/// A span as `(start, length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextSpan {
    pub start: u32,
    pub length: u32,
}

impl TextSpan {
    pub const fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// Exclusive end offset.
    pub const fn end(&self) -> u32 {
        self.start + self.length
    }
}

/// Replace `span` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    pub span: TextSpan,
    pub new_text: String,
}

/// Ordered text changes for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTextChanges {
    pub file_name: PathBuf,
    pub text_changes: Vec<TextChange>,
}

/// A quick-fix action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFixAction {
    /// Short identifier of the fix kind.
    pub fix_name: String,
    /// Human-readable description.
    pub description: String,
    pub changes: Vec<FileTextChanges>,
    /// Identifier used to group "fix all" requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_id: Option<String>,
}

impl CodeFixAction {
    /// Applies every change of this action to `text`.
    ///
    /// Changes are applied from the last offset backwards so earlier offsets
    /// stay valid. Out-of-range spans are skipped.
    pub fn apply_to(&self, text: &str) -> String {
        let mut changes: Vec<&TextChange> = self
            .changes
            .iter()
            .flat_map(|c| c.text_changes.iter())
            .collect();
        changes.sort_by(|a, b| b.span.start.cmp(&a.span.start));

        let mut out = text.to_string();
        for change in changes {
            let (start, end) = (change.span.start as usize, change.span.end() as usize);
            if end <= out.len() && out.is_char_boundary(start) && out.is_char_boundary(end) {
                out.replace_range(start..end, &change.new_text);
            }
        }
        out
    }
}
