//! Finding to host diagnostic conversion.

use std::path::Path;

use lintbridge_ast::{LineIndex, Span};
use lintbridge_engine::{Finding, Severity};
use lintbridge_host::{DiagnosticCategory, HostDiagnostic};

/// Code carried by every diagnostic that originates from the linter.
pub const LINT_DIAGNOSTIC_CODE: u32 = 30010;

/// Byte span of a finding's reported location.
///
/// Without an end position the span is empty at the start.
pub fn finding_span(finding: &Finding, index: &LineIndex<'_>) -> Span {
    let start = index.offset_of(finding.start);
    let end = finding.end.map_or(start, |end| index.offset_of(end));
    Span::new(start, end)
}

/// Host category for a finding severity.
pub fn category_of(severity: Severity) -> DiagnosticCategory {
    match severity {
        Severity::Error => DiagnosticCategory::Error,
        Severity::Warning => DiagnosticCategory::Warning,
        Severity::Info => DiagnosticCategory::Suggestion,
    }
}

/// `"[<rule id>] <message>"`, with an empty rule id for engine-internal
/// findings.
pub fn format_message(finding: &Finding) -> String {
    format!(
        "[{}] {}",
        finding.rule_id.as_deref().unwrap_or_default(),
        finding.message
    )
}

/// Converts one finding.
pub fn to_host_diagnostic(finding: &Finding, file: &Path, index: &LineIndex<'_>) -> HostDiagnostic {
    let span = finding_span(finding, index);
    HostDiagnostic {
        file: Some(file.to_path_buf()),
        start: span.start,
        length: span.len(),
        category: category_of(finding.severity),
        code: LINT_DIAGNOSTIC_CODE,
        message: format_message(finding),
    }
}

/// Converts findings in order.
pub fn translate_diagnostics(
    findings: &[Finding],
    file: &Path,
    index: &LineIndex<'_>,
) -> Vec<HostDiagnostic> {
    findings
        .iter()
        .map(|finding| to_host_diagnostic(finding, file, index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintbridge_ast::Position;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn translate_one(text: &str, finding: Finding) -> HostDiagnostic {
        let index = LineIndex::new(text);
        translate_diagnostics(&[finding], Path::new("/p/a.js"), &index)
            .pop()
            .unwrap()
    }

    #[rstest]
    #[case::first_char("const x = 1", 1, 1, 0)]
    #[case::second_line("abc\ndef", 2, 1, 4)]
    #[case::crlf("abc\r\ndef", 2, 2, 6)]
    #[case::column_past_line_end("ab\ncd", 1, 10, 2)]
    #[case::line_past_end("ab", 5, 1, 2)]
    #[case::utf16_columns("é = 'ü';", 1, 5, 5)]
    fn test_start_offset(
        #[case] text: &str,
        #[case] line: u32,
        #[case] column: u32,
        #[case] expected: u32,
    ) {
        let diag = translate_one(text, Finding::new("m", Position::new(line, column)));
        assert_eq!(diag.start, expected);
        assert_eq!(diag.length, 0);
    }

    #[test]
    fn test_length_from_end_position() {
        let diag = translate_one(
            "'use strict';",
            Finding::new("m", Position::new(1, 1)).with_end(Position::new(1, 13)),
        );
        assert_eq!((diag.start, diag.length), (0, 12));
    }

    #[test]
    fn test_end_before_start_clamps_to_zero() {
        let diag = translate_one(
            "abcdef",
            Finding::new("m", Position::new(1, 5)).with_end(Position::new(1, 2)),
        );
        assert_eq!((diag.start, diag.length), (4, 0));
    }

    #[rstest]
    #[case::error(Severity::Error, DiagnosticCategory::Error)]
    #[case::warning(Severity::Warning, DiagnosticCategory::Warning)]
    #[case::info(Severity::Info, DiagnosticCategory::Suggestion)]
    fn test_category(#[case] severity: Severity, #[case] expected: DiagnosticCategory) {
        assert_eq!(category_of(severity), expected);
    }

    #[test]
    fn test_severity_levels_map_to_categories() {
        assert_eq!(category_of(Severity::from_level(2)), DiagnosticCategory::Error);
        assert_eq!(category_of(Severity::from_level(1)), DiagnosticCategory::Warning);
        assert_eq!(category_of(Severity::from_level(0)), DiagnosticCategory::Suggestion);
        assert_eq!(category_of(Severity::from_level(7)), DiagnosticCategory::Suggestion);
    }

    #[test]
    fn test_message_and_code() {
        let diag = translate_one(
            "x",
            Finding::new("Missing semicolon.", Position::new(1, 2)).with_rule("semi"),
        );
        assert_eq!(diag.message, "[semi] Missing semicolon.");
        assert_eq!(diag.code, LINT_DIAGNOSTIC_CODE);
        assert_eq!(diag.file.as_deref(), Some(Path::new("/p/a.js")));

        let internal = translate_one("x", Finding::new("Parsing error.", Position::new(1, 1)));
        assert_eq!(internal.message, "[] Parsing error.");
    }
}
