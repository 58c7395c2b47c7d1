//! Finding to host quick-fix conversion.

use std::path::Path;

use lintbridge_ast::{LineIndex, Span};
use lintbridge_engine::{Finding, Fix};
use lintbridge_host::{CodeFixAction, FileTextChanges, TextChange, TextSpan};

use crate::diagnostics::finding_span;

/// Fix name used when a finding has no rule id.
pub const FALLBACK_FIX_NAME: &str = "lintbridge";

/// Converts fixable findings whose span intersects `requested`.
///
/// Both spans are treated as inclusive, so a touching boundary counts.
/// Every qualifying finding yields its own action.
pub fn translate_code_fixes(
    findings: &[Finding],
    file: &Path,
    index: &LineIndex<'_>,
    requested: Span,
) -> Vec<CodeFixAction> {
    findings
        .iter()
        .filter_map(|finding| {
            let fix = finding.fix.as_ref()?;
            finding_span(finding, index)
                .intersects(&requested)
                .then(|| to_code_fix(finding, fix, file))
        })
        .collect()
}

fn to_code_fix(finding: &Finding, fix: &Fix, file: &Path) -> CodeFixAction {
    let name = finding.rule_id.as_deref().unwrap_or(FALLBACK_FIX_NAME);
    CodeFixAction {
        fix_name: name.to_string(),
        description: format!("Fix: {}", finding.message),
        changes: vec![FileTextChanges {
            file_name: file.to_path_buf(),
            text_changes: vec![TextChange {
                span: TextSpan::new(fix.span.start, fix.span.len()),
                new_text: fix.text.clone(),
            }],
        }],
        fix_id: Some(name.to_string()),
    }
}
