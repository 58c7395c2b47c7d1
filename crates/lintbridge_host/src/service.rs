//! The host language service's operation table.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::diagnostic::{CodeFixAction, HostDiagnostic, TextSpan};

/// A code-fix request for a range of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFixRequest {
    pub file: PathBuf,
    /// 0-based byte offset, inclusive.
    pub start: u32,
    /// 0-based byte offset, exclusive.
    pub end: u32,
    /// Diagnostic codes the fixes are requested for.
    pub error_codes: Vec<u32>,
}

/// Hover information returned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickInfo {
    pub span: TextSpan,
    pub text: String,
}

/// A host language service.
///
/// Hosts implement this and turn it into a [`ServiceOps`] table with
/// [`ServiceOps::from_service`].
pub trait LanguageService: Send + Sync {
    fn get_semantic_diagnostics(&self, file: &Path) -> Vec<HostDiagnostic>;

    fn get_syntactic_diagnostics(&self, _file: &Path) -> Vec<HostDiagnostic> {
        Vec::new()
    }

    fn get_suggestion_diagnostics(&self, _file: &Path) -> Vec<HostDiagnostic> {
        Vec::new()
    }

    fn get_code_fixes_at_position(&self, _request: &CodeFixRequest) -> Vec<CodeFixAction> {
        Vec::new()
    }

    /// Diagnostic codes, as strings, the host can produce fixes for.
    fn get_supported_code_fixes(&self) -> Vec<String> {
        Vec::new()
    }

    fn get_quick_info_at_position(&self, _file: &Path, _offset: u32) -> Option<QuickInfo> {
        None
    }
}

pub type DiagnosticsFn = Arc<dyn Fn(&Path) -> Vec<HostDiagnostic> + Send + Sync>;
pub type CodeFixesFn = Arc<dyn Fn(&CodeFixRequest) -> Vec<CodeFixAction> + Send + Sync>;
pub type SupportedCodeFixesFn = Arc<dyn Fn() -> Vec<String> + Send + Sync>;
pub type QuickInfoFn = Arc<dyn Fn(&Path, u32) -> Option<QuickInfo> + Send + Sync>;

/// Names of the operations in a [`ServiceOps`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationName {
    SemanticDiagnostics,
    SyntacticDiagnostics,
    SuggestionDiagnostics,
    CodeFixesAtPosition,
    SupportedCodeFixes,
    QuickInfoAtPosition,
}

impl OperationName {
    pub const ALL: [OperationName; 6] = [
        OperationName::SemanticDiagnostics,
        OperationName::SyntacticDiagnostics,
        OperationName::SuggestionDiagnostics,
        OperationName::CodeFixesAtPosition,
        OperationName::SupportedCodeFixes,
        OperationName::QuickInfoAtPosition,
    ];

    /// The host's name for the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationName::SemanticDiagnostics => "getSemanticDiagnostics",
            OperationName::SyntacticDiagnostics => "getSyntacticDiagnostics",
            OperationName::SuggestionDiagnostics => "getSuggestionDiagnostics",
            OperationName::CodeFixesAtPosition => "getCodeFixesAtPosition",
            OperationName::SupportedCodeFixes => "getSupportedCodeFixes",
            OperationName::QuickInfoAtPosition => "getQuickInfoAtPosition",
        }
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The host's operation table.
///
/// Each entry is a shared function value, so a table can be cloned and
/// selectively re-wrapped while the untouched entries stay the very same
/// functions (comparable with [`ServiceOps::same_operation`]).
#[derive(Clone)]
pub struct ServiceOps {
    pub get_semantic_diagnostics: DiagnosticsFn,
    pub get_syntactic_diagnostics: DiagnosticsFn,
    pub get_suggestion_diagnostics: DiagnosticsFn,
    pub get_code_fixes_at_position: CodeFixesFn,
    pub get_supported_code_fixes: SupportedCodeFixesFn,
    pub get_quick_info_at_position: QuickInfoFn,
}

impl ServiceOps {
    /// Builds a table whose entries call into `service`.
    pub fn from_service<S: LanguageService + 'static>(service: Arc<S>) -> Self {
        let semantic = Arc::clone(&service);
        let syntactic = Arc::clone(&service);
        let suggestion = Arc::clone(&service);
        let fixes = Arc::clone(&service);
        let supported = Arc::clone(&service);
        let quick_info = service;
        Self {
            get_semantic_diagnostics: Arc::new(move |file| semantic.get_semantic_diagnostics(file)),
            get_syntactic_diagnostics: Arc::new(move |file| {
                syntactic.get_syntactic_diagnostics(file)
            }),
            get_suggestion_diagnostics: Arc::new(move |file| {
                suggestion.get_suggestion_diagnostics(file)
            }),
            get_code_fixes_at_position: Arc::new(move |req| fixes.get_code_fixes_at_position(req)),
            get_supported_code_fixes: Arc::new(move || supported.get_supported_code_fixes()),
            get_quick_info_at_position: Arc::new(move |file, offset| {
                quick_info.get_quick_info_at_position(file, offset)
            }),
        }
    }

    /// Returns true when `name` refers to the same function value in both
    /// tables.
    pub fn same_operation(&self, other: &ServiceOps, name: OperationName) -> bool {
        match name {
            OperationName::SemanticDiagnostics => {
                Arc::ptr_eq(&self.get_semantic_diagnostics, &other.get_semantic_diagnostics)
            }
            OperationName::SyntacticDiagnostics => {
                Arc::ptr_eq(&self.get_syntactic_diagnostics, &other.get_syntactic_diagnostics)
            }
            OperationName::SuggestionDiagnostics => Arc::ptr_eq(
                &self.get_suggestion_diagnostics,
                &other.get_suggestion_diagnostics,
            ),
            OperationName::CodeFixesAtPosition => Arc::ptr_eq(
                &self.get_code_fixes_at_position,
                &other.get_code_fixes_at_position,
            ),
            OperationName::SupportedCodeFixes => {
                Arc::ptr_eq(&self.get_supported_code_fixes, &other.get_supported_code_fixes)
            }
            OperationName::QuickInfoAtPosition => Arc::ptr_eq(
                &self.get_quick_info_at_position,
                &other.get_quick_info_at_position,
            ),
        }
    }
}

impl LanguageService for ServiceOps {
    fn get_semantic_diagnostics(&self, file: &Path) -> Vec<HostDiagnostic> {
        (self.get_semantic_diagnostics)(file)
    }

    fn get_syntactic_diagnostics(&self, file: &Path) -> Vec<HostDiagnostic> {
        (self.get_syntactic_diagnostics)(file)
    }

    fn get_suggestion_diagnostics(&self, file: &Path) -> Vec<HostDiagnostic> {
        (self.get_suggestion_diagnostics)(file)
    }

    fn get_code_fixes_at_position(&self, request: &CodeFixRequest) -> Vec<CodeFixAction> {
        (self.get_code_fixes_at_position)(request)
    }

    fn get_supported_code_fixes(&self) -> Vec<String> {
        (self.get_supported_code_fixes)()
    }

    fn get_quick_info_at_position(&self, file: &Path, offset: u32) -> Option<QuickInfo> {
        (self.get_quick_info_at_position)(file, offset)
    }
}

impl fmt::Debug for ServiceOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(OperationName::ALL.iter().map(OperationName::as_str))
            .finish()
    }
}
