//! Selective re-wrapping of a host operation table.

use std::path::Path;
use std::sync::Arc;

use lintbridge_host::{
    CodeFixAction, CodeFixRequest, CodeFixesFn, DiagnosticsFn, HostDiagnostic, OperationName,
    QuickInfo, QuickInfoFn, ServiceOps, SupportedCodeFixesFn,
};
use tracing::debug;

/// Builds a proxied [`ServiceOps`].
///
/// Each `wrap_*` method replaces one operation with a wrapper that receives
/// the previous implementation as its first argument. Operations that are
/// never wrapped keep their original function values.
pub struct ServiceProxyBuilder {
    ops: ServiceOps,
    wrapped: Vec<OperationName>,
}

impl ServiceProxyBuilder {
    pub fn new(ops: ServiceOps) -> Self {
        Self {
            ops,
            wrapped: Vec::new(),
        }
    }

    pub fn wrap_semantic_diagnostics<F>(mut self, wrapper: F) -> Self
    where
        F: Fn(&DiagnosticsFn, &Path) -> Vec<HostDiagnostic> + Send + Sync + 'static,
    {
        let delegate = Arc::clone(&self.ops.get_semantic_diagnostics);
        self.ops.get_semantic_diagnostics = Arc::new(move |file| wrapper(&delegate, file));
        self.wrapped.push(OperationName::SemanticDiagnostics);
        self
    }

    pub fn wrap_code_fixes_at_position<F>(mut self, wrapper: F) -> Self
    where
        F: Fn(&CodeFixesFn, &CodeFixRequest) -> Vec<CodeFixAction> + Send + Sync + 'static,
    {
        let delegate = Arc::clone(&self.ops.get_code_fixes_at_position);
        self.ops.get_code_fixes_at_position = Arc::new(move |request| wrapper(&delegate, request));
        self.wrapped.push(OperationName::CodeFixesAtPosition);
        self
    }

    pub fn wrap_supported_code_fixes<F>(mut self, wrapper: F) -> Self
    where
        F: Fn(&SupportedCodeFixesFn) -> Vec<String> + Send + Sync + 'static,
    {
        let delegate: SupportedCodeFixesFn = Arc::clone(&self.ops.get_supported_code_fixes);
        self.ops.get_supported_code_fixes = Arc::new(move || wrapper(&delegate));
        self.wrapped.push(OperationName::SupportedCodeFixes);
        self
    }

    pub fn wrap_quick_info_at_position<F>(mut self, wrapper: F) -> Self
    where
        F: Fn(&QuickInfoFn, &Path, u32) -> Option<QuickInfo> + Send + Sync + 'static,
    {
        let delegate = Arc::clone(&self.ops.get_quick_info_at_position);
        self.ops.get_quick_info_at_position =
            Arc::new(move |file, offset| wrapper(&delegate, file, offset));
        self.wrapped.push(OperationName::QuickInfoAtPosition);
        self
    }

    /// Operations wrapped so far, in wrapping order.
    pub fn wrapped(&self) -> &[OperationName] {
        &self.wrapped
    }

    pub fn build(self) -> ServiceOps {
        let names: Vec<&str> = self.wrapped.iter().map(OperationName::as_str).collect();
        debug!("Proxying host operations: {}", names.join(", "));
        self.ops
    }
}
