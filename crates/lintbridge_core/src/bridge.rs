//! The bridge orchestrator.
//!
//! Each entry point first asks the delegate for the host's own result, then
//! tries to compute extra items. The attempt produces an [`Augmentation`];
//! whatever it is, the caller receives the original items unchanged,
//! followed by the extra ones if there are any.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use lintbridge_ast::{AstArena, LineIndex, Span};
use lintbridge_engine::{EffectiveConfig, Finding, LintEngine, VerifyContext};
use lintbridge_host::{
    CodeFixAction, CodeFixRequest, HostDiagnostic, HostProject, SourceDocument,
};
use tracing::{debug, error, warn};

use crate::code_fix::translate_code_fixes;
use crate::config_resolver::ConfigResolver;
use crate::diagnostics::{LINT_DIAGNOSTIC_CODE, translate_diagnostics};
use crate::path_filter::PathFilter;
use crate::source_adapter::SourceAdapter;
use crate::BridgeError;

/// Why a request was not augmented.
#[derive(Debug)]
pub enum SkipReason {
    /// The host has no source for the file.
    SourceUnavailable,
    /// The file is excluded from linting.
    Ignored,
    /// The code-fix request did not ask for linter codes.
    NotRequested,
    /// Augmentation failed.
    Failed(BridgeError),
}

/// Outcome of one augmentation attempt.
#[derive(Debug)]
pub enum Augmentation<T> {
    /// Items to append after the host's own.
    Augmented(Vec<T>),
    Unaugmented(SkipReason),
}

impl<T> Augmentation<T> {
    /// Appends the augmented items, if any, after `original`.
    pub fn merge_into(self, mut original: Vec<T>) -> Vec<T> {
        if let Augmentation::Augmented(extra) = self {
            original.extend(extra);
        }
        original
    }
}

/// Connects a host project, a config resolver, a path filter, a parser and
/// an engine.
pub struct Bridge {
    project: Arc<dyn HostProject>,
    configs: Arc<ConfigResolver>,
    filter: Arc<PathFilter>,
    adapter: SourceAdapter,
    engine: Arc<dyn LintEngine>,
    expected_parser: String,
}

impl Bridge {
    pub fn new(
        project: Arc<dyn HostProject>,
        configs: Arc<ConfigResolver>,
        filter: Arc<PathFilter>,
        adapter: SourceAdapter,
        engine: Arc<dyn LintEngine>,
        expected_parser: impl Into<String>,
    ) -> Self {
        Self {
            project,
            configs,
            filter,
            adapter,
            engine,
            expected_parser: expected_parser.into(),
        }
    }

    pub fn configs(&self) -> &ConfigResolver {
        &self.configs
    }

    pub fn path_filter(&self) -> &PathFilter {
        &self.filter
    }

    /// The host's diagnostics for `file`, followed by the linter's.
    pub fn semantic_diagnostics(
        &self,
        delegate: &dyn Fn(&Path) -> Vec<HostDiagnostic>,
        file: &Path,
    ) -> Vec<HostDiagnostic> {
        let original = delegate(file);
        self.augment_diagnostics(file).merge_into(original)
    }

    /// The host's fixes for `request`, followed by the linter's.
    pub fn code_fixes_at_position(
        &self,
        delegate: &dyn Fn(&CodeFixRequest) -> Vec<CodeFixAction>,
        request: &CodeFixRequest,
    ) -> Vec<CodeFixAction> {
        let original = delegate(request);
        self.augment_code_fixes(request).merge_into(original)
    }

    /// Computes the linter diagnostics for `file`.
    pub fn augment_diagnostics(&self, file: &Path) -> Augmentation<HostDiagnostic> {
        self.augment(file, |findings, index| {
            translate_diagnostics(findings, file, index)
        })
    }

    /// Computes the linter fixes for `request`.
    pub fn augment_code_fixes(&self, request: &CodeFixRequest) -> Augmentation<CodeFixAction> {
        if !request.error_codes.contains(&LINT_DIAGNOSTIC_CODE) {
            return Augmentation::Unaugmented(SkipReason::NotRequested);
        }

        let requested = Span::new(request.start, request.end);
        self.augment(&request.file, |findings, index| {
            translate_code_fixes(findings, &request.file, index, requested)
        })
    }

    fn augment<T>(
        &self,
        file: &Path,
        translate: impl FnOnce(&[Finding], &LineIndex<'_>) -> Vec<T>,
    ) -> Augmentation<T> {
        let Some(document) = self.project.source_file(file) else {
            debug!("No source for {}, skipping lint", file.display());
            return Augmentation::Unaugmented(SkipReason::SourceUnavailable);
        };

        if self.filter.is_ignored(file) || self.configs.is_ignored_by_config(file) {
            debug!("{} is ignored, skipping lint", file.display());
            return Augmentation::Unaugmented(SkipReason::Ignored);
        }

        match self.lint(&document, translate) {
            Ok(items) => Augmentation::Augmented(items),
            Err(err) => {
                log_failure(file, &err);
                Augmentation::Unaugmented(SkipReason::Failed(err))
            }
        }
    }

    /// Runs one lint pass. A panic anywhere in the pass, whether in the
    /// parser, the engine or translation, becomes [`BridgeError::EnginePanic`].
    fn lint<T>(
        &self,
        document: &SourceDocument,
        translate: impl FnOnce(&[Finding], &LineIndex<'_>) -> Vec<T>,
    ) -> Result<Vec<T>, BridgeError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.lint_unguarded(document, translate)))
            .map_err(|payload| BridgeError::EnginePanic(panic_message(payload.as_ref())))?
    }

    fn lint_unguarded<T>(
        &self,
        document: &SourceDocument,
        translate: impl FnOnce(&[Finding], &LineIndex<'_>) -> Vec<T>,
    ) -> Result<Vec<T>, BridgeError> {
        let config = self.configs.resolve_for_file(&document.path);
        self.check_parser(&config)?;

        let arena = AstArena::new();
        let source = self
            .adapter
            .convert(&arena, document, &config.parser_options)?;

        for (rule_id, _) in config.enabled_rules() {
            if !self.engine.has_rule(rule_id) {
                debug!("Rule '{}' is not known to the engine", rule_id);
            }
        }

        let context = VerifyContext {
            filename: &document.path,
        };
        let findings = self.engine.verify(&source, &config, &context)?;

        debug!(
            "{} finding(s) for {}",
            findings.len(),
            document.path.display()
        );
        Ok(translate(&findings, &source.line_index))
    }

    fn check_parser(&self, config: &EffectiveConfig) -> Result<(), BridgeError> {
        match config.parser.as_deref() {
            Some(parser) if parser == self.expected_parser => Ok(()),
            found => Err(BridgeError::invalid_parser(&self.expected_parser, found)),
        }
    }
}

fn log_failure(file: &Path, err: &BridgeError) {
    match err {
        BridgeError::InvalidParser { .. } => {
            debug!("Not linting {}: {}", file.display(), err);
        }
        BridgeError::Conversion(_) | BridgeError::ConfigResolution(_) => {
            warn!("Not linting {}: {}", file.display(), err);
        }
        _ => {
            error!("Lint failed for {}: {}", file.display(), err);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_resolver::ConfigResolverOptions;
    use crate::path_filter::{DeferredMode, PathFilterOptions};
    use lintbridge_engine::LintParser;
    use lintbridge_engine::test_utils::{
        FailingEngine, MINI_PARSER_NAME, MiniEngine, MiniParser, PanickingParser,
    };
    use lintbridge_host::test_utils::{MemoryHost, MemoryProject};
    use lintbridge_host::{ConfigHost, DiagnosticCategory};
    use pretty_assertions::assert_eq;

    const SEMI_CONFIG: &str = r#"{ "parser": "@lintbridge/parser", "rules": { "semi": "error" } }"#;

    fn bridge_with(config: &str, text: &str, engine: Arc<dyn LintEngine>) -> Bridge {
        bridge_with_parser(config, text, Arc::new(MiniParser::new()), engine)
    }

    fn bridge_with_parser(
        config: &str,
        text: &str,
        parser: Arc<dyn LintParser>,
        engine: Arc<dyn LintEngine>,
    ) -> Bridge {
        let host: Arc<dyn ConfigHost> =
            Arc::new(MemoryHost::new().with_file("/p/.lintrc.json", config));
        let project = MemoryProject::new().with_document(SourceDocument::new("/p/a.js", text));
        Bridge::new(
            Arc::new(project),
            Arc::new(ConfigResolver::new(host, ConfigResolverOptions::default())),
            Arc::new(PathFilter::new(PathFilterOptions {
                mode: DeferredMode::Manual,
                ..Default::default()
            })),
            SourceAdapter::new(parser),
            engine,
            MINI_PARSER_NAME,
        )
    }

    fn host_diagnostic() -> HostDiagnostic {
        HostDiagnostic {
            file: Some("/p/a.js".into()),
            start: 6,
            length: 1,
            category: DiagnosticCategory::Error,
            code: 2304,
            message: "Cannot find name 'x'.".to_string(),
        }
    }

    #[test]
    fn test_merge_into_keeps_original_first() {
        let merged = Augmentation::Augmented(vec![3, 4]).merge_into(vec![1, 2]);
        assert_eq!(merged, vec![1, 2, 3, 4]);

        let skipped: Augmentation<i32> = Augmentation::Unaugmented(SkipReason::Ignored);
        assert_eq!(skipped.merge_into(vec![1, 2]), vec![1, 2]);
    }

    #[test]
    fn test_diagnostics_appended_after_original() {
        let bridge = bridge_with(SEMI_CONFIG, "const x = 1", Arc::new(MiniEngine::new()));
        let result = bridge.semantic_diagnostics(&|_| vec![host_diagnostic()], Path::new("/p/a.js"));

        assert_eq!(result.len(), 2);
        assert_eq!(result[0], host_diagnostic());
        assert_eq!(result[1].code, LINT_DIAGNOSTIC_CODE);
        assert_eq!(result[1].message, "[semi] Missing semicolon.");
        assert_eq!(result[1].start, 11);
    }

    #[test]
    fn test_missing_source_is_unaugmented() {
        let bridge = bridge_with(SEMI_CONFIG, "const x = 1", Arc::new(MiniEngine::new()));
        let outcome = bridge.augment_diagnostics(Path::new("/p/missing.js"));
        assert!(matches!(outcome, Augmentation::Unaugmented(SkipReason::SourceUnavailable)));
    }

    #[test]
    fn test_wrong_parser_is_unaugmented() {
        let bridge = bridge_with(
            r#"{ "parser": "babel", "rules": { "semi": "error" } }"#,
            "const x = 1",
            Arc::new(MiniEngine::new()),
        );
        match bridge.augment_diagnostics(Path::new("/p/a.js")) {
            Augmentation::Unaugmented(SkipReason::Failed(err)) => assert!(err.is_invalid_parser()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_engine_error_is_unaugmented() {
        let bridge = bridge_with(SEMI_CONFIG, "const x = 1", Arc::new(FailingEngine));
        let outcome = bridge.augment_diagnostics(Path::new("/p/a.js"));
        assert!(matches!(
            outcome,
            Augmentation::Unaugmented(SkipReason::Failed(BridgeError::Engine(_)))
        ));
    }

    #[test]
    fn test_parser_panic_is_unaugmented() {
        let bridge = bridge_with_parser(
            SEMI_CONFIG,
            "const x = 1",
            Arc::new(PanickingParser),
            Arc::new(MiniEngine::new()),
        );
        match bridge.augment_diagnostics(Path::new("/p/a.js")) {
            Augmentation::Unaugmented(SkipReason::Failed(BridgeError::EnginePanic(message))) => {
                assert_eq!(message, "parser blew up");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_conversion_error_is_unaugmented() {
        let bridge = bridge_with(SEMI_CONFIG, "let s = 'open", Arc::new(MiniEngine::new()));
        let result = bridge.semantic_diagnostics(&|_| vec![host_diagnostic()], Path::new("/p/a.js"));
        assert_eq!(result, vec![host_diagnostic()]);
    }

    #[test]
    fn test_code_fixes_require_lint_code() {
        let engine = Arc::new(MiniEngine::new());
        let bridge = bridge_with(SEMI_CONFIG, "const x = 1", Arc::clone(&engine) as Arc<dyn LintEngine>);
        let request = CodeFixRequest {
            file: "/p/a.js".into(),
            start: 0,
            end: 11,
            error_codes: vec![2304],
        };

        let outcome = bridge.augment_code_fixes(&request);
        assert!(matches!(outcome, Augmentation::Unaugmented(SkipReason::NotRequested)));
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn test_code_fixes_for_lint_code() {
        let bridge = bridge_with(SEMI_CONFIG, "const x = 1", Arc::new(MiniEngine::new()));
        let request = CodeFixRequest {
            file: "/p/a.js".into(),
            start: 0,
            end: 11,
            error_codes: vec![LINT_DIAGNOSTIC_CODE],
        };

        let fixes = bridge.code_fixes_at_position(&|_| Vec::new(), &request);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].fix_name, "semi");
        assert_eq!(fixes[0].apply_to("const x = 1"), "const x = 1;");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
