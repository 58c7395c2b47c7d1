//! The linter's verify entry point and rule registry.

use std::path::Path;

use crate::{AnalyzableSource, EffectiveConfig, EngineError, Finding};

/// Per-call context for [`LintEngine::verify`].
#[derive(Debug, Clone, Copy)]
pub struct VerifyContext<'a> {
    /// File name reported to rules.
    pub filename: &'a Path,
}

/// A linter engine.
pub trait LintEngine: Send + Sync {
    /// Runs every enabled rule of `config` against `source`.
    fn verify(
        &self,
        source: &AnalyzableSource<'_>,
        config: &EffectiveConfig,
        context: &VerifyContext<'_>,
    ) -> Result<Vec<Finding>, EngineError>;

    /// Returns true if the rule registry knows `rule_id`.
    fn has_rule(&self, rule_id: &str) -> bool;
}
