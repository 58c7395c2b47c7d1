//! # lintbridge_engine
//!
//! The interface lintbridge consumes from a linter engine.
//!
//! This crate provides:
//! - [`Finding`] and [`Fix`], what the engine reports
//! - [`EffectiveConfig`], what the engine is configured with
//! - [`AnalyzableSource`], what the engine analyzes
//! - [`LintParser`] and [`LintEngine`], the two seams an engine implements
//!
//! ## Features
//!
//! - `test-utils`: a small reference engine (`semi`, `quotes`) for tests

mod config;
mod engine;
mod error;
mod finding;
mod parser;
mod source;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{EffectiveConfig, RuleSetting, RuleSeverity};
pub use engine::{LintEngine, VerifyContext};
pub use error::EngineError;
pub use finding::{Finding, Fix, Severity};
pub use parser::{LintParser, ParseInput, ParseOptions, ParseOutput};
pub use source::{AnalyzableSource, Comment, Scope, ScopeInfo, ScopeKind, Token, TokenKind};
