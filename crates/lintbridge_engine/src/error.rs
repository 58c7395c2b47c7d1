//! Engine error types.

use thiserror::Error;

/// Errors raised by the linter engine or its parser.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source could not be parsed into the engine's tree shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Error message.
        message: String,
        /// Byte offset where the error occurred.
        offset: Option<u32>,
    },

    /// The configuration handed to the engine is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A rule failed while running.
    #[error("Rule '{rule_id}' failed: {message}")]
    Rule {
        /// The failing rule.
        rule_id: String,
        /// Error message.
        message: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal engine error.
    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            offset: None,
        }
    }

    /// Creates a parse error at a byte offset.
    pub fn parse_at(message: impl Into<String>, offset: u32) -> Self {
        Self::Parse {
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Creates a rule error.
    pub fn rule(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rule {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
