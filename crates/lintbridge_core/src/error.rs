//! Bridge error types.

use lintbridge_engine::EngineError;
use thiserror::Error;

/// Errors that can occur while augmenting a host request.
///
/// None of these ever reach the host's caller; the orchestrator turns every
/// one of them into an unaugmented result.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The source could not be turned into an analyzable representation.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// The resolved config does not declare the expected parser.
    #[error("Invalid parser: expected '{expected}', found {found}")]
    InvalidParser { expected: String, found: String },

    /// A config file was unreadable, malformed, or formed an extends cycle.
    #[error("Config resolution error: {0}")]
    ConfigResolution(String),

    /// The engine reported an error.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// The engine panicked.
    #[error("Engine panicked: {0}")]
    EnginePanic(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Creates a conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    /// Creates a config resolution error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigResolution(message.into())
    }

    /// Creates an invalid parser error. `found` is `None` when the config
    /// names no parser at all.
    pub fn invalid_parser(expected: impl Into<String>, found: Option<&str>) -> Self {
        Self::InvalidParser {
            expected: expected.into(),
            found: found.map_or_else(|| "none".to_string(), |p| format!("'{p}'")),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true for the expected, silent outcome of a file that does not
    /// opt into linting.
    pub fn is_invalid_parser(&self) -> bool {
        matches!(self, Self::InvalidParser { .. })
    }
}
