//! Error types for the registry store and lock manager.

use thiserror::Error;

/// Result type alias for registry operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while locking, reading or writing the registry.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("registry lock error: {0}")]
    Lock(String),

    #[error("failed to prepare directory: {0}")]
    Directory(String),

    #[error("read registry: {0}")]
    Read(String),

    #[error("parse registry json: {0}")]
    Parse(String),

    #[error("serialize registry: {0}")]
    Serialize(String),

    #[error("write temp registry: {0}")]
    Write(String),

    #[error("replace registry atomically: {0}")]
    Replace(String),
}

impl StateError {
    /// Whether this error came from the mutual-exclusion primitive rather
    /// than from the registry document itself.
    pub fn is_lock(&self) -> bool {
        matches!(self, Self::Lock(_))
    }
}
