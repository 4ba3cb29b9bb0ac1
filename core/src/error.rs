//! Common error types for postcommit.

use thiserror::Error;

/// Errors raised while interpreting core vocabulary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Lifecycle event name not recognized.
    #[error("Unknown lifecycle event: {0}")]
    UnknownEvent(String),

    /// Mutation kind name not recognized.
    #[error("Unknown mutation kind: {0}")]
    UnknownMutationKind(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Failure reported by a lifecycle handler.
///
/// Handlers return this instead of propagating their own error types; the
/// dispatcher only needs a message to log and report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler ran and reported a failure.
    #[error("{message}")]
    Failed { message: String },

    /// The handler was registered for a different entity type than the one
    /// it was invoked with.
    #[error("handler expects entity of type {expected}")]
    TypeMismatch { expected: String },
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn type_mismatch(expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::failed(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::failed(message)
    }
}

/// Result type returned by lifecycle handlers.
pub type HandlerResult = Result<(), HandlerError>;
