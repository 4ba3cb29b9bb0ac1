//! Store error types.

use thiserror::Error;

/// Store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No transaction is open.
    #[error("no transaction is open")]
    NoTransaction,

    /// A transaction is already open.
    #[error("transaction already open")]
    AlreadyActive,

    /// The named savepoint is not the innermost open level.
    #[error("savepoint not found: {name}")]
    SavepointNotFound { name: String },

    /// Commit requested while savepoints are still open.
    #[error("cannot commit with {open} open savepoint(s)")]
    PendingSavepoints { open: usize },

    /// Failure injected through the `testing` feature.
    #[error("injected failure: {0}")]
    Injected(String),
}

impl StoreError {
    pub fn savepoint_not_found(name: impl Into<String>) -> Self {
        Self::SavepointNotFound { name: name.into() }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
