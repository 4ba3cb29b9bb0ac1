//! Transaction error types.

use thiserror::Error;

/// Transaction errors.
///
/// `E` is the error type of the wrapped store. Store failures pass through
/// untouched in [`TransactionError::Store`].
#[derive(Debug, Error)]
pub enum TransactionError<E> {
    /// No transaction is active.
    #[error("no transaction is active")]
    NoActiveTransaction,

    /// The wrapped store reported a failure.
    #[error(transparent)]
    Store(E),
}

impl<E> TransactionError<E> {
    /// The store error, if this is one.
    pub fn store_error(&self) -> Option<&E> {
        match self {
            TransactionError::Store(err) => Some(err),
            TransactionError::NoActiveTransaction => None,
        }
    }

    /// Unwrap into the store error, if this is one.
    pub fn into_store_error(self) -> Option<E> {
        match self {
            TransactionError::Store(err) => Some(err),
            TransactionError::NoActiveTransaction => None,
        }
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T, E> = Result<T, TransactionError<E>>;
