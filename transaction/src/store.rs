//! The store contract wrapped by the transaction manager.

/// A transactional store with savepoint support.
///
/// `begin`, `commit` and `rollback` act on the outermost transaction only;
/// nested levels are expressed as savepoints. The
/// [`TransactionManager`](crate::TransactionManager) decides which call a
/// given nesting depth needs, so implementations do not track depth
/// themselves.
pub trait TransactionalStore {
    /// Error reported by the store.
    type Error: std::error::Error;

    /// Start the outermost transaction.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Durably commit the outermost transaction.
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Abort the outermost transaction.
    fn rollback(&mut self) -> Result<(), Self::Error>;

    /// Open a named savepoint inside the current transaction.
    fn savepoint(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Fold the named savepoint into its enclosing level.
    fn release_savepoint(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Undo everything since the named savepoint and drop it.
    fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), Self::Error>;
}

impl<S: TransactionalStore + ?Sized> TransactionalStore for &mut S {
    type Error = S::Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        (**self).rollback()
    }

    fn savepoint(&mut self, name: &str) -> Result<(), Self::Error> {
        (**self).savepoint(name)
    }

    fn release_savepoint(&mut self, name: &str) -> Result<(), Self::Error> {
        (**self).release_savepoint(name)
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), Self::Error> {
        (**self).rollback_to_savepoint(name)
    }
}
