//! Transaction manager that wraps a store with lifecycle dispatch.

use postcommit_core::{EntityRef, MutationKind};
use tracing::{debug, trace, warn};

use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::{TransactionError, TransactionResult};
use crate::pending::{PendingMark, PendingSet};
use crate::store::TransactionalStore;

/// Transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction is active.
    Inactive,
    /// Transaction is active.
    Active,
    /// Transaction is being committed.
    Committing,
    /// Transaction is being rolled back.
    RollingBack,
}

/// A nested level, backed by a store savepoint.
#[derive(Debug, Clone)]
struct Savepoint {
    name: String,
    mark: PendingMark,
}

/// Resets the state once a dispatch pass ends, even by unwinding.
struct ResetState<'a>(&'a mut TransactionState);

impl Drop for ResetState<'_> {
    fn drop(&mut self) {
        *self.0 = TransactionState::Inactive;
    }
}

/// Decorates a [`TransactionalStore`] with after-commit and after-rollback
/// dispatch.
///
/// The manager owns the pending set of exactly one transaction context.
/// Give every connection, worker or thread its own manager; nothing is
/// shared between managers, so concurrent transactions never see each
/// other's entities.
///
/// Nesting is tracked here. The first `begin` starts the store transaction;
/// every further `begin` opens a savepoint. Only the commit or rollback that
/// closes the outermost level runs a dispatch pass.
#[derive(Debug)]
pub struct TransactionManager<S> {
    store: S,
    dispatcher: Dispatcher,
    pending: PendingSet,
    state: TransactionState,
    savepoints: Vec<Savepoint>,
}

impl<S: TransactionalStore> TransactionManager<S> {
    /// Create a manager with the default dispatcher.
    pub fn new(store: S) -> Self {
        Self::with_dispatcher(store, Dispatcher::default())
    }

    /// Create a manager with a configured dispatcher.
    pub fn with_dispatcher(store: S, dispatcher: Dispatcher) -> Self {
        Self {
            store,
            pending: dispatcher.pending_set(),
            dispatcher,
            state: TransactionState::Inactive,
            savepoints: Vec::new(),
        }
    }

    /// Check if a transaction is active.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Get the current transaction state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Current nesting depth; 0 outside a transaction.
    pub fn depth(&self) -> usize {
        match self.state {
            TransactionState::Inactive => 0,
            _ => 1 + self.savepoints.len(),
        }
    }

    /// Entities awaiting dispatch.
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Get the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Get the wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the wrapped store mutably, for the mutations themselves.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Unwrap the store.
    pub fn into_store(self) -> S {
        self.store
    }

    // ========== Transaction Lifecycle ==========

    /// Begin a transaction, or a nested level if one is already active.
    pub fn begin(&mut self) -> TransactionResult<(), S::Error> {
        if self.state == TransactionState::Inactive {
            self.store.begin().map_err(TransactionError::Store)?;
            self.state = TransactionState::Active;
            debug!("transaction begun");
            return Ok(());
        }

        let name = format!("postcommit_sp_{}", self.savepoints.len() + 1);
        self.store
            .savepoint(&name)
            .map_err(TransactionError::Store)?;
        self.savepoints.push(Savepoint {
            name,
            mark: self.pending.mark(),
        });
        debug!(depth = self.depth(), "savepoint opened");

        Ok(())
    }

    /// Commit the innermost level.
    ///
    /// A nested commit releases its savepoint and returns `None`. The
    /// outermost commit delegates to the store and, once the store reports
    /// success, runs the commit pass and returns its report.
    ///
    /// If the store commit fails, its error is returned unchanged, nothing
    /// is dispatched, and the transaction stays active with its pending
    /// entities so it can be retried or rolled back.
    pub fn commit(&mut self) -> TransactionResult<Option<DispatchReport>, S::Error> {
        self.ensure_active()?;

        if let Some(savepoint) = self.savepoints.last() {
            self.store
                .release_savepoint(&savepoint.name)
                .map_err(TransactionError::Store)?;
            self.savepoints.pop();
            debug!(depth = self.depth(), "savepoint released");
            return Ok(None);
        }

        self.state = TransactionState::Committing;
        if let Err(err) = self.store.commit() {
            self.state = TransactionState::Active;
            debug!(
                pending = self.pending.len(),
                "store commit failed; pending entities kept"
            );
            return Err(TransactionError::Store(err));
        }
        debug!(pending = self.pending.len(), "transaction committed");

        Ok(Some(self.run_pass(Dispatcher::dispatch_commit)))
    }

    /// Roll back the innermost level.
    ///
    /// A nested rollback restores the store to the savepoint, forgets the
    /// entities recorded since, and returns `None`. The outermost rollback
    /// delegates to the store and then always runs the rollback pass; a
    /// store failure is returned after the pass.
    ///
    /// Entities recorded only inside a rolled-back savepoint are forgotten:
    /// they receive neither `after_rollback` nor `after_commit` later.
    pub fn rollback(&mut self) -> TransactionResult<Option<DispatchReport>, S::Error> {
        self.ensure_active()?;

        if let Some(savepoint) = self.savepoints.last() {
            self.store
                .rollback_to_savepoint(&savepoint.name)
                .map_err(TransactionError::Store)?;
            let mark = savepoint.mark;
            self.savepoints.pop();
            self.pending.truncate_to(mark);
            debug!(depth = self.depth(), "rolled back to savepoint");
            return Ok(None);
        }

        self.state = TransactionState::RollingBack;
        let store_result = self.store.rollback();
        match &store_result {
            Err(err) => warn!(error = %err, "store rollback failed; dispatching rollback handlers anyway"),
            Ok(()) => debug!(pending = self.pending.len(), "transaction rolled back"),
        }

        let report = self.run_pass(Dispatcher::dispatch_rollback);
        store_result.map_err(TransactionError::Store)?;

        Ok(Some(report))
    }

    /// Run `f` inside a transaction level.
    ///
    /// Commits when `f` succeeds, rolls back when `f` or the commit fails,
    /// and returns the first error.
    pub fn transaction<T, F>(&mut self, f: F) -> TransactionResult<T, S::Error>
    where
        F: FnOnce(&mut Self) -> TransactionResult<T, S::Error>,
    {
        self.begin()?;
        let depth = self.depth();

        let result = f(self).and_then(|value| self.commit().map(|_| value));
        if result.is_err() && self.depth() == depth {
            if let Err(err) = self.rollback() {
                warn!(depth, error = %err, "rollback after failed transaction body failed");
            }
        }

        result
    }

    // ========== Recording ==========

    /// Record that `entity` was mutated in the current transaction.
    ///
    /// In immediate mode the entity's after-commit handlers fire right away
    /// and no transaction is required.
    pub fn record(&mut self, entity: &EntityRef, kind: MutationKind) -> TransactionResult<(), S::Error> {
        if self.dispatcher.config().is_immediate() {
            self.dispatcher.dispatch_immediate(entity, kind);
            return Ok(());
        }

        self.ensure_active()?;
        trace!(entity = %entity, kind = %kind, "entity recorded");
        self.pending.record(entity, kind);

        Ok(())
    }

    pub fn record_create(&mut self, entity: &EntityRef) -> TransactionResult<(), S::Error> {
        self.record(entity, MutationKind::Create)
    }

    pub fn record_update(&mut self, entity: &EntityRef) -> TransactionResult<(), S::Error> {
        self.record(entity, MutationKind::Update)
    }

    pub fn record_destroy(&mut self, entity: &EntityRef) -> TransactionResult<(), S::Error> {
        self.record(entity, MutationKind::Destroy)
    }

    // ========== Internal Helpers ==========

    fn ensure_active(&self) -> TransactionResult<(), S::Error> {
        if self.state != TransactionState::Active {
            return Err(TransactionError::NoActiveTransaction);
        }
        Ok(())
    }

    fn run_pass(&mut self, pass: fn(&Dispatcher, &mut PendingSet) -> DispatchReport) -> DispatchReport {
        self.savepoints.clear();
        let Self {
            dispatcher,
            pending,
            state,
            ..
        } = self;
        let _reset = ResetState(state);
        pass(dispatcher, pending)
    }
}
