//! The in-memory store.

use std::collections::HashMap;
use std::hash::Hash;

use postcommit_transaction::TransactionalStore;

use crate::error::{StoreError, StoreResult};

/// A prior value to put back on rollback.
#[derive(Debug, Clone)]
struct Undo<K, V> {
    key: K,
    previous: Option<V>,
}

/// One open transaction level.
#[derive(Debug, Clone)]
struct Frame<K, V> {
    /// Savepoint name; `None` for the outermost level.
    name: Option<String>,
    undo: Vec<Undo<K, V>>,
}

impl<K, V> Frame<K, V> {
    fn new(name: Option<String>) -> Self {
        Self {
            name,
            undo: Vec::new(),
        }
    }
}

/// Injected failures, consumed by the next matching call.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone, Default)]
struct Faults {
    commit: Option<String>,
    rollback: Option<String>,
}

/// In-memory keyed table with nested transactions.
///
/// Outside a transaction every write is final. Inside one, each write
/// records the value it replaced so the level can be undone.
#[derive(Debug, Clone)]
pub struct MemoryStore<K, V> {
    rows: HashMap<K, V>,
    frames: Vec<Frame<K, V>>,
    #[cfg(any(test, feature = "testing"))]
    faults: Faults,
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            frames: Vec::new(),
            #[cfg(any(test, feature = "testing"))]
            faults: Faults::default(),
        }
    }
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a transaction is open.
    pub fn in_transaction(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Number of open levels; 0 outside a transaction.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    // ========== Rows ==========

    /// Get a row.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.rows.get(key)
    }

    /// Check if a row exists.
    pub fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate all rows.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.rows.iter()
    }

    /// Insert or replace a row, returning the replaced value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.rows.insert(key.clone(), value);
        self.track(key, previous.clone());
        previous
    }

    /// Remove a row, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let previous = self.rows.remove(key)?;
        self.track(key.clone(), Some(previous.clone()));
        Some(previous)
    }

    fn track(&mut self, key: K, previous: Option<V>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.undo.push(Undo { key, previous });
        }
    }

    fn undo(&mut self, frame: Frame<K, V>) {
        for entry in frame.undo.into_iter().rev() {
            match entry.previous {
                Some(value) => {
                    self.rows.insert(entry.key, value);
                }
                None => {
                    self.rows.remove(&entry.key);
                }
            }
        }
    }

    fn top_savepoint(&self, name: &str) -> StoreResult<()> {
        match self.frames.last() {
            None => Err(StoreError::NoTransaction),
            Some(frame) if frame.name.as_deref() == Some(name) => Ok(()),
            Some(_) => Err(StoreError::savepoint_not_found(name)),
        }
    }

    // ========== Fault Injection ==========

    /// Make the next `commit` fail and leave the transaction open.
    #[cfg(any(test, feature = "testing"))]
    pub fn fail_next_commit(&mut self, reason: impl Into<String>) {
        self.faults.commit = Some(reason.into());
    }

    /// Make the next `rollback` report failure. The rows are still
    /// restored, as when a connection drops mid-rollback.
    #[cfg(any(test, feature = "testing"))]
    pub fn fail_next_rollback(&mut self, reason: impl Into<String>) {
        self.faults.rollback = Some(reason.into());
    }

    #[cfg(any(test, feature = "testing"))]
    fn injected_commit_failure(&mut self) -> Option<StoreError> {
        self.faults.commit.take().map(StoreError::Injected)
    }

    #[cfg(not(any(test, feature = "testing")))]
    fn injected_commit_failure(&mut self) -> Option<StoreError> {
        None
    }

    #[cfg(any(test, feature = "testing"))]
    fn injected_rollback_failure(&mut self) -> Option<StoreError> {
        self.faults.rollback.take().map(StoreError::Injected)
    }

    #[cfg(not(any(test, feature = "testing")))]
    fn injected_rollback_failure(&mut self) -> Option<StoreError> {
        None
    }
}

impl<K, V> TransactionalStore for MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    type Error = StoreError;

    fn begin(&mut self) -> StoreResult<()> {
        if self.in_transaction() {
            return Err(StoreError::AlreadyActive);
        }
        self.frames.push(Frame::new(None));
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        match self.frames.len() {
            0 => return Err(StoreError::NoTransaction),
            1 => {}
            n => return Err(StoreError::PendingSavepoints { open: n - 1 }),
        }
        if let Some(err) = self.injected_commit_failure() {
            return Err(err);
        }
        self.frames.clear();
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if !self.in_transaction() {
            return Err(StoreError::NoTransaction);
        }
        while let Some(frame) = self.frames.pop() {
            self.undo(frame);
        }
        match self.injected_rollback_failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn savepoint(&mut self, name: &str) -> StoreResult<()> {
        if !self.in_transaction() {
            return Err(StoreError::NoTransaction);
        }
        self.frames.push(Frame::new(Some(name.to_string())));
        Ok(())
    }

    fn release_savepoint(&mut self, name: &str) -> StoreResult<()> {
        self.top_savepoint(name)?;
        if let Some(frame) = self.frames.pop() {
            if let Some(parent) = self.frames.last_mut() {
                parent.undo.extend(frame.undo);
            }
        }
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> StoreResult<()> {
        self.top_savepoint(name)?;
        if let Some(frame) = self.frames.pop() {
            self.undo(frame);
        }
        Ok(())
    }
}
