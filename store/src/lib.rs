//! postcommit Store
//!
//! In-memory keyed table with nested transactions, implementing
//! [`TransactionalStore`](postcommit_transaction::TransactionalStore).
//!
//! Writes are applied in place and tracked in an undo log per transaction
//! level, so reads always see the transaction's own writes.

mod error;
mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
