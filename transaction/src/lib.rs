//! postcommit Transaction
//!
//! Transaction-scoped lifecycle dispatch.
//!
//! Responsibilities:
//! - Accumulate entities mutated inside a transaction (PendingSet)
//! - Track nesting and map inner levels onto store savepoints
//! - Fire after-commit handlers once the outermost transaction commits
//! - Fire after-rollback handlers when it rolls back instead
//! - Isolate and report handler failures without disturbing the caller

mod config;
mod dispatch;
mod error;
mod manager;
mod pending;
mod store;

pub use config::{DispatchConfig, DispatchMode};
pub use dispatch::{
    DiagnosticsSink, DispatchPass, DispatchReport, Dispatcher, FailureCause, HandlerFailure,
};
pub use error::{TransactionError, TransactionResult};
pub use manager::{TransactionManager, TransactionState};
pub use pending::{PendingMark, PendingSet};
pub use store::TransactionalStore;
