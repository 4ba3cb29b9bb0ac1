//! Lifecycle handler dispatch.
//!
//! A dispatch pass drains a [`PendingSet`] and invokes the handlers each
//! entity's type declared for the matching event. Every handler runs in
//! isolation: an error or a panic is reported and the pass moves on to the
//! next handler, the next entity and the next bucket.
//!
//! # Pass order
//!
//! ```text
//! commit:    created   → after_commit_on_create
//!            updated   → after_commit_on_update
//!            destroyed → after_commit_on_destroy
//!            all       → after_commit
//!
//! rollback:  created/updated/destroyed → discarded
//!            all       → after_rollback
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use postcommit_core::{EntityKey, EntityRef, Handler, HandlerError, LifecycleEvent, MutationKind};
use tracing::{debug, warn};

use crate::{DispatchConfig, PendingSet};

// =============================================================================
// Reports
// =============================================================================

/// Which outcome a dispatch pass reacted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPass {
    /// Outermost commit.
    Commit,
    /// Outermost rollback.
    Rollback,
    /// A single entity dispatched at record time.
    Immediate,
}

impl fmt::Display for DispatchPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPass::Commit => f.write_str("commit"),
            DispatchPass::Rollback => f.write_str("rollback"),
            DispatchPass::Immediate => f.write_str("immediate"),
        }
    }
}

/// Why a handler failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The handler returned an error.
    Error(HandlerError),
    /// The handler panicked; holds the panic message.
    Panic(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Error(err) => write!(f, "{}", err),
            FailureCause::Panic(message) => write!(f, "panicked: {}", message),
        }
    }
}

/// One isolated handler failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Event the handler was registered for.
    pub event: LifecycleEvent,
    /// Registered name of the entity's type.
    pub entity_type: String,
    /// Identity of the entity.
    pub entity: EntityKey,
    /// Position of the handler within the event's handler list.
    pub handler_index: usize,
    /// What went wrong.
    pub cause: FailureCause,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} handler #{} for {}{} failed: {}",
            self.event, self.handler_index, self.entity_type, self.entity, self.cause
        )
    }
}

/// Summary of one dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Which outcome the pass reacted to.
    pub pass: DispatchPass,
    /// Entities notified through the generic bucket.
    pub entities: usize,
    /// Handler invocations attempted.
    pub invoked: usize,
    /// Kind-specific entries dropped without notification (rollback only).
    pub discarded: usize,
    /// Failures, in invocation order.
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    fn new(pass: DispatchPass) -> Self {
        Self {
            pass,
            entities: 0,
            invoked: 0,
            discarded: 0,
            failures: Vec::new(),
        }
    }

    /// Check if every handler succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of handlers that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of handlers that succeeded.
    pub fn succeeded(&self) -> usize {
        self.invoked - self.failures.len()
    }
}

/// Receives handler failures as they are isolated.
pub trait DiagnosticsSink: Send + Sync {
    /// Called once per failed handler, before the pass continues.
    fn handler_failed(&self, failure: &HandlerFailure);

    /// Called once at the end of every pass.
    fn pass_completed(&self, _report: &DispatchReport) {}
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Drains pending entities and runs their lifecycle handlers.
#[derive(Clone, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
    sink: Option<Arc<dyn DiagnosticsSink>>,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(config: DispatchConfig) -> Self {
        Self { config, sink: None }
    }

    /// Forward failures to a diagnostics sink as well as the log.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Create an empty pending set matching this dispatcher's configuration.
    pub fn pending_set(&self) -> PendingSet {
        PendingSet::with_dedup(self.config.dedup)
    }

    /// Run the commit pass.
    ///
    /// Call only after the outermost transaction has committed. Every bucket
    /// is emptied before the first handler runs.
    pub fn dispatch_commit(&self, pending: &mut PendingSet) -> DispatchReport {
        let by_kind = MutationKind::ALL.map(|kind| (kind, pending.drain_kind(kind)));
        let all = pending.drain_all();

        let mut report = DispatchReport::new(DispatchPass::Commit);
        report.entities = all.len();

        for (kind, entities) in &by_kind {
            self.fire(kind.after_commit_event(), entities, &mut report);
        }
        self.fire(LifecycleEvent::AfterCommit, &all, &mut report);

        self.finish(report)
    }

    /// Run the rollback pass.
    ///
    /// Kind-specific buckets are discarded; only `after_rollback` fires.
    pub fn dispatch_rollback(&self, pending: &mut PendingSet) -> DispatchReport {
        let discarded: usize = MutationKind::ALL
            .into_iter()
            .map(|kind| pending.drain_kind(kind).len())
            .sum();
        let all = pending.drain_all();

        let mut report = DispatchReport::new(DispatchPass::Rollback);
        report.entities = all.len();
        report.discarded = discarded;

        self.fire(LifecycleEvent::AfterRollback, &all, &mut report);

        self.finish(report)
    }

    /// Fire the after-commit handlers of one entity right away.
    pub fn dispatch_immediate(&self, entity: &EntityRef, kind: MutationKind) -> DispatchReport {
        let entities = std::slice::from_ref(entity);

        let mut report = DispatchReport::new(DispatchPass::Immediate);
        report.entities = 1;

        self.fire(kind.after_commit_event(), entities, &mut report);
        self.fire(LifecycleEvent::AfterCommit, entities, &mut report);

        self.finish(report)
    }

    fn fire(&self, event: LifecycleEvent, entities: &[EntityRef], report: &mut DispatchReport) {
        for entity in entities {
            for (index, handler) in entity.handlers(event).iter().enumerate() {
                report.invoked += 1;

                let Err(cause) = self.invoke(handler, entity) else {
                    continue;
                };

                let failure = HandlerFailure {
                    event,
                    entity_type: entity.type_name().to_string(),
                    entity: entity.key(),
                    handler_index: index,
                    cause,
                };
                warn!(
                    event = %event,
                    entity_type = entity.type_name(),
                    entity = %failure.entity,
                    handler = index,
                    error = %failure.cause,
                    "lifecycle handler failed"
                );
                if let Some(sink) = &self.sink {
                    sink.handler_failed(&failure);
                }
                report.failures.push(failure);
            }
        }
    }

    fn invoke(&self, handler: &Handler, entity: &EntityRef) -> Result<(), FailureCause> {
        if !self.config.catch_panics {
            return handler.call(entity.object()).map_err(FailureCause::Error);
        }

        match panic::catch_unwind(AssertUnwindSafe(|| handler.call(entity.object()))) {
            Ok(result) => result.map_err(FailureCause::Error),
            Err(payload) => Err(FailureCause::Panic(panic_message(payload.as_ref()))),
        }
    }

    fn finish(&self, report: DispatchReport) -> DispatchReport {
        debug!(
            pass = %report.pass,
            entities = report.entities,
            invoked = report.invoked,
            discarded = report.discarded,
            failed = report.failed(),
            "dispatch pass complete"
        );
        if let Some(sink) = &self.sink {
            sink.pass_completed(&report);
        }
        report
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
