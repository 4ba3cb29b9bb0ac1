//! Mutation kinds and lifecycle event names.

use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Classification of a data change, recorded when the change is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MutationKind {
    Create,
    Update,
    Destroy,
}

impl MutationKind {
    /// All kinds, in dispatch order.
    pub const ALL: [MutationKind; 3] = [
        MutationKind::Create,
        MutationKind::Update,
        MutationKind::Destroy,
    ];

    /// The snake_case name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Destroy => "destroy",
        }
    }

    /// The after-commit event fired for entities mutated by this kind.
    pub fn after_commit_event(&self) -> LifecycleEvent {
        match self {
            MutationKind::Create => LifecycleEvent::AfterCommitOnCreate,
            MutationKind::Update => LifecycleEvent::AfterCommitOnUpdate,
            MutationKind::Destroy => LifecycleEvent::AfterCommitOnDestroy,
        }
    }

    /// The before-commit event declared for this kind.
    pub fn before_commit_event(&self) -> LifecycleEvent {
        match self {
            MutationKind::Create => LifecycleEvent::BeforeCommitOnCreate,
            MutationKind::Update => LifecycleEvent::BeforeCommitOnUpdate,
            MutationKind::Destroy => LifecycleEvent::BeforeCommitOnDestroy,
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MutationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        MutationKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CoreError::UnknownMutationKind(s.to_string()))
    }
}

/// A lifecycle event an entity type may declare handlers for.
///
/// Only the `AfterCommit*` events and `AfterRollback` are fired by the
/// dispatcher. The `Before*` events can be declared and inspected, but
/// nothing invokes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleEvent {
    BeforeCommit,
    BeforeCommitOnCreate,
    BeforeCommitOnUpdate,
    BeforeCommitOnDestroy,
    AfterCommit,
    AfterCommitOnCreate,
    AfterCommitOnUpdate,
    AfterCommitOnDestroy,
    BeforeRollback,
    AfterRollback,
}

impl LifecycleEvent {
    /// Number of distinct events.
    pub const COUNT: usize = 10;

    /// All events, in declaration order.
    pub const ALL: [LifecycleEvent; LifecycleEvent::COUNT] = [
        LifecycleEvent::BeforeCommit,
        LifecycleEvent::BeforeCommitOnCreate,
        LifecycleEvent::BeforeCommitOnUpdate,
        LifecycleEvent::BeforeCommitOnDestroy,
        LifecycleEvent::AfterCommit,
        LifecycleEvent::AfterCommitOnCreate,
        LifecycleEvent::AfterCommitOnUpdate,
        LifecycleEvent::AfterCommitOnDestroy,
        LifecycleEvent::BeforeRollback,
        LifecycleEvent::AfterRollback,
    ];

    /// Dense index of this event, stable across releases.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The snake_case name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::BeforeCommit => "before_commit",
            LifecycleEvent::BeforeCommitOnCreate => "before_commit_on_create",
            LifecycleEvent::BeforeCommitOnUpdate => "before_commit_on_update",
            LifecycleEvent::BeforeCommitOnDestroy => "before_commit_on_destroy",
            LifecycleEvent::AfterCommit => "after_commit",
            LifecycleEvent::AfterCommitOnCreate => "after_commit_on_create",
            LifecycleEvent::AfterCommitOnUpdate => "after_commit_on_update",
            LifecycleEvent::AfterCommitOnDestroy => "after_commit_on_destroy",
            LifecycleEvent::BeforeRollback => "before_rollback",
            LifecycleEvent::AfterRollback => "after_rollback",
        }
    }

    /// Whether the dispatcher ever invokes handlers for this event.
    pub fn is_dispatched(&self) -> bool {
        matches!(
            self,
            LifecycleEvent::AfterCommit
                | LifecycleEvent::AfterCommitOnCreate
                | LifecycleEvent::AfterCommitOnUpdate
                | LifecycleEvent::AfterCommitOnDestroy
                | LifecycleEvent::AfterRollback
        )
    }

    /// The mutation kind this event is specific to, if any.
    pub fn mutation_kind(&self) -> Option<MutationKind> {
        match self {
            LifecycleEvent::BeforeCommitOnCreate | LifecycleEvent::AfterCommitOnCreate => {
                Some(MutationKind::Create)
            }
            LifecycleEvent::BeforeCommitOnUpdate | LifecycleEvent::AfterCommitOnUpdate => {
                Some(MutationKind::Update)
            }
            LifecycleEvent::BeforeCommitOnDestroy | LifecycleEvent::AfterCommitOnDestroy => {
                Some(MutationKind::Destroy)
            }
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LifecycleEvent {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        LifecycleEvent::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| CoreError::UnknownEvent(s.to_string()))
    }
}
