//! Pending set for tracking entities awaiting notification.

use std::collections::HashSet;
use std::mem;

use postcommit_core::{EntityKey, EntityRef, MutationKind};

/// One ordered bucket of pending entities.
#[derive(Debug, Clone, Default)]
struct Bucket {
    entries: Vec<EntityRef>,
    seen: HashSet<EntityKey>,
}

impl Bucket {
    fn push(&mut self, entity: &EntityRef, dedup: bool) {
        let fresh = self.seen.insert(entity.key());
        if fresh || !dedup {
            self.entries.push(entity.clone());
        }
    }

    fn contains(&self, entity: &EntityRef) -> bool {
        self.seen.contains(&entity.key())
    }

    fn drain(&mut self) -> Vec<EntityRef> {
        self.seen.clear();
        mem::take(&mut self.entries)
    }

    fn truncate(&mut self, len: usize) {
        if len >= self.entries.len() {
            return;
        }
        self.entries.truncate(len);
        self.seen = self.entries.iter().map(EntityRef::key).collect();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Bucket lengths captured at a savepoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingMark {
    all: usize,
    created: usize,
    updated: usize,
    destroyed: usize,
}

/// Entities mutated in the current transaction, bucketed by mutation kind.
///
/// `all` holds every recorded entity; `created`, `updated` and `destroyed`
/// hold the entities recorded with that kind. Buckets drain independently.
#[derive(Debug, Clone)]
pub struct PendingSet {
    all: Bucket,
    created: Bucket,
    updated: Bucket,
    destroyed: Bucket,
    dedup: bool,
}

impl Default for PendingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingSet {
    /// Create an empty set that records each entity at most once per bucket.
    pub fn new() -> Self {
        Self::with_dedup(true)
    }

    /// Create an empty set, choosing whether repeats are collapsed.
    pub fn with_dedup(dedup: bool) -> Self {
        Self {
            all: Bucket::default(),
            created: Bucket::default(),
            updated: Bucket::default(),
            destroyed: Bucket::default(),
            dedup,
        }
    }

    fn bucket(&self, kind: MutationKind) -> &Bucket {
        match kind {
            MutationKind::Create => &self.created,
            MutationKind::Update => &self.updated,
            MutationKind::Destroy => &self.destroyed,
        }
    }

    fn bucket_mut(&mut self, kind: MutationKind) -> &mut Bucket {
        match kind {
            MutationKind::Create => &mut self.created,
            MutationKind::Update => &mut self.updated,
            MutationKind::Destroy => &mut self.destroyed,
        }
    }

    /// Record a mutation: the entity joins `all` and the bucket for `kind`.
    pub fn record(&mut self, entity: &EntityRef, kind: MutationKind) {
        let dedup = self.dedup;
        self.all.push(entity, dedup);
        self.bucket_mut(kind).push(entity, dedup);
    }

    /// Take every entity from `all`, leaving it empty.
    pub fn drain_all(&mut self) -> Vec<EntityRef> {
        self.all.drain()
    }

    /// Take every entity from the bucket for `kind`, leaving it empty.
    pub fn drain_kind(&mut self, kind: MutationKind) -> Vec<EntityRef> {
        self.bucket_mut(kind).drain()
    }

    /// Empty all four buckets.
    pub fn clear(&mut self) {
        self.all.drain();
        for kind in MutationKind::ALL {
            self.bucket_mut(kind).drain();
        }
    }

    /// Entities in `all`, in insertion order.
    pub fn entities(&self) -> &[EntityRef] {
        &self.all.entries
    }

    /// Entities in the bucket for `kind`, in insertion order.
    pub fn entities_of(&self, kind: MutationKind) -> &[EntityRef] {
        &self.bucket(kind).entries
    }

    /// Check if the entity is pending in `all`.
    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.all.contains(entity)
    }

    /// Check if the entity is pending in the bucket for `kind`.
    pub fn contains_kind(&self, entity: &EntityRef, kind: MutationKind) -> bool {
        self.bucket(kind).contains(entity)
    }

    /// Number of entries in `all`.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Number of entries in the bucket for `kind`.
    pub fn len_kind(&self, kind: MutationKind) -> usize {
        self.bucket(kind).len()
    }

    /// Check if all four buckets are empty.
    pub fn is_empty(&self) -> bool {
        self.all.len() == 0 && MutationKind::ALL.iter().all(|k| self.len_kind(*k) == 0)
    }

    /// Capture the current bucket lengths.
    pub fn mark(&self) -> PendingMark {
        PendingMark {
            all: self.all.len(),
            created: self.created.len(),
            updated: self.updated.len(),
            destroyed: self.destroyed.len(),
        }
    }

    /// Discard everything recorded after `mark` was taken.
    pub fn truncate_to(&mut self, mark: PendingMark) {
        self.all.truncate(mark.all);
        self.created.truncate(mark.created);
        self.updated.truncate(mark.updated);
        self.destroyed.truncate(mark.destroyed);
    }
}
