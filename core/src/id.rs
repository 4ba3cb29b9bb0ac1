//! Identity types for postcommit entities.
//!
//! Identifiers are:
//! - Unique within their namespace
//! - Immutable once assigned
//! - Opaque to external users

use std::fmt;

/// Identifier for an entity type in the callback registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityTypeId(pub u32);

impl EntityTypeId {
    /// Create a new EntityTypeId from a raw value.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Identity token of a mutated entity.
///
/// Derived from the address of the shared allocation behind an
/// [`EntityRef`](crate::EntityRef), so two handles compare equal only when
/// they point at the same object, never by value. A key is only meaningful
/// while some handle keeps the allocation alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(usize);

impl EntityKey {
    pub(crate) fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw value.
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{:x}", self.0)
    }
}
