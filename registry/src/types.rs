//! Registered entity type definitions.

use std::any::TypeId as RustTypeId;
use std::sync::Arc;

use postcommit_core::{CallbackSet, EntityTypeId};

/// An entity type with its resolved handler set.
#[derive(Debug, Clone)]
pub struct EntityTypeDef {
    /// Registry identifier.
    pub id: EntityTypeId,
    /// Registered name.
    pub name: Arc<str>,
    /// Parent type whose handlers were inherited, if any.
    pub parent_id: Option<EntityTypeId>,
    /// Rust type of the objects this entity type wraps.
    pub rust_type: RustTypeId,
    /// Rust type name, for diagnostics.
    pub rust_type_name: &'static str,
    /// Handlers, parent handlers first.
    pub callbacks: Arc<CallbackSet>,
}
