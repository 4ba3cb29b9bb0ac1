//! The CallbackRegistry - immutable handler lookup.

use std::any::{type_name, Any, TypeId as RustTypeId};
use std::collections::HashMap;
use std::sync::Arc;

use postcommit_core::{CallbackSet, EntityRef, EntityTypeId};

use crate::{EntityTypeDef, RegistryError, RegistryResult};

/// The CallbackRegistry resolves entity handles to their handler sets.
/// It is immutable after construction and can be shared across threads.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    /// Entity type definitions by ID.
    types: HashMap<EntityTypeId, EntityTypeDef>,
    /// Entity type ID lookup by name.
    type_names: HashMap<String, EntityTypeId>,
    /// Entity type ID lookup by Rust type.
    rust_types: HashMap<RustTypeId, EntityTypeId>,
}

impl CallbackRegistry {
    /// Create a registry (use RegistryBuilder for construction).
    pub(crate) fn new(
        types: HashMap<EntityTypeId, EntityTypeDef>,
        type_names: HashMap<String, EntityTypeId>,
        rust_types: HashMap<RustTypeId, EntityTypeId>,
    ) -> Self {
        Self {
            types,
            type_names,
            rust_types,
        }
    }

    // ==================== Type Lookups ====================

    /// Get a type definition by ID.
    pub fn get_type(&self, id: EntityTypeId) -> Option<&EntityTypeDef> {
        self.types.get(&id)
    }

    /// Get a type definition by name.
    pub fn get_type_by_name(&self, name: &str) -> Option<&EntityTypeDef> {
        self.type_names.get(name).and_then(|id| self.types.get(id))
    }

    /// Get a type ID by name.
    pub fn get_type_id(&self, name: &str) -> Option<EntityTypeId> {
        self.type_names.get(name).copied()
    }

    /// Get the type definition registered for a Rust type.
    pub fn get_type_for<E: Any>(&self) -> Option<&EntityTypeDef> {
        self.rust_types
            .get(&RustTypeId::of::<E>())
            .and_then(|id| self.types.get(id))
    }

    /// Iterate all type definitions.
    pub fn all_types(&self) -> impl Iterator<Item = &EntityTypeDef> {
        self.types.values()
    }

    /// Get the number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Get the handler set of a type.
    pub fn callbacks_for(&self, id: EntityTypeId) -> Option<&CallbackSet> {
        self.types.get(&id).map(|def| def.callbacks.as_ref())
    }

    // ==================== Entity Handles ====================

    /// Wrap a domain object in a handle carrying its type's handler set.
    pub fn entity<E>(&self, object: Arc<E>) -> RegistryResult<EntityRef>
    where
        E: Any + Send + Sync,
    {
        let def = self
            .get_type_for::<E>()
            .ok_or_else(|| RegistryError::UnregisteredType(type_name::<E>().to_string()))?;

        Ok(EntityRef::new(
            def.id,
            def.name.clone(),
            object,
            def.callbacks.clone(),
        ))
    }
}
