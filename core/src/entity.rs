//! Entity handles.
//!
//! An [`EntityRef`] is what mutation code hands to the transaction layer: a
//! shared pointer to the domain object plus the handler set of its type. The
//! transaction layer never looks inside the object.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{CallbackSet, EntityKey, EntityObject, EntityTypeId, Handler, LifecycleEvent};

/// Handle to a mutated domain object.
#[derive(Clone)]
pub struct EntityRef {
    type_id: EntityTypeId,
    type_name: Arc<str>,
    object: Arc<EntityObject>,
    callbacks: Arc<CallbackSet>,
}

impl EntityRef {
    /// Create a handle from a resolved entity type and its handler set.
    pub fn new(
        type_id: EntityTypeId,
        type_name: Arc<str>,
        object: Arc<EntityObject>,
        callbacks: Arc<CallbackSet>,
    ) -> Self {
        Self {
            type_id,
            type_name,
            object,
            callbacks,
        }
    }

    /// Identity of the underlying object.
    pub fn key(&self) -> EntityKey {
        EntityKey::from_addr(Arc::as_ptr(&self.object) as *const () as usize)
    }

    /// Check whether two handles point at the same object.
    pub fn same_entity(&self, other: &EntityRef) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    /// The registered entity type.
    pub fn type_id(&self) -> EntityTypeId {
        self.type_id
    }

    /// The registered entity type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The type-erased object.
    pub fn object(&self) -> &EntityObject {
        &*self.object
    }

    /// Borrow the object as its concrete type.
    pub fn downcast_ref<E: Any>(&self) -> Option<&E> {
        self.object.downcast_ref::<E>()
    }

    /// The handler set of this entity's type.
    pub fn callbacks(&self) -> &CallbackSet {
        &self.callbacks
    }

    /// Handlers declared for an event, in registration order.
    pub fn handlers(&self, event: LifecycleEvent) -> &[Handler] {
        self.callbacks.handlers(event)
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("type", &self.type_name)
            .field("key", &self.key())
            .finish()
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.type_name, self.key())
    }
}
