//! RegistryBuilder for constructing an immutable CallbackRegistry.

use std::any::{type_name, Any, TypeId as RustTypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use postcommit_core::{
    CallbackSet, EntityObject, EntityTypeId, Handler, HandlerError, HandlerResult, LifecycleEvent,
};
use regex_lite::Regex;
use thiserror::Error;

use crate::{CallbackRegistry, EntityTypeDef};

/// Errors that can occur during registry construction or lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate entity type name: {0}")]
    DuplicateTypeName(String),

    #[error("Rust type {0} is already registered")]
    DuplicateRustType(String),

    #[error("Invalid entity type name: {0:?}")]
    InvalidTypeName(String),

    #[error("Unknown parent type: {0}")]
    UnknownParentType(String),

    #[error("Parent type {parent} does not wrap {expected}")]
    ParentTypeMismatch { parent: String, expected: String },

    #[error("Rust type {0} is not registered")]
    UnregisteredType(String),

    #[error("Invalid type name pattern: {0}")]
    NamePattern(String),
}

impl RegistryError {
    pub fn parent_type_mismatch(parent: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::ParentTypeMismatch {
            parent: parent.into(),
            expected: expected.into(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

fn type_name_pattern() -> RegistryResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, String>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| RegistryError::NamePattern(e.clone()))
}

/// Builder for constructing an immutable CallbackRegistry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Next type ID to allocate.
    next_type_id: u32,

    /// Types being built.
    types: HashMap<EntityTypeId, EntityTypeDef>,
    /// Type name to ID mapping.
    type_names: HashMap<String, EntityTypeId>,
    /// Rust type to ID mapping.
    rust_types: HashMap<RustTypeId, EntityTypeId>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity type wrapping objects of Rust type `E`.
    pub fn add_type<E>(&mut self, name: impl Into<String>) -> TypeBuilder<'_, E>
    where
        E: Any + Send + Sync,
    {
        let name = name.into();
        let id = EntityTypeId::new(self.next_type_id);
        self.next_type_id += 1;

        TypeBuilder {
            builder: self,
            id,
            name,
            parent: None,
            handlers: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Build the immutable CallbackRegistry.
    pub fn build(self) -> RegistryResult<CallbackRegistry> {
        Ok(CallbackRegistry::new(
            self.types,
            self.type_names,
            self.rust_types,
        ))
    }
}

type AdaptFn = Box<dyn Fn(Handler) -> Handler>;

/// Parent declared through [`TypeBuilder::extends`].
struct ParentLink {
    name: String,
    rust_type: RustTypeId,
    adapt: AdaptFn,
}

/// Builder for one entity type's handler set.
pub struct TypeBuilder<'a, E> {
    builder: &'a mut RegistryBuilder,
    id: EntityTypeId,
    name: String,
    parent: Option<ParentLink>,
    handlers: Vec<(LifecycleEvent, Handler)>,
    _entity: PhantomData<fn(&E)>,
}

impl<'a, E> TypeBuilder<'a, E>
where
    E: Any + Send + Sync,
{
    /// Inherit every handler of an already registered parent type.
    ///
    /// Parent handlers run before this type's own handlers and receive the
    /// parent view of the object through `AsRef<P>`.
    pub fn extends<P>(mut self, parent_name: impl Into<String>) -> Self
    where
        E: AsRef<P>,
        P: Any + Send + Sync,
    {
        self.parent = Some(ParentLink {
            name: parent_name.into(),
            rust_type: RustTypeId::of::<P>(),
            adapt: Box::new(|parent_handler: Handler| {
                Handler::new(move |object: &EntityObject| match object.downcast_ref::<E>() {
                    Some(entity) => {
                        let parent_view: &P = entity.as_ref();
                        parent_handler.call(parent_view)
                    }
                    None => Err(HandlerError::type_mismatch(type_name::<E>())),
                })
            }),
        });
        self
    }

    /// Register a handler for any lifecycle event.
    pub fn on<F>(mut self, event: LifecycleEvent, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.push((event, Handler::typed(handler)));
        self
    }

    /// Fired once per committed entity, for every mutation kind.
    pub fn after_commit<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::AfterCommit, handler)
    }

    pub fn after_commit_on_create<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::AfterCommitOnCreate, handler)
    }

    pub fn after_commit_on_update<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::AfterCommitOnUpdate, handler)
    }

    pub fn after_commit_on_destroy<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::AfterCommitOnDestroy, handler)
    }

    /// Fired once per entity touched by a transaction that rolled back.
    pub fn after_rollback<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::AfterRollback, handler)
    }

    /// Declared but never fired by the dispatcher.
    pub fn before_commit<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::BeforeCommit, handler)
    }

    pub fn before_commit_on_create<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::BeforeCommitOnCreate, handler)
    }

    pub fn before_commit_on_update<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::BeforeCommitOnUpdate, handler)
    }

    pub fn before_commit_on_destroy<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::BeforeCommitOnDestroy, handler)
    }

    /// Declared but never fired by the dispatcher.
    pub fn before_rollback<F>(self, handler: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(LifecycleEvent::BeforeRollback, handler)
    }

    /// Finish building this type.
    pub fn done(self) -> RegistryResult<EntityTypeId> {
        if !type_name_pattern()?.is_match(&self.name) {
            return Err(RegistryError::InvalidTypeName(self.name));
        }

        // Check for duplicate name
        if self.builder.type_names.contains_key(&self.name) {
            return Err(RegistryError::DuplicateTypeName(self.name));
        }

        let rust_type = RustTypeId::of::<E>();
        if self.builder.rust_types.contains_key(&rust_type) {
            return Err(RegistryError::DuplicateRustType(type_name::<E>().to_string()));
        }

        let mut callbacks = CallbackSet::new();

        // Resolve parent handlers first so they keep their place in line
        let parent_id = match &self.parent {
            Some(link) => {
                let parent = self
                    .builder
                    .type_names
                    .get(&link.name)
                    .and_then(|id| self.builder.types.get(id))
                    .ok_or_else(|| RegistryError::UnknownParentType(link.name.clone()))?;
                if parent.rust_type != link.rust_type {
                    return Err(RegistryError::parent_type_mismatch(
                        link.name.clone(),
                        parent.rust_type_name,
                    ));
                }
                for event in LifecycleEvent::ALL {
                    for handler in parent.callbacks.handlers(event) {
                        callbacks.push(event, (link.adapt)(handler.clone()));
                    }
                }
                Some(parent.id)
            }
            None => None,
        };

        for (event, handler) in self.handlers {
            callbacks.push(event, handler);
        }

        let type_def = EntityTypeDef {
            id: self.id,
            name: Arc::from(self.name.as_str()),
            parent_id,
            rust_type,
            rust_type_name: type_name::<E>(),
            callbacks: Arc::new(callbacks),
        };

        self.builder.type_names.insert(self.name, self.id);
        self.builder.rust_types.insert(rust_type, self.id);
        self.builder.types.insert(self.id, type_def);

        Ok(self.id)
    }
}
