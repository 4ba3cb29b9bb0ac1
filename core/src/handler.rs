//! Lifecycle handlers and per-type handler sets.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::{HandlerError, HandlerResult, LifecycleEvent};

/// Type-erased view of a mutated domain object.
pub type EntityObject = dyn Any + Send + Sync;

type HandlerFn = dyn Fn(&EntityObject) -> HandlerResult + Send + Sync;

/// A single registered lifecycle callback.
#[derive(Clone)]
pub struct Handler {
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap a callback that receives the type-erased entity.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&EntityObject) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Wrap a callback for a concrete entity type.
    ///
    /// Invoking the handler with an object of another type yields
    /// [`HandlerError::TypeMismatch`] instead of running the callback.
    pub fn typed<E, F>(func: F) -> Self
    where
        E: Any + Send + Sync,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(move |object: &EntityObject| match object.downcast_ref::<E>() {
            Some(entity) => func(entity),
            None => Err(HandlerError::type_mismatch(type_name::<E>())),
        })
    }

    /// Run the callback.
    pub fn call(&self, entity: &EntityObject) -> HandlerResult {
        (self.func)(entity)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

/// The ordered handlers an entity type declared, one list per event.
#[derive(Debug, Clone, Default)]
pub struct CallbackSet {
    handlers: [Vec<Handler>; LifecycleEvent::COUNT],
}

impl CallbackSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for an event. Registration order is invocation order.
    pub fn push(&mut self, event: LifecycleEvent, handler: Handler) {
        self.handlers[event.index()].push(handler);
    }

    /// Handlers declared for an event, in registration order.
    pub fn handlers(&self, event: LifecycleEvent) -> &[Handler] {
        &self.handlers[event.index()]
    }

    /// Number of handlers declared for an event.
    pub fn count(&self, event: LifecycleEvent) -> usize {
        self.handlers[event.index()].len()
    }

    /// Check if no handler is declared for any event.
    pub fn is_empty(&self) -> bool {
        self.handlers.iter().all(Vec::is_empty)
    }

    /// Events that have at least one handler.
    pub fn declared_events(&self) -> impl Iterator<Item = LifecycleEvent> + '_ {
        LifecycleEvent::ALL
            .into_iter()
            .filter(move |event| !self.handlers[event.index()].is_empty())
    }
}
