//! postcommit Registry
//!
//! Per-entity-type lifecycle handler lookup. Handler sets are resolved once,
//! when a type is registered, and the registry is immutable after
//! construction via RegistryBuilder.

mod builder;
mod registry;
mod types;

pub use builder::{RegistryBuilder, RegistryError, RegistryResult, TypeBuilder};
pub use registry::CallbackRegistry;
pub use types::EntityTypeDef;
