//! postcommit Core Types
//!
//! This crate provides the foundational types shared by the registry and the
//! transaction dispatcher:
//! - Identity types (EntityTypeId, EntityKey)
//! - Mutation kinds and lifecycle event names
//! - Entity handles (EntityRef) and their handler sets (CallbackSet)
//! - Common error types

mod entity;
mod error;
mod event;
mod handler;
mod id;

pub use entity::*;
pub use error::*;
pub use event::*;
pub use handler::*;
pub use id::*;
