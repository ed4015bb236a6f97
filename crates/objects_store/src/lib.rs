//! # objects_store
//!
//! The entity store the object model is built on. It owns entities and their
//! typed values and nothing else: no names, no hierarchy, no registry.
//!
//! This crate provides:
//!
//! - [`Entity`]: generational entity identifiers.
//! - [`EntityAllocator`]: slot allocator with generation bumps on reuse.
//! - [`TypedStorage`]: sparse-set storage for one value type.
//! - [`Store`]: entity lifecycle plus lazily created typed storages.
//! - [`TypeHash`]: FNV-1a 64 identifiers derived from type names.

pub mod entity;
pub mod error;
pub mod hash;
pub mod storage;
pub mod store;

pub use entity::{Entity, EntityAllocator};
pub use error::StoreError;
pub use hash::TypeHash;
pub use storage::{ComponentStorage, TypedStorage};
pub use store::Store;
