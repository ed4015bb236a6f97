//! # objects_core
//!
//! Named object types, type-erased component operations and object lifecycle
//! on top of [`objects_store`].
//!
//! This crate provides:
//!
//! - [`TypeRegistry`]: closure tables per registered object and component
//!   type, addressable by name or [`TypeHash`].
//! - [`World`]: the store, the registry and the deferred-deletion queue.
//! - [`Handle`] / [`TypedHandle`]: liveness-checked object references.
//! - [`ObjectDescriptor`]: name, type, links and cached component names.
//! - [`ObjectSnapshot`]: MessagePack capture of one object.
//!
//! # Examples
//!
//! ```rust
//! use objects_core::{Component, ObjectType, World};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Health(u32);
//!
//! impl Component for Health {
//!     fn type_name() -> &'static str { "Health" }
//! }
//!
//! struct Player;
//!
//! impl ObjectType for Player {
//!     fn type_name() -> &'static str { "Player" }
//! }
//!
//! let mut world = World::new();
//! let _ = world.register_component::<Health>().present_in::<Player>();
//!
//! let player = world.create_object("Player", "Player");
//! assert!(player.is_null());
//!
//! world.register_object::<Player>();
//! let player = world.create_object("Player", "Player");
//! assert!(world.has_component_by_name(player, "Health"));
//!
//! world.delete_object(player);
//! world.clear_deleting_queue();
//! assert!(!player.is_valid(&world));
//! ```

pub mod component;
pub mod components;
pub mod descriptor;
pub mod error;
pub mod handle;
pub mod hierarchy;
pub mod lifecycle;
pub mod object;
pub mod registry;
pub mod snapshot;
pub mod world;

pub use component::{AnyComponent, Attached, Component};
pub use descriptor::ObjectDescriptor;
pub use error::ObjectError;
pub use handle::{Handle, ObjectRef};
pub use object::{ObjectInit, ObjectType, TypedHandle};
pub use objects_store::{Entity, TypeHash};
pub use registry::{
    ComponentRegistration, ComponentVTable, ObjectRegistration, ObjectVTable, TypeRegistry,
};
pub use snapshot::{ComponentRecord, ObjectSnapshot};
pub use world::World;
