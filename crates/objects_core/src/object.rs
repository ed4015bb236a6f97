//! Object types: compile-time tags for families of entities.

use std::marker::PhantomData;

use objects_store::{Entity, TypeHash};

use crate::handle::Handle;
use crate::world::World;

/// A registered class of objects sharing a name and lifecycle hooks.
///
/// Instances are entities carrying an [`ObjectDescriptor`](crate::ObjectDescriptor)
/// plus a private per-type marker.
pub trait ObjectType: 'static {
    /// The registered name of this object type.
    fn type_name() -> &'static str;

    /// Runs after the descriptor and per-type storage are attached, before any
    /// start-up components are added.
    fn on_init(_world: &mut World, _object: Handle) {}

    /// Runs during the deletion drain, after every component has been erased
    /// and before the entity is destroyed.
    fn on_destroy(_world: &mut World, _object: Handle) {}

    /// The [`TypeHash`] of [`ObjectType::type_name`].
    fn type_hash() -> TypeHash {
        TypeHash::from_name(Self::type_name())
    }
}

/// An object type that accepts construction arguments of type `A`.
///
/// Used by [`World::create_new_with`]; by-name creation never supplies
/// arguments.
pub trait ObjectInit<A>: ObjectType {
    /// Runs with the caller's arguments immediately before
    /// [`ObjectType::on_init`].
    fn on_init_with(world: &mut World, object: Handle, args: A);
}

/// Marker stored on every instance of `T`; its storage is the per-type index.
pub(crate) struct ObjectTag<T>(PhantomData<fn() -> T>);

impl<T> Default for ObjectTag<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

/// A [`Handle`] statically known to refer to an instance of `T`.
pub struct TypedHandle<T> {
    handle: Handle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ObjectType> TypedHandle<T> {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    #[must_use]
    pub fn entity(&self) -> Entity {
        self.handle.entity()
    }

    /// Returns `true` while the entity is alive and still an instance of `T`.
    #[must_use]
    pub fn is_valid(&self, world: &World) -> bool {
        self.handle.is_valid(world) && world.store().has::<ObjectTag<T>>(self.handle.entity())
    }
}

impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> std::fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypedHandle").field(&self.handle).finish()
    }
}

impl<T> From<TypedHandle<T>> for Handle {
    fn from(typed: TypedHandle<T>) -> Self {
        typed.handle
    }
}
