//! Liveness-checked references to objects.

use objects_store::Entity;

use crate::descriptor::ObjectDescriptor;
use crate::object::{ObjectType, TypedHandle};
use crate::world::World;

/// A weak reference to an entity.
///
/// A handle is valid only if it is not explicitly null and the entity is still
/// alive in the store. Handles to destroyed entities are never valid, even if
/// the slot was reused: entities are generational. Equality includes the null
/// flag, so a wrapped null entity is not the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    entity: Entity,
    explicitly_null: bool,
}

impl Handle {
    /// Wrap an entity.
    #[must_use]
    pub const fn new(entity: Entity) -> Self {
        Self {
            entity,
            explicitly_null: false,
        }
    }

    /// The explicitly null handle.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            entity: Entity::NULL,
            explicitly_null: true,
        }
    }

    #[must_use]
    pub const fn entity(self) -> Entity {
        self.entity
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.explicitly_null
    }

    /// Returns `true` if the handle is not null and its entity is alive.
    #[must_use]
    pub fn is_valid(self, world: &World) -> bool {
        !self.explicitly_null && world.store().is_alive(self.entity)
    }

    /// A read-only view of the object, if the handle is valid and the entity
    /// carries an object descriptor.
    #[must_use]
    pub fn resolve(self, world: &World) -> Option<ObjectRef<'_>> {
        if !self.is_valid(world) {
            return None;
        }
        let descriptor = world.descriptor(self)?;
        Some(ObjectRef {
            world,
            handle: self,
            descriptor,
        })
    }

    /// A typed handle, if the handle is valid and refers to an instance of `T`.
    #[must_use]
    pub fn resolve_as<T: ObjectType>(self, world: &World) -> Option<TypedHandle<T>> {
        let typed = TypedHandle::<T>::new(self);
        typed.is_valid(world).then_some(typed)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Entity> for Handle {
    fn from(entity: Entity) -> Self {
        Self::new(entity)
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.explicitly_null {
            f.write_str("Handle(null)")
        } else {
            write!(f, "Handle({})", self.entity)
        }
    }
}

/// A borrowed view of a live object.
#[derive(Clone, Copy)]
pub struct ObjectRef<'w> {
    world: &'w World,
    handle: Handle,
    descriptor: &'w ObjectDescriptor,
}

impl<'w> ObjectRef<'w> {
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    #[must_use]
    pub fn name(&self) -> &'w str {
        self.descriptor.name()
    }

    /// Registered name of the object's type, or `""` if unknown.
    #[must_use]
    pub fn type_name(&self) -> &'w str {
        self.world
            .class_name_by_id(self.descriptor.object_type())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Handle> {
        self.world.parent(self.handle)
    }

    #[must_use]
    pub fn children(&self) -> &'w [Handle] {
        self.descriptor.children()
    }

    #[must_use]
    pub fn component_names(&self) -> &'w [String] {
        self.descriptor.component_names()
    }

    #[must_use]
    pub fn descriptor(&self) -> &'w ObjectDescriptor {
        self.descriptor
    }
}

impl std::fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRef")
            .field("handle", &self.handle)
            .field("descriptor", self.descriptor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle_is_never_valid() {
        let world = World::new();
        assert!(Handle::null().is_null());
        assert!(!Handle::null().is_valid(&world));
        assert!(Handle::default().is_null());
    }

    #[test]
    fn test_handles_compare_by_entity() {
        let e = Entity::from_parts(3, 1);
        assert_eq!(Handle::new(e), Handle::from(e));
        assert_ne!(Handle::new(e), Handle::new(Entity::from_parts(3, 2)));
    }

    #[test]
    fn test_null_handle_differs_from_wrapped_null_entity() {
        let wrapped = Handle::new(Entity::NULL);
        assert_ne!(Handle::null(), wrapped);
        assert_eq!(Handle::null(), Handle::default());

        let set: std::collections::HashSet<Handle> = [Handle::null(), wrapped].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Handle::null().to_string(), "Handle(null)");
        assert_eq!(
            Handle::new(Entity::from_parts(2, 0)).to_string(),
            "Handle(Entity(2v0))"
        );
    }
}
