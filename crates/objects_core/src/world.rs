//! The [`World`]: entity store, type registry and deletion queue in one place.
//!
//! Every object and component operation is a method on `World`. They are
//! split across modules by concern:
//!
//! - [`components`](crate::components): typed and by-name component access
//! - [`hierarchy`](crate::hierarchy): parent/child links
//! - [`lifecycle`](crate::lifecycle): creation, deferred deletion, duplication
//! - [`snapshot`](crate::snapshot): MessagePack capture and restore

use objects_store::{Entity, Store, TypeHash};
use tracing::debug;

use crate::component::Component;
use crate::descriptor::{ObjectDescriptor, disambiguate};
use crate::error::ObjectError;
use crate::handle::Handle;
use crate::object::{ObjectType, TypedHandle};
use crate::registry::{ComponentRegistration, ObjectRegistration, TypeRegistry};

/// Owns every object, every registration and the pending-deletion queue.
///
/// A world is single-threaded: callers drain the deletion queue once per tick
/// with [`World::clear_deleting_queue`] and must not mutate it from elsewhere
/// while iterating.
#[derive(Debug, Default)]
pub struct World {
    pub(crate) store: Store,
    pub(crate) registry: TypeRegistry,
    pub(crate) pending: Vec<Handle>,
}

impl World {
    /// Create an empty world with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying entity store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register an object type. See [`TypeRegistry::register_object`].
    pub fn register_object<T: ObjectType>(&mut self) -> ObjectRegistration<'_, T> {
        self.registry.register_object::<T>()
    }

    /// Register a component type. See [`TypeRegistry::register_component`].
    pub fn register_component<C: Component>(&mut self) -> ComponentRegistration<'_, C> {
        self.registry.register_component::<C>()
    }

    /// Destroy every entity and drop pending deletions. Registrations survive.
    pub fn reset(&mut self) {
        let count = self.store.entity_count();
        self.store.clear();
        self.pending.clear();
        debug!(entities = count, "world reset");
    }

    // -- Descriptors --

    /// The descriptor of a live object.
    #[must_use]
    pub fn descriptor(&self, object: Handle) -> Option<&ObjectDescriptor> {
        if !object.is_valid(self) {
            return None;
        }
        self.store.get::<ObjectDescriptor>(object.entity())
    }

    pub(crate) fn descriptor_mut(&mut self, object: Handle) -> Option<&mut ObjectDescriptor> {
        if !object.is_valid(self) {
            return None;
        }
        self.store.get_mut::<ObjectDescriptor>(object.entity())
    }

    /// The type hash of a live object.
    #[must_use]
    pub fn object_type(&self, object: Handle) -> Option<TypeHash> {
        self.descriptor(object).map(ObjectDescriptor::object_type)
    }

    /// Registered type name of a live object.
    #[must_use]
    pub fn object_type_name(&self, object: Handle) -> Option<&'static str> {
        self.object_type(object)
            .and_then(|hash| self.registry.class_name_by_id(hash))
    }

    #[must_use]
    pub fn name(&self, object: Handle) -> Option<&str> {
        self.descriptor(object).map(ObjectDescriptor::name)
    }

    /// Rename an object. The name is disambiguated against every other object;
    /// returns the name actually assigned.
    pub fn set_name(&mut self, object: Handle, name: &str) -> Option<String> {
        if !object.is_valid(self) {
            return None;
        }
        let entity = object.entity();
        let name = disambiguate(name, |candidate| self.name_taken(candidate, Some(entity)));
        self.descriptor_mut(object)?.set_name(name.clone());
        Some(name)
    }

    pub(crate) fn name_taken(&self, name: &str, except: Option<Entity>) -> bool {
        self.store
            .storage::<ObjectDescriptor>()
            .is_some_and(|descriptors| {
                descriptors
                    .iter()
                    .any(|(entity, d)| Some(entity) != except && d.name() == name)
            })
    }

    /// First object whose name matches exactly.
    #[must_use]
    pub fn find_object_by_name(&self, name: &str) -> Option<Handle> {
        self.store
            .storage::<ObjectDescriptor>()?
            .iter()
            .find(|(_, d)| d.name() == name)
            .map(|(entity, _)| Handle::new(entity))
    }

    /// Visit every object with its descriptor.
    pub fn for_each_object(&self, mut visitor: impl FnMut(Handle, &ObjectDescriptor)) {
        let Some(descriptors) = self.store.storage::<ObjectDescriptor>() else {
            return;
        };
        for (entity, descriptor) in descriptors.iter() {
            visitor(Handle::new(entity), descriptor);
        }
    }

    /// Every live object.
    #[must_use]
    pub fn objects(&self) -> Vec<Handle> {
        self.store
            .storage::<ObjectDescriptor>()
            .map(|s| s.iter().map(|(entity, _)| Handle::new(entity)).collect())
            .unwrap_or_default()
    }

    /// Visit every instance of `T`. The instance list is taken up front, so the
    /// visitor may create or delete objects.
    pub fn for_each<T: ObjectType>(&mut self, mut visitor: impl FnMut(&mut World, TypedHandle<T>)) {
        let instances = self
            .registry
            .object_by_hash(T::type_hash())
            .map(|vt| (vt.instances)(&self.store))
            .unwrap_or_default();
        for handle in instances {
            if handle.is_valid(self) {
                visitor(self, TypedHandle::new(handle));
            }
        }
    }

    /// Number of live instances of `T`.
    #[must_use]
    pub fn object_count<T: ObjectType>(&self) -> usize {
        self.registry
            .object_by_hash(T::type_hash())
            .map_or(0, |vt| (vt.count)(&self.store))
    }

    /// Number of live objects of every type.
    #[must_use]
    pub fn total_objects(&self) -> usize {
        self.store.len::<ObjectDescriptor>()
    }

    // -- Registry shortcuts --

    #[must_use]
    pub fn is_class_registered(&self, name: &str) -> bool {
        self.registry.is_class_registered(name)
    }

    #[must_use]
    pub fn class_name_by_id(&self, hash: TypeHash) -> Option<&'static str> {
        self.registry.class_name_by_id(hash)
    }

    // -- Per-type storage --

    /// The per-type storage value attached at creation by
    /// [`ObjectRegistration::with_storage`].
    pub fn storage<S: 'static>(&self, object: Handle) -> Result<&S, ObjectError> {
        if !object.is_valid(self) {
            return Err(ObjectError::InvalidHandle(object.entity()));
        }
        self.store
            .get::<S>(object.entity())
            .ok_or(ObjectError::MissingComponent {
                component: std::any::type_name::<S>(),
                entity: object.entity(),
            })
    }

    pub fn storage_mut<S: 'static>(&mut self, object: Handle) -> Result<&mut S, ObjectError> {
        if !object.is_valid(self) {
            return Err(ObjectError::InvalidHandle(object.entity()));
        }
        self.store
            .get_mut::<S>(object.entity())
            .ok_or(ObjectError::MissingComponent {
                component: std::any::type_name::<S>(),
                entity: object.entity(),
            })
    }
}
