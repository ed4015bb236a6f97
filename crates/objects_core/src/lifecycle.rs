//! Object creation, deferred deletion and duplication.
//!
//! Deletion is never immediate. [`World::delete_object`] enqueues a handle and
//! [`World::clear_deleting_queue`], called once per tick, tears down every
//! queued object together with its descendants.

use tracing::{debug, warn};

use crate::descriptor::{ObjectDescriptor, disambiguate};
use crate::handle::Handle;
use crate::object::{ObjectInit, ObjectType, TypedHandle};
use crate::world::World;

impl World {
    /// Create an instance of `T`, registering `T` on first use.
    ///
    /// The requested name is disambiguated against every live object. The
    /// type's start-up hooks and [`ObjectType::on_init`] run before the
    /// start-up and omnipresent components are attached.
    pub fn create_new<T: ObjectType>(&mut self, name: &str) -> TypedHandle<T> {
        self.spawn::<T>(name, T::on_init)
    }

    /// Like [`World::create_new`], handing `args` to
    /// [`ObjectInit::on_init_with`] before [`ObjectType::on_init`] runs.
    pub fn create_new_with<T, A>(&mut self, name: &str, args: A) -> TypedHandle<T>
    where
        T: ObjectInit<A>,
    {
        self.spawn::<T>(name, |world, handle| {
            T::on_init_with(world, handle, args);
            T::on_init(world, handle);
        })
    }

    fn spawn<T: ObjectType>(
        &mut self,
        name: &str,
        init: impl FnOnce(&mut World, Handle),
    ) -> TypedHandle<T> {
        self.registry.ensure_object::<T>();
        let object_type = T::type_hash();
        let name = disambiguate(name, |candidate| self.name_taken(candidate, None));

        let entity = self.store.create_entity();
        let handle = Handle::new(entity);
        if let Err(err) = self
            .store
            .emplace(entity, ObjectDescriptor::new(name.clone(), object_type))
        {
            warn!(%err, object = %name, "could not attach object descriptor");
        }
        for hook in self.registry.startup_hooks(object_type) {
            hook(&mut self.store, entity);
        }

        init(self, handle);

        for component in self.registry.start_components(object_type) {
            self.add_component_by_name(handle, component);
        }
        self.refresh_component_names(handle);

        debug!(object = %name, object_type = T::type_name(), %entity, "object created");
        TypedHandle::new(handle)
    }

    /// Create an object by registered type name.
    ///
    /// Returns a null handle, with a log entry, if the type is unknown.
    pub fn create_object(&mut self, type_name: &str, name: &str) -> Handle {
        match self.registry.invoke_object(type_name, "create", |vt| Some(vt.create)) {
            Some(create) => create(self, name),
            None => Handle::null(),
        }
    }

    /// Queue `object` for deletion at the next [`World::clear_deleting_queue`].
    pub fn delete_object(&mut self, object: impl Into<Handle>) {
        let object = object.into();
        if object.is_null() {
            return;
        }
        debug!(%object, "object queued for deletion");
        self.pending.push(object);
    }

    /// Number of queued deletions.
    #[must_use]
    pub fn pending_deletions(&self) -> usize {
        self.pending.len()
    }

    /// Destroy every queued object and its descendants; returns how many
    /// objects were destroyed.
    ///
    /// Entries are processed in queue order, each subtree pre-order. Stale or
    /// repeated entries are skipped. Objects queued while draining wait for
    /// the next call.
    pub fn clear_deleting_queue(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let queue = std::mem::take(&mut self.pending);
        let mut destroyed = 0;
        for root in queue {
            if !root.is_valid(self) {
                continue;
            }
            self.clear_parent(root);
            for object in self.subtree(root) {
                if self.destroy_now(object) {
                    destroyed += 1;
                }
            }
        }

        let restamps: Vec<_> = self.registry.components().map(|vt| vt.restamp).collect();
        for restamp in restamps {
            restamp(&mut self.store);
        }

        debug!(destroyed, "deletion queue drained");
        destroyed
    }

    /// Erase every component, run the type's destroy hook, destroy the entity.
    fn destroy_now(&mut self, object: Handle) -> bool {
        let Some(descriptor) = self.descriptor(object) else {
            return false;
        };
        let object_type = descriptor.object_type();
        let components = descriptor.component_names().to_vec();

        for name in &components {
            self.erase_component_by_name(object, name);
        }
        let destroy = self.registry.object_by_hash(object_type).map(|vt| vt.destroy);
        if let Some(destroy) = destroy {
            destroy(self, object);
        }
        self.store.destroy_entity(object.entity())
    }

    /// Queue every object and drain immediately.
    pub fn delete_all_objects(&mut self) -> usize {
        for object in self.objects() {
            self.pending.push(object);
        }
        self.clear_deleting_queue()
    }

    /// Duplicate `root` and its descendants.
    ///
    /// Each node is cloned with the same type, a disambiguated name and a copy
    /// of every component value. Clones are linked as a chain in pre-order,
    /// each one parented to the previous clone, so a branching tree comes back
    /// flattened. Returns the clone of `root`, or a null handle.
    pub fn copy_object(&mut self, root: Handle) -> Handle {
        let mut first = None;
        let mut previous: Option<Handle> = None;
        for source in self.subtree(root) {
            let Some(clone) = self.duplicate_object(source) else {
                continue;
            };
            if let Some(previous) = previous {
                self.set_parent(clone, previous);
            }
            first.get_or_insert(clone);
            previous = Some(clone);
        }
        if let Some(first) = first {
            debug!(source = %root, copy = %first, "object copied");
        }
        first.unwrap_or_default()
    }

    /// Clone one object without its links.
    fn duplicate_object(&mut self, source: Handle) -> Option<Handle> {
        let descriptor = self.descriptor(source)?;
        let name = descriptor.name().to_string();
        let create = self.registry.object_by_hash(descriptor.object_type())?.create;
        let clone = create(self, &name);
        if !clone.is_valid(self) {
            return None;
        }

        let catalogue: Vec<_> = self
            .registry
            .components()
            .map(|vt| (vt.name, vt.has))
            .collect();
        for (component, has) in catalogue {
            if !has(&self.store, source.entity()) {
                continue;
            }
            if has(&self.store, clone.entity()) || self.add_component_by_name(clone, component).is_some() {
                self.copy_component_by_name(component, source, clone);
            }
        }
        Some(clone)
    }
}
