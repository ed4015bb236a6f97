//! The entity store: allocation plus one typed storage per component type.

use std::any::TypeId;
use std::collections::HashMap;

use crate::entity::{Entity, EntityAllocator};
use crate::error::StoreError;
use crate::storage::{ComponentStorage, TypedStorage};

/// Owns every entity and every attached value.
///
/// Storages are created lazily on first use and enumerate in creation order.
#[derive(Default)]
pub struct Store {
    allocator: EntityAllocator,
    storages: Vec<Box<dyn ComponentStorage>>,
    /// Maps a Rust type to its position in `storages`.
    index: HashMap<TypeId, usize>,
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Entity lifecycle --

    /// Allocate a new entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        self.allocator.allocate()
    }

    /// Destroy an entity, dropping every value attached to it.
    ///
    /// Returns `true` if the entity existed.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        for storage in &mut self.storages {
            storage.remove(entity);
        }
        self.allocator.free(entity)
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// All alive entities in slot order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.allocator.iter().collect()
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Destroy every entity and drop every value. Storages stay registered.
    pub fn clear(&mut self) {
        for storage in &mut self.storages {
            storage.clear();
        }
        self.allocator.clear();
    }

    // -- Typed component access --

    /// Attach `value` to `entity`, replacing any value of the same type.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] if the entity is not alive.
    pub fn emplace<T: 'static>(&mut self, entity: Entity, value: T) -> Result<&mut T, StoreError> {
        if !self.is_alive(entity) {
            return Err(StoreError::DeadEntity(entity));
        }
        if !self.index.contains_key(&TypeId::of::<T>()) {
            self.index.insert(TypeId::of::<T>(), self.storages.len());
            self.storages.push(Box::new(TypedStorage::<T>::new()));
        }
        let storage = self
            .storage_mut::<T>()
            .ok_or(StoreError::StorageMismatch(std::any::type_name::<T>()))?;
        Ok(storage.insert(entity, value))
    }

    #[must_use]
    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|s| s.contains(entity))
    }

    #[must_use]
    pub fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    #[must_use]
    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Detach and return the `T` attached to `entity`.
    pub fn erase<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>()?.take(entity)
    }

    /// Number of `T` values currently stored.
    #[must_use]
    pub fn len<T: 'static>(&self) -> usize {
        self.storage::<T>().map_or(0, |s| ComponentStorage::len(s))
    }

    // -- Storage access --

    /// The storage for `T`, if any value of `T` was ever stored.
    #[must_use]
    pub fn storage<T: 'static>(&self) -> Option<&TypedStorage<T>> {
        let slot = *self.index.get(&TypeId::of::<T>())?;
        self.storages[slot].as_any().downcast_ref::<TypedStorage<T>>()
    }

    /// Mutable storage for `T`, if any value of `T` was ever stored.
    #[must_use]
    pub fn storage_mut<T: 'static>(&mut self) -> Option<&mut TypedStorage<T>> {
        let slot = *self.index.get(&TypeId::of::<T>())?;
        self.storages[slot]
            .as_any_mut()
            .downcast_mut::<TypedStorage<T>>()
    }

    /// Every storage in creation order.
    pub fn storages(&self) -> impl Iterator<Item = &dyn ComponentStorage> {
        self.storages.iter().map(|s| s.as_ref())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("entities", &self.allocator.alive_count())
            .field("storages", &self.storages.len())
            .finish()
    }
}
