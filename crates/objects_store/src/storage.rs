//! Typed component storage.
//!
//! Each Rust component type lives in its own [`TypedStorage`], a sparse set:
//! values are packed in a dense vector with a parallel entity vector, and a
//! sparse map points each entity at its dense row. Removal swap-removes, so the
//! last value moves into the vacated row. Anything that caches the address or
//! row of a component must be refreshed after a removal pass.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::entity::Entity;

/// Type-erased view of one component store, used for enumeration.
pub trait ComponentStorage: Any {
    /// The Rust type stored here.
    fn component_type_id(&self) -> TypeId;

    /// Short Rust type name, for diagnostics only.
    fn type_name(&self) -> &'static str;

    /// Returns `true` if `entity` has a value in this store.
    fn contains(&self, entity: Entity) -> bool;

    /// Drops the value attached to `entity`. Returns `false` if absent.
    fn remove(&mut self, entity: Entity) -> bool;

    /// Number of stored values.
    fn len(&self) -> usize;

    /// Returns `true` if the store holds no values.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entities with a value in this store, in dense order.
    fn entities(&self) -> &[Entity];

    /// Drops every value.
    fn clear(&mut self);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Sparse-set storage for values of type `T`.
#[derive(Debug)]
pub struct TypedStorage<T> {
    dense: Vec<T>,
    entities: Vec<Entity>,
    sparse: HashMap<Entity, usize>,
}

impl<T> Default for TypedStorage<T> {
    fn default() -> Self {
        Self {
            dense: Vec::new(),
            entities: Vec::new(),
            sparse: HashMap::new(),
        }
    }
}

impl<T: 'static> TypedStorage<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `value` to `entity`, replacing any existing value.
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        let row = match self.sparse.get(&entity) {
            Some(&row) => {
                self.dense[row] = value;
                row
            }
            None => {
                let row = self.dense.len();
                self.dense.push(value);
                self.entities.push(entity);
                self.sparse.insert(entity, row);
                row
            }
        };
        &mut self.dense[row]
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.sparse.get(&entity).map(|&row| &self.dense[row])
    }

    #[must_use]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let row = *self.sparse.get(&entity)?;
        Some(&mut self.dense[row])
    }

    /// Detach and return the value of `entity`.
    pub fn take(&mut self, entity: Entity) -> Option<T> {
        let row = self.sparse.remove(&entity)?;
        let value = self.dense.swap_remove(row);
        self.entities.swap_remove(row);
        if let Some(&moved) = self.entities.get(row) {
            self.sparse.insert(moved, row);
        }
        Some(value)
    }

    /// Iterate `(entity, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterate `(entity, value)` pairs mutably in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }
}

impl<T: 'static> ComponentStorage for TypedStorage<T> {
    fn component_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.sparse.contains_key(&entity)
    }

    fn remove(&mut self, entity: Entity) -> bool {
        self.take(entity).is_some()
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn clear(&mut self) {
        self.dense.clear();
        self.entities.clear();
        self.sparse.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(index: u32) -> Entity {
        Entity::from_parts(index, 0)
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = TypedStorage::<f32>::new();
        store.insert(e(1), 3.5);
        assert_eq!(store.get(e(1)), Some(&3.5));
        assert!(store.get(e(2)).is_none());
    }

    #[test]
    fn test_insert_replaces_existing_value() {
        let mut store = TypedStorage::<u32>::new();
        store.insert(e(1), 1);
        store.insert(e(1), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(e(1)), Some(&2));
    }

    #[test]
    fn test_remove_relocates_last_value() {
        let mut store = TypedStorage::<&str>::new();
        store.insert(e(1), "a");
        store.insert(e(2), "b");
        store.insert(e(3), "c");
        assert!(store.remove(e(1)));
        assert_eq!(store.entities(), &[e(3), e(2)]);
        assert_eq!(store.get(e(3)), Some(&"c"));
        assert_eq!(store.get(e(2)), Some(&"b"));
        assert!(!store.contains(e(1)));
    }

    #[test]
    fn test_remove_missing_returns_false() {
        let mut store = TypedStorage::<u8>::new();
        assert!(!store.remove(e(9)));
    }
}
