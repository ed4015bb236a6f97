//! Entity type and allocation utilities.
//!
//! An [`Entity`] is a lightweight index/generation pair with no inherent data.
//! Destroyed slots are recycled, and every recycle bumps the slot generation so
//! that stale copies of an old entity never compare equal to, or report as
//! alive alongside, the new occupant.

use serde::{Deserialize, Serialize};

/// A generational entity identifier.
///
/// Entities are pure identifiers. Components are attached to entities through
/// the [`Store`](crate::Store) to give them meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// The null / invalid entity sentinel. Never returned by an allocator.
    pub const NULL: Entity = Entity {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Create an entity from its raw parts.
    #[must_use]
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the allocator.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time this entity was allocated.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` if this is [`Entity::NULL`].
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX && self.generation == u32::MAX
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Allocates entities, recycling destroyed slots.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation for every slot ever handed out.
    generations: Vec<u32>,
    /// Liveness flag per slot.
    alive: Vec<bool>,
    /// Slots free for reuse, popped LIFO.
    free: Vec<u32>,
}

impl EntityAllocator {
    /// Creates a new, empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh entity, reusing a destroyed slot if one is free.
    pub fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return Entity::from_parts(index, self.generations[slot]);
        }
        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.alive.push(true);
        Entity::from_parts(index, 0)
    }

    /// Releases an entity. Returns `false` if it was not alive.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index() as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(entity.index());
        true
    }

    /// Returns `true` if the entity's slot is occupied by this exact generation.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        slot < self.generations.len()
            && self.alive[slot]
            && self.generations[slot] == entity.generation()
    }

    /// Number of currently alive entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free.len()
    }

    /// Iterates over every alive entity in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.generations
            .iter()
            .zip(self.alive.iter())
            .enumerate()
            .filter(|(_, (_, alive))| **alive)
            .map(|(index, (generation, _))| Entity::from_parts(index as u32, *generation))
    }

    /// Frees every alive slot, bumping its generation so previously issued
    /// entities stay dead.
    pub fn clear(&mut self) {
        for (slot, alive) in self.alive.iter_mut().enumerate() {
            if *alive {
                *alive = false;
                self.generations[slot] = self.generations[slot].wrapping_add(1);
                self.free.push(slot as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_produces_unique_ids() {
        let mut alloc = EntityAllocator::new();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();
        let e3 = alloc.allocate();
        assert_ne!(e1, e2);
        assert_ne!(e2, e3);
        assert_eq!(alloc.alive_count(), 3);
    }

    #[test]
    fn test_recycled_slot_gets_new_generation() {
        let mut alloc = EntityAllocator::new();
        let old = alloc.allocate();
        assert!(alloc.free(old));
        let new = alloc.allocate();
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(!alloc.is_alive(old));
        assert!(alloc.is_alive(new));
    }

    #[test]
    fn test_double_free_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.free(e));
        assert!(!alloc.free(e));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn test_null_is_never_alive() {
        let mut alloc = EntityAllocator::new();
        alloc.allocate();
        assert!(Entity::NULL.is_null());
        assert!(!alloc.is_alive(Entity::NULL));
    }

    #[test]
    fn test_clear_kills_everything() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.clear();
        assert!(!alloc.is_alive(a));
        assert!(!alloc.is_alive(b));
        assert_eq!(alloc.iter().count(), 0);
    }

    #[test]
    fn test_entity_serialization_roundtrip() {
        let entity = Entity::from_parts(7, 3);
        let bytes = rmp_serde::to_vec(&entity).unwrap();
        let restored: Entity = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(entity, restored);
    }
}
