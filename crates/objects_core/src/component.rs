//! Core [`Component`] trait and its attached, type-erased forms.
//!
//! Values live in the entity store wrapped in [`Attached`], which records the
//! owning entity as a plain identifier. Generic code sees attached values
//! through [`AnyComponent`], the neutral base every component shares, and
//! recovers the concrete type with [`downcast_ref`](AnyComponent::downcast_ref)
//! or a registered cast.

use std::any::Any;
use std::ops::{Deref, DerefMut};

use objects_store::{Entity, Store};

/// The contract for data attachable to objects.
///
/// `Default` backs creation by name and `Clone` backs value-level copies. The
/// lifecycle hooks default to no-ops.
///
/// # Examples
///
/// ```rust
/// use objects_core::Component;
///
/// #[derive(Debug, Clone, Default)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Clone + Default + 'static {
    /// The registered name of this component type.
    fn type_name() -> &'static str;

    /// Runs once, right after the value is attached to `owner`.
    fn on_init(&mut self, _owner: Entity) {}

    /// Runs once, right before the value is detached from `owner`.
    fn on_destroy(&mut self, _owner: Entity) {}

    /// Runs on every [`World::update_components`](crate::World::update_components).
    fn on_update(&mut self, _owner: Entity, _dt: f32) {}
}

/// A component value together with the entity that owns it.
#[derive(Debug, Clone)]
pub struct Attached<C> {
    owner: Entity,
    value: C,
}

impl<C> Attached<C> {
    pub(crate) fn new(owner: Entity, value: C) -> Self {
        Self { owner, value }
    }

    /// The entity this value is attached to.
    #[must_use]
    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Entity) {
        self.owner = owner;
    }

    #[must_use]
    pub fn value(&self) -> &C {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut C {
        &mut self.value
    }
}

impl<C> Deref for Attached<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.value
    }
}

impl<C> DerefMut for Attached<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.value
    }
}

/// The neutral base shared by every attached component.
pub trait AnyComponent: Any + 'static {
    /// Registered name of the concrete component type.
    fn component_name(&self) -> &'static str;

    /// The entity this value is attached to.
    fn owner_entity(&self) -> Entity;

    /// The inner component value.
    fn value_any(&self) -> &dyn Any;

    fn value_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> AnyComponent for Attached<C> {
    fn component_name(&self) -> &'static str {
        C::type_name()
    }

    fn owner_entity(&self) -> Entity {
        self.owner
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }

    fn value_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

impl dyn AnyComponent {
    /// View the value as its concrete type.
    #[must_use]
    pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
        self.value_any().downcast_ref::<C>()
    }

    pub fn downcast_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.value_any_mut().downcast_mut::<C>()
    }

    /// Returns `true` if the value is a `C`.
    #[must_use]
    pub fn is<C: Component>(&self) -> bool {
        self.value_any().is::<C>()
    }
}

// -- Monomorphised operations behind the registry's closure table --

/// Get-or-create. `Some(true)` if a value was created, `Some(false)` if one
/// already existed, `None` if the entity is dead.
pub(crate) fn attach<C: Component>(store: &mut Store, entity: Entity, value: C) -> Option<bool> {
    if store.has::<Attached<C>>(entity) {
        return Some(false);
    }
    let slot = store.emplace(entity, Attached::new(entity, value)).ok()?;
    slot.value.on_init(entity);
    Some(true)
}

pub(crate) fn attach_default<C: Component>(store: &mut Store, entity: Entity) -> bool {
    attach(store, entity, C::default()).is_some()
}

pub(crate) fn detach<C: Component>(store: &mut Store, entity: Entity) -> bool {
    let Some(slot) = store.get_mut::<Attached<C>>(entity) else {
        return false;
    };
    slot.value.on_destroy(entity);
    store.erase::<Attached<C>>(entity).is_some()
}

pub(crate) fn contains<C: Component>(store: &Store, entity: Entity) -> bool {
    store.has::<Attached<C>>(entity)
}

/// Value-level assignment. Both entities must already carry a `C`.
pub(crate) fn copy_value<C: Component>(store: &mut Store, from: Entity, to: Entity) -> bool {
    let Some(source) = store.get::<Attached<C>>(from).map(|a| a.value.clone()) else {
        return false;
    };
    match store.get_mut::<Attached<C>>(to) {
        Some(target) => {
            target.value = source;
            true
        }
        None => false,
    }
}

pub(crate) fn get_erased<C: Component>(store: &Store, entity: Entity) -> Option<&dyn AnyComponent> {
    store
        .get::<Attached<C>>(entity)
        .map(|a| a as &dyn AnyComponent)
}

pub(crate) fn get_erased_mut<C: Component>(
    store: &mut Store,
    entity: Entity,
) -> Option<&mut dyn AnyComponent> {
    store
        .get_mut::<Attached<C>>(entity)
        .map(|a| a as &mut dyn AnyComponent)
}

/// Re-bind every value to the entity it is stored under.
pub(crate) fn restamp<C: Component>(store: &mut Store) {
    let Some(storage) = store.storage_mut::<Attached<C>>() else {
        return;
    };
    for (entity, slot) in storage.iter_mut() {
        slot.set_owner(entity);
    }
}

pub(crate) fn update_all<C: Component>(store: &mut Store, dt: f32) {
    let Some(storage) = store.storage_mut::<Attached<C>>() else {
        return;
    };
    for (entity, slot) in storage.iter_mut() {
        slot.value.on_update(entity, dt);
    }
}

pub(crate) fn count<C: Component>(store: &Store) -> usize {
    store.len::<Attached<C>>()
}

pub(crate) fn instances<C: Component>(store: &Store) -> Vec<Entity> {
    store
        .storage::<Attached<C>>()
        .map(|s| s.iter().map(|(entity, _)| entity).collect())
        .unwrap_or_default()
}

pub(crate) fn serialize<C>(store: &Store, entity: Entity) -> Option<Result<Vec<u8>, rmp_serde::encode::Error>>
where
    C: Component + serde::Serialize,
{
    store
        .get::<Attached<C>>(entity)
        .map(|a| rmp_serde::to_vec_named(&a.value))
}

/// Overwrite an attached value from MessagePack. `Ok(false)` if absent.
pub(crate) fn deserialize<C>(
    store: &mut Store,
    entity: Entity,
    bytes: &[u8],
) -> Result<bool, rmp_serde::decode::Error>
where
    C: Component + serde::de::DeserializeOwned,
{
    let value: C = rmp_serde::from_slice(bytes)?;
    match store.get_mut::<Attached<C>>(entity) {
        Some(slot) => {
            slot.value = value;
            Ok(true)
        }
        None => Ok(false),
    }
}
