//! Component access on objects, statically typed or by registered name.
//!
//! Adds are get-or-create and respect the allowed set of the object's type.
//! Every add or erase refreshes the descriptor's cached component names.

use objects_store::Entity;
use tracing::{debug, warn};

use crate::component::{self, AnyComponent, Attached, Component};
use crate::descriptor::ObjectDescriptor;
use crate::error::ObjectError;
use crate::handle::Handle;
use crate::world::World;

impl World {
    // -- Typed access --

    /// Get-or-create `C` on `object` with its default value.
    ///
    /// Registers `C` on first use. Fails if the handle is dead or `C` is not
    /// allowed on the object's type.
    pub fn add_component<C: Component>(&mut self, object: Handle) -> Result<&mut C, ObjectError> {
        self.add_component_with(object, C::default())
    }

    /// Get-or-create `C` on `object`, initialised with `value` if created.
    pub fn add_component_with<C: Component>(
        &mut self,
        object: Handle,
        value: C,
    ) -> Result<&mut C, ObjectError> {
        let entity = self.checked_entity(object)?;
        self.registry.ensure_component::<C>();
        self.check_allowed(object, C::type_name())?;

        if component::attach(&mut self.store, entity, value).ok_or(ObjectError::InvalidHandle(entity))? {
            debug!(component = C::type_name(), %entity, "component added");
            self.refresh_component_names(object);
        }
        self.component_mut::<C>(object)
    }

    /// Detach `C`, running its destroy hook. `false` if absent.
    pub fn erase_component<C: Component>(&mut self, object: Handle) -> bool {
        if !object.is_valid(self) || !component::detach::<C>(&mut self.store, object.entity()) {
            return false;
        }
        debug!(component = C::type_name(), entity = %object.entity(), "component erased");
        self.refresh_component_names(object);
        true
    }

    #[must_use]
    pub fn has_component<C: Component>(&self, object: Handle) -> bool {
        object.is_valid(self) && component::contains::<C>(&self.store, object.entity())
    }

    /// Typed read access.
    ///
    /// A dead handle is [`ObjectError::InvalidHandle`]; a live object without
    /// `C` is [`ObjectError::MissingComponent`].
    pub fn component<C: Component>(&self, object: Handle) -> Result<&C, ObjectError> {
        let entity = self.checked_entity(object)?;
        self.store
            .get::<Attached<C>>(entity)
            .map(Attached::value)
            .ok_or(ObjectError::MissingComponent {
                component: C::type_name(),
                entity,
            })
    }

    pub fn component_mut<C: Component>(&mut self, object: Handle) -> Result<&mut C, ObjectError> {
        let entity = self.checked_entity(object)?;
        self.store
            .get_mut::<Attached<C>>(entity)
            .map(Attached::value_mut)
            .ok_or(ObjectError::MissingComponent {
                component: C::type_name(),
                entity,
            })
    }

    /// Number of live `C` instances.
    #[must_use]
    pub fn alive_count<C: Component>(&self) -> usize {
        component::count::<C>(&self.store)
    }

    // -- By-name access --

    /// Get-or-create a component by registered name.
    ///
    /// Returns `None`, with a log entry, if the handle is dead, the name is
    /// unknown, or the component is not allowed on the object's type.
    pub fn add_component_by_name(
        &mut self,
        object: Handle,
        name: &str,
    ) -> Option<&mut dyn AnyComponent> {
        if !object.is_valid(self) {
            return None;
        }
        let (add, has, get_mut) = self
            .registry
            .invoke(name, "add", |vt| Some((vt.add, vt.has, vt.get_mut)))?;
        if let Err(err) = self.check_allowed(object, name) {
            warn!(%err, "refused component add");
            return None;
        }

        let entity = object.entity();
        if !has(&self.store, entity) {
            if !add(&mut self.store, entity) {
                return None;
            }
            debug!(component = name, %entity, "component added");
            self.refresh_component_names(object);
        }
        get_mut(&mut self.store, entity)
    }

    /// Detach a component by registered name. `false` if absent or unknown.
    pub fn erase_component_by_name(&mut self, object: Handle, name: &str) -> bool {
        if !object.is_valid(self) {
            return false;
        }
        let Some(erase) = self.registry.invoke(name, "erase", |vt| Some(vt.erase)) else {
            return false;
        };
        if !erase(&mut self.store, object.entity()) {
            return false;
        }
        debug!(component = name, entity = %object.entity(), "component erased");
        self.refresh_component_names(object);
        true
    }

    #[must_use]
    pub fn has_component_by_name(&self, object: Handle, name: &str) -> bool {
        object.is_valid(self)
            && self
                .registry
                .invoke(name, "has", |vt| Some(vt.has))
                .is_some_and(|has| has(&self.store, object.entity()))
    }

    /// The component as its neutral base.
    #[must_use]
    pub fn component_by_name(&self, object: Handle, name: &str) -> Option<&dyn AnyComponent> {
        if !object.is_valid(self) {
            return None;
        }
        let get = self.registry.invoke(name, "get", |vt| Some(vt.get))?;
        get(&self.store, object.entity())
    }

    /// The component looked up by name, downcast to its concrete type.
    #[must_use]
    pub fn get_as<C: Component>(&self, object: Handle, name: &str) -> Option<&C> {
        self.component_by_name(object, name)?.downcast_ref::<C>()
    }

    /// The component looked up by name, viewed as `T` through a registered cast.
    #[must_use]
    pub fn cast_by_name<T: ?Sized + 'static>(&self, object: Handle, name: &str) -> Option<&T> {
        let value = self.component_by_name(object, name)?.value_any();
        self.registry
            .invoke(name, "cast", |vt| vt.cast::<T>(value))
    }

    /// Value-level copy of a component from one object to another.
    ///
    /// Both objects must already carry the component; the destination is never
    /// created implicitly.
    pub fn copy_component_by_name(&mut self, name: &str, from: Handle, to: Handle) -> bool {
        if !from.is_valid(self) || !to.is_valid(self) {
            return false;
        }
        let Some(copy) = self.registry.invoke(name, "copy", |vt| Some(vt.copy)) else {
            return false;
        };
        copy(&mut self.store, from.entity(), to.entity())
    }

    /// Number of live instances of a component type, by name.
    #[must_use]
    pub fn alive_count_by_name(&self, name: &str) -> usize {
        self.registry
            .invoke(name, "count", |vt| Some(vt.count))
            .map_or(0, |count| count(&self.store))
    }

    /// Registered components attached to `object`, in store order.
    #[must_use]
    pub fn object_components(&self, object: Handle) -> Vec<String> {
        self.descriptor(object)
            .map(|d| d.component_names().to_vec())
            .unwrap_or_default()
    }

    /// Run every component's update hook.
    pub fn update_components(&mut self, dt: f32) {
        let updates: Vec<_> = self.registry.components().map(|vt| vt.update).collect();
        for update in updates {
            update(&mut self.store, dt);
        }
    }

    // -- Helpers --

    fn checked_entity(&self, object: Handle) -> Result<Entity, ObjectError> {
        if object.is_valid(self) {
            Ok(object.entity())
        } else {
            Err(ObjectError::InvalidHandle(object.entity()))
        }
    }

    fn check_allowed(&self, object: Handle, component: &str) -> Result<(), ObjectError> {
        let object_type = self
            .object_type(object)
            .ok_or(ObjectError::InvalidHandle(object.entity()))?;
        if self.registry.is_allowed(object_type, component) {
            return Ok(());
        }
        Err(ObjectError::NotAllowed {
            component: component.to_string(),
            object_type: self
                .registry
                .class_name_by_id(object_type)
                .map_or_else(|| object_type.to_string(), str::to_string),
        })
    }

    /// Recompute the cached names from the store, in store creation order.
    pub(crate) fn refresh_component_names(&mut self, object: Handle) {
        let entity = object.entity();
        let names: Vec<String> = self
            .store
            .storages()
            .filter(|storage| storage.contains(entity))
            .filter_map(|storage| self.registry.component_by_storage(storage.component_type_id()))
            .map(|vt| vt.name.to_string())
            .collect();
        if let Some(descriptor) = self.store.get_mut::<ObjectDescriptor>(entity) {
            descriptor.set_component_names(names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectType;

    trait Describe {
        fn describe(&self) -> String;
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct HealthComponent {
        current: i32,
        inits: u32,
    }

    impl Component for HealthComponent {
        fn type_name() -> &'static str {
            "HealthComponent"
        }

        fn on_init(&mut self, _owner: Entity) {
            self.inits += 1;
        }
    }

    impl Describe for HealthComponent {
        fn describe(&self) -> String {
            format!("hp {}", self.current)
        }
    }

    fn as_describe(health: &HealthComponent) -> &(dyn Describe + 'static) {
        health
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Tint(u8);

    impl Component for Tint {
        fn type_name() -> &'static str {
            "Tint"
        }

        fn on_update(&mut self, _owner: Entity, _dt: f32) {
            self.0 = self.0.wrapping_add(1);
        }
    }

    struct Actor;

    impl ObjectType for Actor {
        fn type_name() -> &'static str {
            "Actor"
        }
    }

    struct Light;

    impl ObjectType for Light {
        fn type_name() -> &'static str {
            "Light"
        }
    }

    fn world() -> World {
        let mut world = World::new();
        world.register_object::<Actor>();
        world.register_object::<Light>();
        let _ = world
            .register_component::<HealthComponent>()
            .allowed_in::<Actor>()
            .cast::<dyn Describe>(as_describe);
        let _ = world.register_component::<Tint>().omnipresent();
        world
    }

    #[test]
    fn test_typed_add_is_get_or_create() {
        let mut world = world();
        let actor = world.create_new::<Actor>("A").handle();
        world.add_component::<HealthComponent>(actor).unwrap().current = 10;
        let again = world.add_component::<HealthComponent>(actor).unwrap();
        assert_eq!(again.current, 10);
        assert_eq!(again.inits, 1);
        assert_eq!(world.alive_count::<HealthComponent>(), 1);
    }

    #[test]
    fn test_add_by_name_twice_yields_one_instance() {
        let mut world = world();
        let actor = world.create_new::<Actor>("A").handle();
        let before = world.alive_count_by_name("HealthComponent");
        assert!(world.add_component_by_name(actor, "HealthComponent").is_some());
        assert!(world.add_component_by_name(actor, "HealthComponent").is_some());
        assert_eq!(world.alive_count_by_name("HealthComponent"), before + 1);
    }

    #[test]
    fn test_component_not_allowed_stays_absent() {
        let mut world = world();
        let light = world.create_new::<Light>("L").handle();
        assert!(world.add_component_by_name(light, "HealthComponent").is_none());
        assert!(!world.has_component_by_name(light, "HealthComponent"));
        assert!(matches!(
            world.add_component::<HealthComponent>(light),
            Err(ObjectError::NotAllowed { .. })
        ));
        assert!(!world.has_component::<HealthComponent>(light));
    }

    #[test]
    fn test_unknown_component_name() {
        let mut world = world();
        let actor = world.create_new::<Actor>("A").handle();
        assert!(world.add_component_by_name(actor, "Nope").is_none());
        assert!(!world.erase_component_by_name(actor, "Nope"));
        assert_eq!(world.alive_count_by_name("Nope"), 0);
    }

    #[test]
    fn test_dead_handle_is_distinguishable_from_missing() {
        let mut world = world();
        let actor = world.create_new::<Actor>("A").handle();
        assert!(matches!(
            world.component::<HealthComponent>(actor),
            Err(ObjectError::MissingComponent { .. })
        ));
        world.delete_object(actor);
        world.clear_deleting_queue();
        assert!(matches!(
            world.component::<HealthComponent>(actor),
            Err(ObjectError::InvalidHandle(_))
        ));
        assert!(world.add_component_by_name(actor, "HealthComponent").is_none());
    }

    #[test]
    fn test_cached_names_follow_mutations() {
        let mut world = world();
        let actor = world.create_new::<Actor>("A").handle();
        assert_eq!(world.object_components(actor), vec!["Tint"]);

        world.add_component_by_name(actor, "HealthComponent");
        assert_eq!(world.object_components(actor), vec!["Tint", "HealthComponent"]);

        assert!(world.erase_component::<HealthComponent>(actor));
        assert!(!world.erase_component::<HealthComponent>(actor));
        assert_eq!(world.object_components(actor), vec!["Tint"]);
    }

    #[test]
    fn test_copy_requires_destination() {
        let mut world = world();
        let a = world.create_new::<Actor>("A").handle();
        let b = world.create_new::<Actor>("B").handle();
        world.add_component::<HealthComponent>(a).unwrap().current = 7;

        assert!(!world.copy_component_by_name("HealthComponent", a, b));
        assert!(!world.has_component::<HealthComponent>(b));

        world.add_component::<HealthComponent>(b).unwrap();
        assert!(world.copy_component_by_name("HealthComponent", a, b));
        assert_eq!(world.component::<HealthComponent>(b).unwrap().current, 7);
    }

    #[test]
    fn test_neutral_base_and_casts() {
        let mut world = world();
        let actor = world.create_new::<Actor>("A").handle();
        world.add_component::<HealthComponent>(actor).unwrap().current = 3;

        let base = world.component_by_name(actor, "HealthComponent").unwrap();
        assert_eq!(base.component_name(), "HealthComponent");
        assert_eq!(base.owner_entity(), actor.entity());

        assert_eq!(world.get_as::<HealthComponent>(actor, "HealthComponent").unwrap().current, 3);
        assert!(world.get_as::<Tint>(actor, "HealthComponent").is_none());

        let described = world.cast_by_name::<dyn Describe>(actor, "HealthComponent").unwrap();
        assert_eq!(described.describe(), "hp 3");
        assert!(world.cast_by_name::<dyn Describe>(actor, "Tint").is_none());
    }

    #[test]
    fn test_update_components_runs_hooks() {
        let mut world = world();
        let actor = world.create_new::<Actor>("A").handle();
        world.update_components(0.016);
        world.update_components(0.016);
        assert_eq!(world.component::<Tint>(actor).unwrap().0, 2);
    }
}
