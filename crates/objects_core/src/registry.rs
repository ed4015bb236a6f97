//! The type registry: name-keyed closure tables for object and component types.
//!
//! Every registered type gets a table of monomorphised functions, built once at
//! registration. Generic callers (serialisers, editors, copy/paste) resolve a
//! table by name and call through it without knowing the concrete type.
//!
//! Registration is explicit and idempotent. Registering a type twice keeps the
//! first table and only extends its associations. Associations are keyed by
//! name hash, so a component may be associated with an object type before or
//! after that object type registers.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use objects_store::{Entity, Store, TypeHash};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::component::{self, AnyComponent, Attached, Component};
use crate::handle::Handle;
use crate::object::{ObjectTag, ObjectType};
use crate::world::World;

/// Encodes the value attached to an entity; `None` if it has none.
pub type SerializeFn = fn(&Store, Entity) -> Option<Result<Vec<u8>, rmp_serde::encode::Error>>;

/// Overwrites the value attached to an entity; `Ok(false)` if it has none.
pub type DeserializeFn = fn(&mut Store, Entity, &[u8]) -> Result<bool, rmp_serde::decode::Error>;

type ErasedCast<T> = Box<dyn Fn(&dyn Any) -> Option<&T>>;

/// Closure table for one component type.
pub struct ComponentVTable {
    /// Registered name.
    pub name: &'static str,
    pub hash: TypeHash,
    /// Name without a trailing `Component`, for user-facing lists.
    pub display_name: String,
    /// `TypeId` of the stored value, used to map store enumeration to names.
    pub storage_type: TypeId,
    /// Get-or-create with the default value; runs the init hook on creation.
    pub add: fn(&mut Store, Entity) -> bool,
    /// Runs the destroy hook, then detaches. `false` if absent.
    pub erase: fn(&mut Store, Entity) -> bool,
    pub has: fn(&Store, Entity) -> bool,
    /// Value-level copy `(from, to)`; both sides must already carry the type.
    pub copy: fn(&mut Store, Entity, Entity) -> bool,
    /// Cast to the neutral base.
    pub get: fn(&Store, Entity) -> Option<&dyn AnyComponent>,
    pub get_mut: fn(&mut Store, Entity) -> Option<&mut dyn AnyComponent>,
    /// Re-binds every instance to its owning entity.
    pub restamp: fn(&mut Store),
    pub update: fn(&mut Store, f32),
    pub count: fn(&Store) -> usize,
    pub instances: fn(&Store) -> Vec<Entity>,
    pub serialize: Option<SerializeFn>,
    pub deserialize: Option<DeserializeFn>,
    /// Cast closures keyed by target type.
    casts: HashMap<TypeId, Box<dyn Any>>,
}

impl ComponentVTable {
    fn new<C: Component>() -> Self {
        let name = C::type_name();
        Self {
            name,
            hash: TypeHash::from_name(name),
            display_name: strip_component_suffix(name).to_string(),
            storage_type: TypeId::of::<Attached<C>>(),
            add: component::attach_default::<C>,
            erase: component::detach::<C>,
            has: component::contains::<C>,
            copy: component::copy_value::<C>,
            get: component::get_erased::<C>,
            get_mut: component::get_erased_mut::<C>,
            restamp: component::restamp::<C>,
            update: component::update_all::<C>,
            count: component::count::<C>,
            instances: component::instances::<C>,
            serialize: None,
            deserialize: None,
            casts: HashMap::new(),
        }
    }

    /// View a component value as `T` through a registered cast.
    #[must_use]
    pub fn cast<'v, T: ?Sized + 'static>(&self, value: &'v dyn Any) -> Option<&'v T> {
        let cast = self
            .casts
            .get(&TypeId::of::<T>())?
            .downcast_ref::<ErasedCast<T>>()?;
        cast(value)
    }

    /// Returns `true` if a cast to `T` is registered.
    #[must_use]
    pub fn can_cast<T: ?Sized + 'static>(&self) -> bool {
        self.casts.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for ComponentVTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentVTable")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .field("serializable", &self.serialize.is_some())
            .field("casts", &self.casts.len())
            .finish()
    }
}

/// Closure table for one object type.
pub struct ObjectVTable {
    pub name: &'static str,
    pub hash: TypeHash,
    /// Creates a new instance; the name is disambiguated.
    pub create: fn(&mut World, &str) -> Handle,
    /// Runs the type's destroy hook. Does not destroy the entity.
    pub destroy: fn(&mut World, Handle) -> bool,
    pub is_instance: fn(&Store, Entity) -> bool,
    pub instances: fn(&Store) -> Vec<Handle>,
    pub count: fn(&Store) -> usize,
    /// Start-up hooks keyed by the type they attach.
    startup: Vec<(TypeId, fn(&mut Store, Entity))>,
}

impl ObjectVTable {
    fn new<T: ObjectType>() -> Self {
        let name = T::type_name();
        Self {
            name,
            hash: TypeHash::from_name(name),
            create: create_object::<T>,
            destroy: destroy_object::<T>,
            is_instance: is_instance::<T>,
            instances: object_instances::<T>,
            count: object_count::<T>,
            startup: vec![(TypeId::of::<ObjectTag<T>>(), attach_default::<ObjectTag<T>>)],
        }
    }
}

impl std::fmt::Debug for ObjectVTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectVTable")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .field("startup_hooks", &self.startup.len())
            .finish()
    }
}

fn create_object<T: ObjectType>(world: &mut World, name: &str) -> Handle {
    world.create_new::<T>(name).handle()
}

fn destroy_object<T: ObjectType>(world: &mut World, object: Handle) -> bool {
    if !object.is_valid(world) {
        return false;
    }
    T::on_destroy(world, object);
    true
}

fn is_instance<T: ObjectType>(store: &Store, entity: Entity) -> bool {
    store.has::<ObjectTag<T>>(entity)
}

fn object_instances<T: ObjectType>(store: &Store) -> Vec<Handle> {
    store
        .storage::<ObjectTag<T>>()
        .map(|s| s.iter().map(|(entity, _)| Handle::new(entity)).collect())
        .unwrap_or_default()
}

fn object_count<T: ObjectType>(store: &Store) -> usize {
    store.len::<ObjectTag<T>>()
}

fn attach_default<S: Default + 'static>(store: &mut Store, entity: Entity) {
    if let Err(err) = store.emplace(entity, S::default()) {
        warn!(%err, storage = std::any::type_name::<S>(), "could not attach start-up value");
    }
}

fn erase_cast<C: Component, T: ?Sized + 'static>(cast: fn(&C) -> &T) -> ErasedCast<T> {
    fn constrain<T: ?Sized, F>(f: F) -> F
    where
        F: for<'a> Fn(&'a dyn Any) -> Option<&'a T>,
    {
        f
    }
    Box::new(constrain(move |value: &dyn Any| value.downcast_ref::<C>().map(cast)))
}

/// Strips a trailing `Component` from a type name, unless nothing would remain.
#[must_use]
pub fn strip_component_suffix(name: &str) -> &str {
    match name.strip_suffix("Component") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

/// Process-wide map from type names to closure tables.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    objects: Vec<ObjectVTable>,
    object_index: HashMap<TypeHash, usize>,
    /// Catalogue of component types, in registration order.
    components: Vec<ComponentVTable>,
    component_index: HashMap<TypeHash, usize>,
    component_by_storage: HashMap<TypeId, usize>,
    /// Object type → components allowed on it.
    allowed: HashMap<TypeHash, Vec<&'static str>>,
    /// Object type → components attached at creation.
    at_start: HashMap<TypeHash, Vec<&'static str>>,
    /// Components allowed on, and attached to, every object.
    omnipresent: Vec<&'static str>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Registration --

    /// Register `T`, or return the existing registration.
    pub fn register_object<T: ObjectType>(&mut self) -> ObjectRegistration<'_, T> {
        let index = self.ensure_object::<T>();
        ObjectRegistration {
            registry: self,
            index,
            _marker: PhantomData,
        }
    }

    /// Register `C`, or return the existing registration.
    pub fn register_component<C: Component>(&mut self) -> ComponentRegistration<'_, C> {
        let index = self.ensure_component::<C>();
        ComponentRegistration {
            registry: self,
            index,
            _marker: PhantomData,
        }
    }

    pub(crate) fn ensure_object<T: ObjectType>(&mut self) -> usize {
        let hash = T::type_hash();
        if let Some(&index) = self.object_index.get(&hash) {
            return index;
        }
        let index = self.objects.len();
        self.objects.push(ObjectVTable::new::<T>());
        self.object_index.insert(hash, index);
        debug!(object_type = T::type_name(), %hash, "registered object type");
        index
    }

    pub(crate) fn ensure_component<C: Component>(&mut self) -> usize {
        let hash = TypeHash::from_name(C::type_name());
        if let Some(&index) = self.component_index.get(&hash) {
            return index;
        }
        let index = self.components.len();
        let vtable = ComponentVTable::new::<C>();
        self.component_by_storage.insert(vtable.storage_type, index);
        self.components.push(vtable);
        self.component_index.insert(hash, index);
        debug!(component = C::type_name(), %hash, "registered component type");
        index
    }

    /// Allow `component` on objects of type `object_type`.
    pub fn associate(&mut self, component: &'static str, object_type: &str) {
        push_unique(
            self.allowed.entry(TypeHash::from_name(object_type)).or_default(),
            component,
        );
    }

    fn attach_at_start(&mut self, component: &'static str, object_type: &str) {
        self.associate(component, object_type);
        push_unique(
            self.at_start.entry(TypeHash::from_name(object_type)).or_default(),
            component,
        );
    }

    fn make_omnipresent(&mut self, component: &'static str) {
        push_unique(&mut self.omnipresent, component);
    }

    // -- Resolution --

    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectVTable> {
        self.object_by_hash(TypeHash::from_name(name))
    }

    #[must_use]
    pub fn object_by_hash(&self, hash: TypeHash) -> Option<&ObjectVTable> {
        self.object_index.get(&hash).map(|&i| &self.objects[i])
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentVTable> {
        self.component_by_hash(TypeHash::from_name(name))
    }

    #[must_use]
    pub fn component_by_hash(&self, hash: TypeHash) -> Option<&ComponentVTable> {
        self.component_index.get(&hash).map(|&i| &self.components[i])
    }

    /// The component table whose values are stored as `storage_type`.
    #[must_use]
    pub fn component_by_storage(&self, storage_type: TypeId) -> Option<&ComponentVTable> {
        self.component_by_storage
            .get(&storage_type)
            .map(|&i| &self.components[i])
    }

    /// Every registered component type, in registration order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentVTable> {
        self.components.iter()
    }

    /// Every registered object type, in registration order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectVTable> {
        self.objects.iter()
    }

    /// Resolve a component table and pull an operation out of it.
    ///
    /// Unknown names and unsupported operations yield `None` and are logged.
    pub fn invoke<R>(
        &self,
        name: &str,
        op: &'static str,
        f: impl FnOnce(&ComponentVTable) -> Option<R>,
    ) -> Option<R> {
        let Some(vtable) = self.component(name) else {
            warn!(component = name, op, "unknown component type");
            return None;
        };
        let result = f(vtable);
        if result.is_none() {
            warn!(component = name, op, "operation not supported");
        }
        result
    }

    /// Resolve an object table and pull an operation out of it.
    ///
    /// Unknown names and unsupported operations yield `None` and are logged.
    pub fn invoke_object<R>(
        &self,
        name: &str,
        op: &'static str,
        f: impl FnOnce(&ObjectVTable) -> Option<R>,
    ) -> Option<R> {
        let Some(vtable) = self.object(name) else {
            warn!(object_type = name, op, "unknown object type");
            return None;
        };
        let result = f(vtable);
        if result.is_none() {
            warn!(object_type = name, op, "operation not supported");
        }
        result
    }

    // -- Associations --

    /// Returns `true` if `component` may be attached to objects of `object_type`.
    #[must_use]
    pub fn is_allowed(&self, object_type: TypeHash, component: &str) -> bool {
        self.omnipresent.contains(&component)
            || self
                .allowed
                .get(&object_type)
                .is_some_and(|names| names.iter().any(|&n| n == component))
    }

    /// Components allowed on `object_type`: its own set, then omnipresent ones.
    #[must_use]
    pub fn allowed_components(&self, object_type: TypeHash) -> Vec<&'static str> {
        let mut names = self.allowed.get(&object_type).cloned().unwrap_or_default();
        for &name in &self.omnipresent {
            push_unique(&mut names, name);
        }
        names
    }

    /// Components attached to every new instance of `object_type`.
    #[must_use]
    pub fn start_components(&self, object_type: TypeHash) -> Vec<&'static str> {
        let mut names = self.at_start.get(&object_type).cloned().unwrap_or_default();
        for &name in &self.omnipresent {
            push_unique(&mut names, name);
        }
        names
    }

    pub(crate) fn startup_hooks(&self, object_type: TypeHash) -> Vec<fn(&mut Store, Entity)> {
        self.object_by_hash(object_type)
            .map(|vt| vt.startup.iter().map(|&(_, hook)| hook).collect())
            .unwrap_or_default()
    }

    // -- Names --

    /// User-facing name of a registered component type.
    #[must_use]
    pub fn display_name(&self, name: &str) -> Option<&str> {
        self.component(name).map(|vt| vt.display_name.as_str())
    }

    /// Returns `true` if an object or component type is registered under `name`.
    #[must_use]
    pub fn is_class_registered(&self, name: &str) -> bool {
        let hash = TypeHash::from_name(name);
        self.object_index.contains_key(&hash) || self.component_index.contains_key(&hash)
    }

    /// The registered name behind a hash, object types first.
    #[must_use]
    pub fn class_name_by_id(&self, hash: TypeHash) -> Option<&'static str> {
        self.object_by_hash(hash)
            .map(|vt| vt.name)
            .or_else(|| self.component_by_hash(hash).map(|vt| vt.name))
    }
}

fn push_unique(names: &mut Vec<&'static str>, name: &'static str) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Builder returned by [`TypeRegistry::register_object`].
pub struct ObjectRegistration<'r, T> {
    registry: &'r mut TypeRegistry,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ObjectType> ObjectRegistration<'_, T> {
    /// Attach a default `S` to every new instance, accessible through
    /// [`World::storage`](crate::World::storage).
    #[must_use]
    pub fn with_storage<S: Default + 'static>(mut self) -> Self {
        let hooks = &mut self.registry.objects[self.index].startup;
        if !hooks.iter().any(|&(id, _)| id == TypeId::of::<S>()) {
            hooks.push((TypeId::of::<S>(), attach_default::<S>));
        }
        self
    }

    #[must_use]
    pub fn hash(&self) -> TypeHash {
        self.registry.objects[self.index].hash
    }
}

/// Builder returned by [`TypeRegistry::register_component`].
pub struct ComponentRegistration<'r, C> {
    registry: &'r mut TypeRegistry,
    index: usize,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Component> ComponentRegistration<'_, C> {
    /// Allow the component on objects of type `T`.
    #[must_use]
    pub fn allowed_in<T: ObjectType>(mut self) -> Self {
        self.registry.associate(C::type_name(), T::type_name());
        self
    }

    /// Allow the component on `T` and attach it to every new `T`.
    #[must_use]
    pub fn present_in<T: ObjectType>(mut self) -> Self {
        self.registry.attach_at_start(C::type_name(), T::type_name());
        self
    }

    /// Allow the component on every object type and attach it to every new object.
    #[must_use]
    pub fn omnipresent(mut self) -> Self {
        self.registry.make_omnipresent(C::type_name());
        self
    }

    /// Provide MessagePack serialize/deserialize operations.
    #[must_use]
    pub fn serializable(mut self) -> Self
    where
        C: Serialize + DeserializeOwned,
    {
        let vtable = &mut self.registry.components[self.index];
        vtable.serialize = Some(component::serialize::<C>);
        vtable.deserialize = Some(component::deserialize::<C>);
        self
    }

    /// Register a cast from `C` to `T`, typically a trait object.
    #[must_use]
    pub fn cast<T: ?Sized + 'static>(mut self, cast: fn(&C) -> &T) -> Self {
        self.registry.components[self.index]
            .casts
            .insert(TypeId::of::<T>(), Box::new(erase_cast::<C, T>(cast)));
        self
    }

    #[must_use]
    pub fn hash(&self) -> TypeHash {
        self.registry.components[self.index].hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape {
        fn area(&self) -> f32;
    }

    #[derive(Debug, Clone, Default)]
    struct CircleComponent {
        radius: f32,
    }

    impl Component for CircleComponent {
        fn type_name() -> &'static str {
            "CircleComponent"
        }
    }

    impl Shape for CircleComponent {
        fn area(&self) -> f32 {
            3.0 * self.radius * self.radius
        }
    }

    fn as_shape(circle: &CircleComponent) -> &(dyn Shape + 'static) {
        circle
    }

    struct Scene;

    impl ObjectType for Scene {
        fn type_name() -> &'static str {
            "Scene"
        }
    }

    struct Prop;

    impl ObjectType for Prop {
        fn type_name() -> &'static str {
            "Prop"
        }
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut registry = TypeRegistry::new();
        let first = registry.register_component::<CircleComponent>().hash();
        let second = registry.register_component::<CircleComponent>().hash();
        assert_eq!(first, second);
        assert_eq!(registry.components().count(), 1);

        registry.register_object::<Scene>();
        registry.register_object::<Scene>();
        assert_eq!(registry.objects().count(), 1);
    }

    #[test]
    fn test_resolve_by_name_and_hash() {
        let mut registry = TypeRegistry::new();
        registry.register_object::<Scene>();
        registry.register_component::<CircleComponent>();

        assert!(registry.is_class_registered("Scene"));
        assert!(registry.is_class_registered("CircleComponent"));
        assert!(!registry.is_class_registered("Nope"));
        assert_eq!(
            registry.class_name_by_id(TypeHash::from_name("Scene")),
            Some("Scene")
        );
        assert_eq!(registry.class_name_by_id(TypeHash::from_name("Nope")), None);
        assert_eq!(registry.component("CircleComponent").unwrap().display_name, "Circle");
    }

    #[test]
    fn test_association_is_order_independent() {
        let mut registry = TypeRegistry::new();
        let _ = registry.register_component::<CircleComponent>().present_in::<Prop>();
        registry.register_object::<Prop>();

        let prop = Prop::type_hash();
        assert!(registry.is_allowed(prop, "CircleComponent"));
        assert!(!registry.is_allowed(Scene::type_hash(), "CircleComponent"));
        assert_eq!(registry.start_components(prop), vec!["CircleComponent"]);
    }

    #[test]
    fn test_omnipresent_is_allowed_everywhere() {
        let mut registry = TypeRegistry::new();
        let _ = registry.register_component::<CircleComponent>().omnipresent();
        assert!(registry.is_allowed(Scene::type_hash(), "CircleComponent"));
        assert_eq!(
            registry.allowed_components(Prop::type_hash()),
            vec!["CircleComponent"]
        );
    }

    #[test]
    fn test_repeated_association_does_not_duplicate() {
        let mut registry = TypeRegistry::new();
        let _ = registry
            .register_component::<CircleComponent>()
            .present_in::<Prop>()
            .present_in::<Prop>()
            .allowed_in::<Prop>();
        assert_eq!(registry.allowed_components(Prop::type_hash()).len(), 1);
        assert_eq!(registry.start_components(Prop::type_hash()).len(), 1);
    }

    #[test]
    fn test_invoke_unknown_and_unsupported() {
        let mut registry = TypeRegistry::new();
        registry.register_component::<CircleComponent>();

        assert!(registry.invoke("Missing", "add", |vt| Some(vt.add)).is_none());
        assert!(
            registry
                .invoke("CircleComponent", "serialize", |vt| vt.serialize)
                .is_none()
        );
        assert!(
            registry
                .invoke("CircleComponent", "has", |vt| Some(vt.has))
                .is_some()
        );
    }

    #[test]
    fn test_cast_to_trait_object() {
        let mut registry = TypeRegistry::new();
        let _ = registry
            .register_component::<CircleComponent>()
            .cast::<dyn Shape>(as_shape);

        let vtable = registry.component("CircleComponent").unwrap();
        assert!(vtable.can_cast::<dyn Shape>());
        assert!(!vtable.can_cast::<dyn std::fmt::Debug>());

        let circle = CircleComponent { radius: 2.0 };
        let shape = vtable.cast::<dyn Shape>(&circle).unwrap();
        assert_eq!(shape.area(), 12.0);
        assert!(vtable.cast::<dyn Shape>(&5_u32).is_none());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(strip_component_suffix("HealthComponent"), "Health");
        assert_eq!(strip_component_suffix("Health"), "Health");
        assert_eq!(strip_component_suffix("Component"), "Component");

        let mut registry = TypeRegistry::new();
        registry.register_component::<CircleComponent>();
        assert_eq!(registry.display_name("CircleComponent"), Some("Circle"));
        assert_eq!(registry.display_name("Missing"), None);
    }
}
