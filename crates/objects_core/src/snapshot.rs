//! MessagePack snapshots of single objects.
//!
//! A snapshot holds an object's name, type name and every serializable
//! component, keyed by component name. Components registered without
//! [`serializable`](crate::ComponentRegistration::serializable) are skipped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ObjectError;
use crate::handle::Handle;
use crate::world::World;

/// One encoded component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    /// `rmp-serde` payload with named fields.
    pub data: Vec<u8>,
}

/// A detached copy of one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub name: String,
    pub object_type: String,
    pub components: Vec<ComponentRecord>,
}

impl ObjectSnapshot {
    /// Encode the whole snapshot to MessagePack.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Encode`] if serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ObjectError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// # Errors
    ///
    /// Returns [`ObjectError::Decode`] if the bytes are not a snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ObjectError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

impl World {
    /// Encode one component of `object`.
    pub fn serialize_component(&self, object: Handle, name: &str) -> Result<Vec<u8>, ObjectError> {
        if !object.is_valid(self) {
            return Err(ObjectError::InvalidHandle(object.entity()));
        }
        let vtable = self
            .registry
            .component(name)
            .ok_or_else(|| ObjectError::UnknownType(name.to_string()))?;
        let serialize = vtable.serialize.ok_or_else(|| ObjectError::Unsupported {
            name: name.to_string(),
            op: "serialize",
        })?;
        let bytes = serialize(&self.store, object.entity()).ok_or(ObjectError::MissingComponent {
            component: vtable.name,
            entity: object.entity(),
        })?;
        Ok(bytes?)
    }

    /// Decode a component onto `object`, adding it first if absent.
    pub fn deserialize_component(
        &mut self,
        object: Handle,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), ObjectError> {
        if !object.is_valid(self) {
            return Err(ObjectError::InvalidHandle(object.entity()));
        }
        let vtable = self
            .registry
            .component(name)
            .ok_or_else(|| ObjectError::UnknownType(name.to_string()))?;
        let deserialize = vtable.deserialize.ok_or_else(|| ObjectError::Unsupported {
            name: name.to_string(),
            op: "deserialize",
        })?;
        let component = vtable.name;

        if self.add_component_by_name(object, name).is_none() {
            return Err(ObjectError::NotAllowed {
                component: name.to_string(),
                object_type: self.object_type_name(object).unwrap_or_default().to_string(),
            });
        }
        if deserialize(&mut self.store, object.entity(), bytes)? {
            Ok(())
        } else {
            Err(ObjectError::MissingComponent {
                component,
                entity: object.entity(),
            })
        }
    }

    /// Capture `object` and its serializable components.
    pub fn snapshot_object(&self, object: Handle) -> Result<ObjectSnapshot, ObjectError> {
        let descriptor = self
            .descriptor(object)
            .ok_or(ObjectError::InvalidHandle(object.entity()))?;
        let object_type = self
            .registry
            .class_name_by_id(descriptor.object_type())
            .ok_or_else(|| ObjectError::UnknownType(descriptor.object_type().to_string()))?;

        let mut components = Vec::new();
        for name in descriptor.component_names() {
            let serializable = self
                .registry
                .component(name)
                .is_some_and(|vt| vt.serialize.is_some());
            if !serializable {
                debug!(component = %name, "skipping component without serializer");
                continue;
            }
            components.push(ComponentRecord {
                name: name.clone(),
                data: self.serialize_component(object, name)?,
            });
        }

        Ok(ObjectSnapshot {
            name: descriptor.name().to_string(),
            object_type: object_type.to_string(),
            components,
        })
    }

    /// Create a new object from a snapshot. The name is disambiguated.
    pub fn restore_object(&mut self, snapshot: &ObjectSnapshot) -> Result<Handle, ObjectError> {
        let object = self.create_object(&snapshot.object_type, &snapshot.name);
        if !object.is_valid(self) {
            return Err(ObjectError::UnknownType(snapshot.object_type.clone()));
        }
        for record in &snapshot.components {
            if let Err(err) = self.deserialize_component(object, &record.name, &record.data) {
                self.delete_object(object);
                return Err(err);
            }
        }
        debug!(object = %snapshot.name, %object, "object restored");
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::object::ObjectType;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Stats {
        level: u32,
        title: String,
    }

    impl Component for Stats {
        fn type_name() -> &'static str {
            "Stats"
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Scratch;

    impl Component for Scratch {
        fn type_name() -> &'static str {
            "Scratch"
        }
    }

    struct Hero;

    impl ObjectType for Hero {
        fn type_name() -> &'static str {
            "Hero"
        }
    }

    fn world() -> World {
        let mut world = World::new();
        world.register_object::<Hero>();
        let _ = world
            .register_component::<Stats>()
            .allowed_in::<Hero>()
            .serializable();
        let _ = world.register_component::<Scratch>().allowed_in::<Hero>();
        world
    }

    #[test]
    fn test_snapshot_skips_unserializable() {
        let mut world = world();
        let hero = world.create_new::<Hero>("Hero").handle();
        *world.add_component::<Stats>(hero).unwrap() = Stats {
            level: 3,
            title: "knight".into(),
        };
        world.add_component::<Scratch>(hero).unwrap();

        let snapshot = world.snapshot_object(hero).unwrap();
        assert_eq!(snapshot.object_type, "Hero");
        assert_eq!(snapshot.components.len(), 1);
        assert_eq!(snapshot.components[0].name, "Stats");

        let decoded: Stats = rmp_serde::from_slice(&snapshot.components[0].data).unwrap();
        assert_eq!(decoded.level, 3);
        assert_eq!(decoded.title, "knight");
    }

    #[test]
    fn test_restore_creates_equivalent_object() {
        let mut world = world();
        let hero = world.create_new::<Hero>("Hero").handle();
        world.add_component::<Stats>(hero).unwrap().level = 9;

        let bytes = world.snapshot_object(hero).unwrap().to_bytes().unwrap();
        let snapshot = ObjectSnapshot::from_bytes(&bytes).unwrap();
        let restored = world.restore_object(&snapshot).unwrap();

        assert_ne!(restored, hero);
        assert_eq!(world.name(restored), Some("Hero(1)"));
        assert_eq!(world.component::<Stats>(restored).unwrap().level, 9);
    }

    #[test]
    fn test_unsupported_and_unknown() {
        let mut world = world();
        let hero = world.create_new::<Hero>("Hero").handle();
        world.add_component::<Scratch>(hero).unwrap();
        assert!(matches!(
            world.serialize_component(hero, "Scratch"),
            Err(ObjectError::Unsupported { op: "serialize", .. })
        ));
        assert!(matches!(
            world.serialize_component(hero, "Nope"),
            Err(ObjectError::UnknownType(_))
        ));
        assert!(matches!(
            world.serialize_component(hero, "Stats"),
            Err(ObjectError::MissingComponent { .. })
        ));

        let bad = ObjectSnapshot {
            name: "X".into(),
            object_type: "Villain".into(),
            components: Vec::new(),
        };
        assert!(matches!(world.restore_object(&bad), Err(ObjectError::UnknownType(_))));
    }

    #[test]
    fn test_corrupt_payload_is_decode_error() {
        let mut world = world();
        let hero = world.create_new::<Hero>("Hero").handle();
        assert!(matches!(
            world.deserialize_component(hero, "Stats", &[0xc1]),
            Err(ObjectError::Decode(_))
        ));
    }
}
