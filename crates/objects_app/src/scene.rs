//! Demo object and component types, and the per-tick systems that drive them.
//!
//! Two object types are registered: `Node` for a small scene graph and
//! `Particle` for short-lived objects spawned under an emitter chain.

use glam::{Quat, Vec3};
use objects_core::{Component, Entity, Handle, ObjectType, World};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Anything that can print a one-line summary of itself.
pub trait Inspect {
    fn inspect(&self) -> String;
}

/// Position, rotation and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Component for Transform {
    fn type_name() -> &'static str {
        "TransformComponent"
    }
}

impl Inspect for Transform {
    fn inspect(&self) -> String {
        let p = self.position;
        format!("at ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

impl Component for Velocity {
    fn type_name() -> &'static str {
        "VelocityComponent"
    }
}

/// Counts down every tick; expired particles are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self { remaining: 1.0 }
    }
}

impl Lifetime {
    #[must_use]
    pub fn expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

impl Component for Lifetime {
    fn type_name() -> &'static str {
        "LifetimeComponent"
    }

    fn on_update(&mut self, _owner: Entity, dt: f32) {
        self.remaining -= dt;
    }
}

impl Inspect for Lifetime {
    fn inspect(&self) -> String {
        format!("{:.2}s left", self.remaining.max(0.0))
    }
}

/// Per-type settings shared by every `Node`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSettings {
    pub gravity: Vec3,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

pub struct Node;

impl ObjectType for Node {
    fn type_name() -> &'static str {
        "Node"
    }
}

pub struct Particle;

impl ObjectType for Particle {
    fn type_name() -> &'static str {
        "Particle"
    }

    fn on_destroy(world: &mut World, object: Handle) {
        debug!(particle = world.name(object).unwrap_or_default(), "particle expired");
    }
}

fn transform_inspect(transform: &Transform) -> &(dyn Inspect + 'static) {
    transform
}

fn lifetime_inspect(lifetime: &Lifetime) -> &(dyn Inspect + 'static) {
    lifetime
}

/// Register every demo type. Safe to call more than once.
pub fn register(world: &mut World) {
    let _ = world.register_object::<Node>().with_storage::<NodeSettings>();
    world.register_object::<Particle>();

    let _ = world
        .register_component::<Transform>()
        .omnipresent()
        .serializable()
        .cast::<dyn Inspect>(transform_inspect);
    let _ = world
        .register_component::<Velocity>()
        .present_in::<Particle>()
        .serializable();
    let _ = world
        .register_component::<Lifetime>()
        .present_in::<Particle>()
        .serializable()
        .cast::<dyn Inspect>(lifetime_inspect);
}

/// Build a root node, two child nodes and a few particles.
pub fn populate(world: &mut World, particles: usize) -> Handle {
    let root = world.create_new::<Node>("Root").handle();
    for offset in [-1.0, 1.0] {
        let child = world.create_new::<Node>("Child").handle();
        world.add_child(root, child);
        if let Ok(transform) = world.component_mut::<Transform>(child) {
            transform.position = Vec3::new(offset, 0.0, 0.0);
        }
    }

    for i in 0..particles {
        let particle = world.create_new::<Particle>("Spark").handle();
        let speed = 1.0 + i as f32;
        if let Ok(velocity) = world.component_mut::<Velocity>(particle) {
            velocity.0 = Vec3::new(0.0, speed, 0.0);
        }
        if let Ok(lifetime) = world.component_mut::<Lifetime>(particle) {
            lifetime.remaining = 0.1 * speed;
        }
    }
    root
}

/// Move particles by their velocity and the node gravity.
pub fn integrate(world: &mut World, root: Handle, dt: f32) {
    let gravity = world
        .storage::<NodeSettings>(root)
        .map(|s| s.gravity)
        .unwrap_or(Vec3::ZERO);
    world.for_each::<Particle>(|world, particle| {
        let handle = particle.handle();
        let Ok(velocity) = world.component_mut::<Velocity>(handle) else {
            return;
        };
        velocity.0 += gravity * dt;
        let step = velocity.0 * dt;
        if let Ok(transform) = world.component_mut::<Transform>(handle) {
            transform.position += step;
        }
    });
}

/// Queue every particle whose lifetime ran out. Returns how many were queued.
pub fn expire(world: &mut World) -> usize {
    let mut queued = 0;
    world.for_each::<Particle>(|world, particle| {
        if world
            .component::<Lifetime>(particle.handle())
            .is_ok_and(Lifetime::expired)
        {
            world.delete_object(particle);
            queued += 1;
        }
    });
    queued
}

/// A serialisable view of one object, for the end-of-run report.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectSummary {
    pub name: String,
    pub object_type: String,
    pub parent: Option<String>,
    pub components: Vec<String>,
    pub details: Vec<String>,
}

/// Summarise every live object, sorted by name.
#[must_use]
pub fn summary(world: &World) -> Vec<ObjectSummary> {
    let mut objects: Vec<ObjectSummary> = world
        .objects()
        .into_iter()
        .filter_map(|handle| {
            let object = handle.resolve(world)?;
            let components = object.component_names().to_vec();
            let details = components
                .iter()
                .filter_map(|name| world.cast_by_name::<dyn Inspect>(handle, name))
                .map(|i| i.inspect())
                .collect();
            Some(ObjectSummary {
                name: object.name().to_string(),
                object_type: object.type_name().to_string(),
                parent: object
                    .parent()
                    .and_then(|p| world.name(p))
                    .map(str::to_string),
                components,
                details,
            })
        })
        .collect();
    objects.sort_by(|a, b| a.name.cmp(&b.name));
    objects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut world = World::new();
        register(&mut world);
        world
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut world = world();
        register(&mut world);
        assert_eq!(world.registry().components().count(), 3);
        assert_eq!(world.registry().objects().count(), 2);
        assert_eq!(world.registry().display_name("TransformComponent"), Some("Transform"));
    }

    #[test]
    fn test_populate_builds_hierarchy() {
        let mut world = world();
        let root = populate(&mut world, 2);
        assert_eq!(world.name(root), Some("Root"));
        assert_eq!(world.children(root).len(), 2);
        assert_eq!(world.name(world.children(root)[1]), Some("Child(1)"));
        assert_eq!(world.object_count::<Particle>(), 2);
        assert_eq!(world.alive_count::<Transform>(), 5);
        assert_eq!(world.alive_count::<Lifetime>(), 2);
    }

    #[test]
    fn test_velocity_not_allowed_on_nodes() {
        let mut world = world();
        let root = populate(&mut world, 0);
        assert!(world.add_component_by_name(root, "VelocityComponent").is_none());
        assert!(!world.has_component::<Velocity>(root));
    }

    #[test]
    fn test_integrate_moves_particles() {
        let mut world = world();
        let root = populate(&mut world, 1);
        let particle = world.find_object_by_name("Spark").unwrap();
        integrate(&mut world, root, 0.5);
        let position = world.component::<Transform>(particle).unwrap().position;
        assert!(position.y < 0.5);
        assert!(position.y > -10.0);
    }

    #[test]
    fn test_expired_particles_are_deleted_on_drain() {
        let mut world = world();
        populate(&mut world, 3);
        world.update_components(0.15);
        assert_eq!(expire(&mut world), 1);
        assert_eq!(world.object_count::<Particle>(), 3);
        assert_eq!(world.clear_deleting_queue(), 1);
        assert_eq!(world.object_count::<Particle>(), 2);
    }

    #[test]
    fn test_summary_uses_casts() {
        let mut world = world();
        populate(&mut world, 1);
        let summary = summary(&world);
        assert_eq!(summary.len(), 4);
        let spark = summary.iter().find(|o| o.name == "Spark").unwrap();
        assert_eq!(spark.object_type, "Particle");
        assert_eq!(spark.details.len(), 2);
        let child = summary.iter().find(|o| o.name == "Child").unwrap();
        assert_eq!(child.parent.as_deref(), Some("Root"));
    }
}
