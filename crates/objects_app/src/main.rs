//! # objects_app
//!
//! Registers the demo object and component types, builds a small scene and
//! runs the fixed-timestep tick loop. Each tick ends with the deletion drain.
//!
//! ## Environment
//!
//! - `RUST_LOG`: log filter, default `objects_app=info`.
//! - `OBJECTS_TICKS`: number of ticks to run, default 120 (0 = unlimited).
//! - `OBJECTS_PARTICLES`: particles to spawn, default 8.

mod scene;
mod tick;

use anyhow::{Context, Result};
use objects_core::World;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tick::{TickConfig, TickLoop};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("invalid {key}: {value:?}")),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("objects_app=info".parse()?))
        .init();

    let config = TickConfig {
        max_ticks: env_or("OBJECTS_TICKS", 120)?,
        ..TickConfig::default()
    };
    let particles: usize = env_or("OBJECTS_PARTICLES", 8)?;

    let mut world = World::new();
    scene::register(&mut world);
    let root = scene::populate(&mut world, particles);
    info!(
        objects = world.total_objects(),
        registered = world.registry().components().count(),
        "scene populated"
    );

    let copy = world.copy_object(root);
    info!(copy = world.name(copy).unwrap_or_default(), "duplicated scene root");

    let snapshot = world.snapshot_object(root)?;
    info!(
        object = %snapshot.name,
        components = snapshot.components.len(),
        bytes = snapshot.to_bytes()?.len(),
        "captured root snapshot"
    );

    let mut tick_loop = TickLoop::new(config, world, root);
    tick_loop.run();

    let report = scene::summary(tick_loop.world());
    println!("{}", serde_json::to_string_pretty(&report)?);

    let remaining = tick_loop.world_mut().delete_all_objects();
    info!(
        ticks = tick_loop.tick_id(),
        remaining,
        destroyed = tick_loop.destroyed(),
        "shut down"
    );
    Ok(())
}
