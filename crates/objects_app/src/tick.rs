//! Fixed-timestep tick loop.
//!
//! Each tick runs, in order:
//!
//! 1. Component update hooks.
//! 2. Particle integration.
//! 3. Expiry, which only queues deletions.
//! 4. The deletion drain, the one safe point where objects are destroyed.
//! 5. Advance the tick counter.

use std::time::{Duration, Instant};

use objects_core::{Handle, World};
use tracing::{debug, info, warn};

use crate::scene;

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// Tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    world: World,
    /// Scene root; owns the per-node settings.
    root: Handle,
    /// Objects destroyed over the whole run.
    destroyed: usize,
}

impl TickLoop {
    /// Create a tick loop over an already populated world.
    #[must_use]
    pub fn new(config: TickConfig, world: World, root: Handle) -> Self {
        Self {
            tick_id: 0,
            config,
            world,
            root,
            destroyed: 0,
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Total objects destroyed so far.
    #[must_use]
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }

    /// Run one tick.
    pub fn tick(&mut self, dt: f64) {
        let dt = dt as f32;

        self.world.update_components(dt);
        scene::integrate(&mut self.world, self.root, dt);
        let queued = scene::expire(&mut self.world);

        let destroyed = self.world.clear_deleting_queue();
        self.destroyed += destroyed;
        self.tick_id += 1;

        debug!(
            tick_id = self.tick_id,
            dt,
            queued,
            destroyed,
            objects = self.world.total_objects(),
            "tick complete"
        );
    }

    /// Run for the configured number of ticks, or indefinitely.
    pub fn run(&mut self) {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration.as_secs_f64());

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, destroyed = self.destroyed, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
