//! Force-directed physics over the entity/component world.
//!
//! `step` is a pure function of the world, the elapsed time and a
//! `ForceConfig`. `Simulation` bundles a world with a validated config so
//! that invalid coefficients are rejected before any store is touched.

mod config;
mod step;

pub use config::{ForceConfig, ForceConfigPatch};
pub use step::{GRAVITY_SCALE, step};

use crate::ecs::World;
use crate::error::{Error, Result};

/// A world plus the force configuration that drives it.
///
/// The external driver calls [`Simulation::step`] once per tick with the time
/// since the previous tick. The simulation keeps no clock of its own.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    config: ForceConfig,
    steps: u64,
}

impl Simulation {
    /// Create a simulation, rejecting an invalid config up front.
    pub fn new(world: World, config: ForceConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(capacity = world.capacity(), ?config, "simulation created");
        Ok(Self {
            world,
            config,
            steps: 0,
        })
    }

    /// Replace the force configuration between steps.
    ///
    /// On error the previous configuration stays in effect.
    pub fn set_config(&mut self, config: ForceConfig) -> Result<()> {
        config.validate()?;
        tracing::debug!(?config, "force config replaced");
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for the interaction layer between steps.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Number of steps run so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance the simulation by `elapsed` time units.
    pub fn step(&mut self, elapsed: f32) -> Result<()> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(Error::InvalidElapsed(elapsed));
        }

        tracing::trace!(
            step = self.steps,
            elapsed,
            nodes = self.world.positioned().count(),
            edges = self.world.edge.len(),
            "physics step"
        );
        step(&mut self.world, elapsed, &self.config);
        self.steps += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ForceConfig {
            damping: 2.0,
            ..Default::default()
        };
        assert!(Simulation::new(World::with_capacity(4), config).is_err());
    }

    #[test]
    fn test_set_config_keeps_previous_on_error() {
        let mut sim = Simulation::new(World::with_capacity(4), ForceConfig::default()).unwrap();
        let bad = ForceConfig {
            gravity_strength: f32::NAN,
            ..Default::default()
        };

        assert!(sim.set_config(bad).is_err());
        assert_eq!(sim.config(), &ForceConfig::default());

        let good = ForceConfig {
            spring_length: 100.0,
            ..Default::default()
        };
        sim.set_config(good).unwrap();
        assert_eq!(sim.config().spring_length, 100.0);
    }

    #[test]
    fn test_step_rejects_bad_elapsed_without_mutation() {
        let mut world = World::with_capacity(4);
        let a = world.spawn_node(10.0, 0.0).unwrap();
        let mut sim = Simulation::new(world, ForceConfig::default()).unwrap();

        assert_eq!(sim.step(-1.0), Err(Error::InvalidElapsed(-1.0)));
        assert!(sim.step(f32::NAN).is_err());
        assert_eq!(sim.world().position.get(a), Some((10.0, 0.0)));
        assert_eq!(sim.steps(), 0);

        sim.step(16.0).unwrap();
        assert_eq!(sim.steps(), 1);
    }

    #[test]
    fn test_zero_elapsed_leaves_positions() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(10.0, 0.0).unwrap();
        world.spawn_edge(a, b).unwrap();
        let mut sim = Simulation::new(world, ForceConfig::default()).unwrap();

        sim.step(0.0).unwrap();

        assert_eq!(sim.world().position.get(a), Some((0.0, 0.0)));
        assert_eq!(sim.world().position.get(b), Some((10.0, 0.0)));
    }

    #[test]
    fn test_connected_pair_settles_near_rest_length() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(-5.0, 0.0).unwrap();
        let b = world.spawn_node(5.0, 0.0).unwrap();
        world.spawn_edge(a, b).unwrap();
        let config = ForceConfig {
            repulsion_strength: 0.0,
            gravity_strength: 0.0,
            spring_length: 50.0,
            spring_stiffness: 0.05,
            damping: 0.5,
            ..Default::default()
        };
        let mut sim = Simulation::new(world, config).unwrap();

        for _ in 0..500 {
            sim.step(1.0).unwrap();
        }

        let (ax, _) = sim.world().position.get(a).unwrap();
        let (bx, _) = sim.world().position.get(b).unwrap();
        assert!(((bx - ax).abs() - 50.0).abs() < 0.5, "distance = {}", bx - ax);
    }
}
