//! The world aggregate: one registry plus every component store.
//!
//! A `World` is an ordinary value owned by whoever runs the simulation, so
//! several independent simulations can live in one process.

use super::entity::{Entity, EntityRegistry};
use super::store::{DebugForceStore, EdgeStore, FlagStore, VectorStore, ensure_finite};
use crate::error::{Error, Result};

/// Default upper bound on entity ids per world.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Entity registry and component stores for one simulation.
///
/// Store fields are public: the physics step, the interaction layer and the
/// renderer all index into them directly.
#[derive(Debug)]
pub struct World {
    pub entities: EntityRegistry,
    pub position: VectorStore,
    pub velocity: VectorStore,
    pub edge: EdgeStore,
    pub fixed: FlagStore,
    pub debug_repulsion: DebugForceStore,
    pub debug_spring: DebugForceStore,
    pub debug_gravity: DebugForceStore,
    capacity: usize,
}

impl World {
    /// Create a world sized for `DEFAULT_CAPACITY` entities.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a world whose stores hold entity ids `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: EntityRegistry::with_capacity(capacity),
            position: VectorStore::with_capacity(capacity),
            velocity: VectorStore::with_capacity(capacity),
            edge: EdgeStore::with_capacity(capacity),
            fixed: FlagStore::with_capacity(capacity),
            debug_repulsion: DebugForceStore::with_capacity(capacity),
            debug_spring: DebugForceStore::with_capacity(capacity),
            debug_gravity: DebugForceStore::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // =========================================================================
    // Entity Lifecycle
    // =========================================================================

    /// Issue a new entity id.
    ///
    /// Fails once the next id would not fit the stores.
    pub fn spawn(&mut self) -> Result<Entity> {
        let next = self.entities.next_id();
        if next.index() >= self.capacity {
            tracing::warn!(%next, capacity = self.capacity, "entity capacity exhausted");
            return Err(Error::CapacityExceeded {
                entity: next,
                capacity: self.capacity,
            });
        }
        Ok(self.entities.create())
    }

    /// Spawn a node entity with Position and a zero Velocity.
    pub fn spawn_node(&mut self, x: f32, y: f32) -> Result<Entity> {
        ensure_finite(self.entities.next_id(), x, y)?;
        let entity = self.spawn()?;
        self.position.add(entity, x, y)?;
        self.velocity.add(entity, 0.0, 0.0)?;
        Ok(entity)
    }

    /// Spawn an edge entity connecting `source` to `target`.
    pub fn spawn_edge(&mut self, source: Entity, target: Entity) -> Result<Entity> {
        let entity = self.spawn()?;
        self.edge.add(entity, source, target)?;
        Ok(entity)
    }

    /// Mark an entity as no longer live.
    ///
    /// Component data is left in place; remove components explicitly.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.entities.destroy(entity)
    }

    /// Destroy an entity and drop every component it carries.
    pub fn despawn_with_components(&mut self, entity: Entity) -> bool {
        self.position.remove(entity);
        self.velocity.remove(entity);
        self.edge.remove(entity);
        self.fixed.remove(entity);
        self.debug_repulsion.remove(entity);
        self.debug_spring.remove(entity);
        self.debug_gravity.remove(entity);
        self.entities.destroy(entity)
    }

    // =========================================================================
    // Interaction Support
    // =========================================================================

    /// Exclude an entity from force application and integration.
    pub fn pin(&mut self, entity: Entity) -> Result<()> {
        self.ensure_live(entity)?;
        self.fixed.add(entity)
    }

    /// Return a pinned entity to the simulation.
    pub fn unpin(&mut self, entity: Entity) -> bool {
        self.fixed.remove(entity)
    }

    pub fn is_pinned(&self, entity: Entity) -> bool {
        self.fixed.has(entity)
    }

    /// Overwrite an entity's Position (e.g. while it is dragged).
    ///
    /// NaN or infinite coordinates are refused and leave the store untouched.
    pub fn set_position(&mut self, entity: Entity, x: f32, y: f32) -> Result<()> {
        self.ensure_live(entity)?;
        ensure_finite(entity, x, y)?;
        if self.position.has(entity) {
            self.position.set(entity, x, y);
            Ok(())
        } else {
            self.position.add(entity, x, y)
        }
    }

    /// Overwrite an entity's Velocity. Non-finite values are refused.
    pub fn set_velocity(&mut self, entity: Entity, x: f32, y: f32) -> Result<()> {
        self.ensure_live(entity)?;
        ensure_finite(entity, x, y)?;
        if self.velocity.has(entity) {
            self.velocity.set(entity, x, y);
            Ok(())
        } else {
            self.velocity.add(entity, x, y)
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Live entities carrying a Position, in creation order.
    pub fn positioned(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.live().filter(|&e| self.position.has(e))
    }

    /// Live entities carrying an Edge, in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (Entity, Entity, Entity)> + '_ {
        self.entities
            .live()
            .filter_map(|e| self.edge.endpoints(e).map(|(s, t)| (e, s, t)))
    }

    /// Bounding box of all live positioned entities.
    ///
    /// Returns (min_x, min_y, max_x, max_y), or None if nothing is positioned.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let xs = self.position.xs();
        let ys = self.position.ys();
        self.positioned().fold(None, |acc, e| {
            let (x, y) = (xs[e.index()], ys[e.index()]);
            Some(match acc {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            })
        })
    }

    fn ensure_live(&self, entity: Entity) -> Result<()> {
        if self.entities.is_live(entity) {
            Ok(())
        } else {
            Err(Error::UnknownEntity(entity))
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
