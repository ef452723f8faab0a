//! Entity identifiers and the registry that issues them.
//!
//! An entity is nothing but an integer. All of its data lives in the
//! component stores, indexed by that integer. The registry only answers
//! "which ids have been issued" and "which of them are still live".

use std::fmt;

/// Opaque entity identifier.
///
/// Ids are issued in increasing order and never reused within the lifetime
/// of a registry, so an id doubles as a dense index into component stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(pub u32);

impl Entity {
    /// Create an Entity from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Slot of this entity in dense component arrays.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl From<u32> for Entity {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<Entity> for u32 {
    #[inline]
    fn from(entity: Entity) -> Self {
        entity.0
    }
}

/// Issues entity ids and tracks liveness.
///
/// Destroying an entity does not touch any component store; callers remove
/// components explicitly.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Liveness per issued id. `alive.len()` is the next id to issue.
    alive: Vec<bool>,
    live_count: usize,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry expecting roughly `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            alive: Vec::with_capacity(capacity),
            live_count: 0,
        }
    }

    /// Issue a fresh id and mark it live.
    pub fn create(&mut self) -> Entity {
        let entity = Entity(self.alive.len() as u32);
        self.alive.push(true);
        self.live_count += 1;
        entity
    }

    /// Mark an entity as no longer live.
    ///
    /// Returns false if the id was never issued or is already destroyed.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        match self.alive.get_mut(entity.index()) {
            Some(alive) if *alive => {
                *alive = false;
                self.live_count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Check whether an entity is live.
    #[inline]
    pub fn is_live(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// All live entities in creation order.
    pub fn live(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .map(|(i, _)| Entity(i as u32))
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// The id the next call to `create` will return.
    pub fn next_id(&self) -> Entity {
        Entity(self.alive.len() as u32)
    }
}
