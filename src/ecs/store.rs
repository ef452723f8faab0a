//! Dense component stores keyed by entity id.
//!
//! Every store is a set of parallel, pre-sized arrays indexed by
//! `Entity::index()` plus a presence flag per slot. Arrays are allocated once
//! at the configured capacity and never grow, so the physics loops index
//! straight into contiguous memory. Presence is tracked separately from the
//! value slots: a removed slot never reads as present, whatever it holds.

use super::entity::Entity;
use crate::error::{Error, Result};

/// Presence flags for one component, sized to the store capacity.
#[derive(Debug, Clone)]
pub struct Presence {
    present: Vec<bool>,
    count: usize,
}

impl Presence {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            present: vec![false; capacity],
            count: 0,
        }
    }

    /// Slot for `entity`, or a capacity error if it does not fit.
    #[inline]
    pub fn slot(&self, entity: Entity) -> Result<usize> {
        let i = entity.index();
        if i < self.present.len() {
            Ok(i)
        } else {
            Err(Error::CapacityExceeded {
                entity,
                capacity: self.present.len(),
            })
        }
    }

    /// Mark `entity` present, returning its slot.
    pub fn insert(&mut self, entity: Entity) -> Result<usize> {
        let i = self.slot(entity)?;
        if !self.present[i] {
            self.present[i] = true;
            self.count += 1;
        }
        Ok(i)
    }

    /// Clear presence. Returns the slot if the entity was present.
    pub fn remove(&mut self, entity: Entity) -> Option<usize> {
        let i = entity.index();
        match self.present.get_mut(i) {
            Some(present) if *present => {
                *present = false;
                self.count -= 1;
                Some(i)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.present.get(entity.index()).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.present.len()
    }

    /// Entities with this component, in id order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter(|&(_, &present)| present)
            .map(|(i, _)| Entity(i as u32))
    }
}

/// Fail unless both components of a vector write are finite.
pub(crate) fn ensure_finite(entity: Entity, x: f32, y: f32) -> Result<()> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(Error::NonFiniteVector { entity, x, y })
    }
}

/// A 2D vector component in SoA layout (Position, Velocity).
#[derive(Debug, Clone)]
pub struct VectorStore {
    x: Vec<f32>,
    y: Vec<f32>,
    presence: Presence,
}

impl VectorStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: vec![0.0; capacity],
            y: vec![0.0; capacity],
            presence: Presence::with_capacity(capacity),
        }
    }

    /// Attach the component, overwriting any previous value.
    ///
    /// NaN or infinite components are refused.
    pub fn add(&mut self, entity: Entity, x: f32, y: f32) -> Result<()> {
        ensure_finite(entity, x, y)?;
        let i = self.presence.insert(entity)?;
        self.x[i] = x;
        self.y[i] = y;
        Ok(())
    }

    /// Detach the component. Removing an absent component is a no-op.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.presence.remove(entity) {
            Some(i) => {
                self.x[i] = 0.0;
                self.y[i] = 0.0;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn has(&self, entity: Entity) -> bool {
        self.presence.contains(entity)
    }

    /// Get the value if present.
    pub fn get(&self, entity: Entity) -> Option<(f32, f32)> {
        self.has(entity).then(|| {
            let i = entity.index();
            (self.x[i], self.y[i])
        })
    }

    /// Overwrite the value of a present component.
    ///
    /// Returns false (and writes nothing) if the entity lacks the component.
    pub fn set(&mut self, entity: Entity, x: f32, y: f32) -> bool {
        if !self.has(entity) {
            return false;
        }
        let i = entity.index();
        self.x[i] = x;
        self.y[i] = y;
        true
    }

    /// X components slice, indexed by entity.
    pub fn xs(&self) -> &[f32] {
        &self.x
    }

    /// Y components slice, indexed by entity.
    pub fn ys(&self) -> &[f32] {
        &self.y
    }

    /// Presence plus both component slices for in-place mutation.
    pub fn parts_mut(&mut self) -> (&Presence, &mut [f32], &mut [f32]) {
        (&self.presence, &mut self.x, &mut self.y)
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn len(&self) -> usize {
        self.presence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }
}

/// Edge endpoints. The edge is its own entity, distinct from both endpoints.
#[derive(Debug, Clone)]
pub struct EdgeStore {
    source: Vec<Entity>,
    target: Vec<Entity>,
    presence: Presence,
}

impl EdgeStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            source: vec![Entity(0); capacity],
            target: vec![Entity(0); capacity],
            presence: Presence::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, edge: Entity, source: Entity, target: Entity) -> Result<()> {
        let i = self.presence.insert(edge)?;
        self.source[i] = source;
        self.target[i] = target;
        Ok(())
    }

    pub fn remove(&mut self, edge: Entity) -> bool {
        self.presence.remove(edge).is_some()
    }

    #[inline]
    pub fn has(&self, edge: Entity) -> bool {
        self.presence.contains(edge)
    }

    /// (source, target) of an edge entity.
    pub fn endpoints(&self, edge: Entity) -> Option<(Entity, Entity)> {
        self.has(edge).then(|| {
            let i = edge.index();
            (self.source[i], self.target[i])
        })
    }

    /// All (edge, source, target) triples in edge id order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, Entity, Entity)> + '_ {
        self.presence
            .iter()
            .map(|edge| (edge, self.source[edge.index()], self.target[edge.index()]))
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn len(&self) -> usize {
        self.presence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }
}

/// Presence-only component (FixedPosition).
#[derive(Debug, Clone)]
pub struct FlagStore {
    presence: Presence,
}

impl FlagStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            presence: Presence::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, entity: Entity) -> Result<()> {
        self.presence.insert(entity).map(|_| ())
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        self.presence.remove(entity).is_some()
    }

    #[inline]
    pub fn has(&self, entity: Entity) -> bool {
        self.presence.contains(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.presence.iter()
    }

    pub fn len(&self) -> usize {
        self.presence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }
}

/// One recorded force contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceSample {
    /// Entity the force was applied to (or the edge's source).
    pub source: Entity,
    /// Entity the force came from (or the edge's target).
    pub target: Entity,
    pub fx: f32,
    pub fy: f32,
}

/// Transient per-entity force vectors for inspection.
///
/// Entries are cleared and rewritten every step. The store remembers which
/// slots it wrote so clearing costs O(written), not O(capacity).
#[derive(Debug, Clone)]
pub struct DebugForceStore {
    source: Vec<Entity>,
    target: Vec<Entity>,
    fx: Vec<f32>,
    fy: Vec<f32>,
    presence: Presence,
    written: Vec<Entity>,
}

impl DebugForceStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            source: vec![Entity(0); capacity],
            target: vec![Entity(0); capacity],
            fx: vec![0.0; capacity],
            fy: vec![0.0; capacity],
            presence: Presence::with_capacity(capacity),
            written: Vec::new(),
        }
    }

    /// Record a sample for `entity`, replacing any earlier one this step.
    pub fn record(&mut self, entity: Entity, sample: ForceSample) {
        let Ok(i) = self.presence.slot(entity) else {
            return;
        };
        if !self.presence.contains(entity) {
            self.written.push(entity);
        }
        self.presence.present[i] = true;
        self.presence.count = self.written.len();
        self.source[i] = sample.source;
        self.target[i] = sample.target;
        self.fx[i] = sample.fx;
        self.fy[i] = sample.fy;
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.presence.remove(entity) {
            Some(i) => {
                self.written.retain(|&e| e != entity);
                self.fx[i] = 0.0;
                self.fy[i] = 0.0;
                true
            }
            None => false,
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        for entity in self.written.drain(..) {
            let i = entity.index();
            self.presence.present[i] = false;
            self.fx[i] = 0.0;
            self.fy[i] = 0.0;
        }
        self.presence.count = 0;
    }

    #[inline]
    pub fn has(&self, entity: Entity) -> bool {
        self.presence.contains(entity)
    }

    pub fn get(&self, entity: Entity) -> Option<ForceSample> {
        self.has(entity).then(|| {
            let i = entity.index();
            ForceSample {
                source: self.source[i],
                target: self.target[i],
                fx: self.fx[i],
                fy: self.fy[i],
            }
        })
    }

    pub fn fxs(&self) -> &[f32] {
        &self.fx
    }

    pub fn fys(&self) -> &[f32] {
        &self.fy
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn len(&self) -> usize {
        self.presence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }
}
