//! Force Graph - WASM Module
//!
//! Force-directed graph layout over an entity/component data store. Nodes and
//! edges are plain integer entities whose data lives in dense per-component
//! arrays; a four-pass physics step (repulsion, gravity, springs,
//! integration) advances positions once per tick. The module is compiled to
//! WebAssembly and exposes a JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `ecs`: Entity registry, component stores and the `World` aggregate
//! - `physics`: Force configuration, the physics step and `Simulation`
//! - `graph`: petgraph bridge for loading graphs and topology queries
//! - `spatial`: R-tree spatial indexing for pointer hit testing
//!
//! Rendering, pointer handling and the frame loop live on the JavaScript
//! side. They read the zero-copy buffer views and call `step` once per frame.

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

pub mod ecs;
pub mod error;
pub mod graph;
pub mod physics;
pub mod spatial;

use ecs::{DEFAULT_CAPACITY, Entity, World};
use graph::Topology;
use physics::{ForceConfig, ForceConfigPatch, Simulation};
use spatial::SpatialIndex;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::debug_1(&JsValue::from_str("force-graph-wasm initialized"));
}

/// Main entry point for the force graph.
///
/// Wraps a `Simulation` and a spatial index and exposes them to JavaScript.
#[wasm_bindgen]
pub struct ForceGraphWasm {
    sim: Simulation,
    spatial: SpatialIndex,
}

#[wasm_bindgen]
impl ForceGraphWasm {
    /// Create an empty world sized for 100,000 entities, with default forces.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ForceGraphWasm, JsError> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty world whose stores hold `capacity` entity ids.
    #[wasm_bindgen(js_name = withCapacity)]
    pub fn with_capacity(capacity: usize) -> Result<ForceGraphWasm, JsError> {
        Ok(Self {
            sim: Simulation::new(World::with_capacity(capacity), ForceConfig::default())?,
            spatial: SpatialIndex::new(),
        })
    }

    // =========================================================================
    // Entity Registry
    // =========================================================================

    /// Issue a new entity id with no components.
    #[wasm_bindgen(js_name = createEntity)]
    pub fn create_entity(&mut self) -> Result<u32, JsError> {
        Ok(self.world_mut().spawn()?.raw())
    }

    /// Mark an entity as no longer live. Components are left in place.
    ///
    /// Returns false if the entity was unknown or already destroyed.
    #[wasm_bindgen(js_name = destroyEntity)]
    pub fn destroy_entity(&mut self, entity: u32) -> bool {
        self.world_mut().despawn(Entity(entity))
    }

    /// Live entity ids in creation order.
    #[wasm_bindgen(js_name = liveEntities)]
    pub fn live_entities(&self) -> Vec<u32> {
        self.world().entities.live().map(Entity::raw).collect()
    }

    /// Number of live entities.
    #[wasm_bindgen(js_name = liveCount)]
    pub fn live_count(&self) -> u32 {
        self.world().entities.live_count() as u32
    }

    /// Create a node entity with Position and a zero Velocity.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, x: f32, y: f32) -> Result<u32, JsError> {
        Ok(self.world_mut().spawn_node(x, y)?.raw())
    }

    /// Create an edge entity connecting two node entities.
    #[wasm_bindgen(js_name = connect)]
    pub fn connect(&mut self, source: u32, target: u32) -> Result<u32, JsError> {
        Ok(self
            .world_mut()
            .spawn_edge(Entity(source), Entity(target))?
            .raw())
    }

    // =========================================================================
    // Component Stores
    // =========================================================================

    #[wasm_bindgen(js_name = addPosition)]
    pub fn add_position(&mut self, entity: u32, x: f32, y: f32) -> Result<(), JsError> {
        Ok(self.world_mut().position.add(Entity(entity), x, y)?)
    }

    #[wasm_bindgen(js_name = removePosition)]
    pub fn remove_position(&mut self, entity: u32) -> bool {
        self.world_mut().position.remove(Entity(entity))
    }

    #[wasm_bindgen(js_name = hasPosition)]
    pub fn has_position(&self, entity: u32) -> bool {
        self.world().position.has(Entity(entity))
    }

    #[wasm_bindgen(js_name = addVelocity)]
    pub fn add_velocity(&mut self, entity: u32, x: f32, y: f32) -> Result<(), JsError> {
        Ok(self.world_mut().velocity.add(Entity(entity), x, y)?)
    }

    #[wasm_bindgen(js_name = removeVelocity)]
    pub fn remove_velocity(&mut self, entity: u32) -> bool {
        self.world_mut().velocity.remove(Entity(entity))
    }

    #[wasm_bindgen(js_name = hasVelocity)]
    pub fn has_velocity(&self, entity: u32) -> bool {
        self.world().velocity.has(Entity(entity))
    }

    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(&mut self, edge: u32, source: u32, target: u32) -> Result<(), JsError> {
        Ok(self
            .world_mut()
            .edge
            .add(Entity(edge), Entity(source), Entity(target))?)
    }

    #[wasm_bindgen(js_name = removeEdge)]
    pub fn remove_edge(&mut self, edge: u32) -> bool {
        self.world_mut().edge.remove(Entity(edge))
    }

    #[wasm_bindgen(js_name = hasEdge)]
    pub fn has_edge(&self, edge: u32) -> bool {
        self.world().edge.has(Entity(edge))
    }

    /// Get an edge's [source, target], or None if it has no Edge component.
    #[wasm_bindgen(js_name = getEdgeEndpoints)]
    pub fn get_edge_endpoints(&self, edge: u32) -> Option<Vec<u32>> {
        self.world()
            .edge
            .endpoints(Entity(edge))
            .map(|(s, t)| vec![s.raw(), t.raw()])
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Pin an entity (exclude it from force application and integration).
    #[wasm_bindgen(js_name = pinEntity)]
    pub fn pin_entity(&mut self, entity: u32) -> Result<(), JsError> {
        Ok(self.world_mut().pin(Entity(entity))?)
    }

    /// Unpin an entity.
    #[wasm_bindgen(js_name = unpinEntity)]
    pub fn unpin_entity(&mut self, entity: u32) -> bool {
        self.world_mut().unpin(Entity(entity))
    }

    #[wasm_bindgen(js_name = isPinned)]
    pub fn is_pinned(&self, entity: u32) -> bool {
        self.world().is_pinned(Entity(entity))
    }

    /// Overwrite an entity's position, e.g. while it is dragged.
    #[wasm_bindgen(js_name = setPosition)]
    pub fn set_position(&mut self, entity: u32, x: f32, y: f32) -> Result<(), JsError> {
        Ok(self.world_mut().set_position(Entity(entity), x, y)?)
    }

    /// Overwrite an entity's velocity.
    #[wasm_bindgen(js_name = setVelocity)]
    pub fn set_velocity(&mut self, entity: u32, x: f32, y: f32) -> Result<(), JsError> {
        Ok(self.world_mut().set_velocity(Entity(entity), x, y)?)
    }

    #[wasm_bindgen(js_name = getX)]
    pub fn get_x(&self, entity: u32) -> Option<f32> {
        self.world().position.get(Entity(entity)).map(|(x, _)| x)
    }

    #[wasm_bindgen(js_name = getY)]
    pub fn get_y(&self, entity: u32) -> Option<f32> {
        self.world().position.get(Entity(entity)).map(|(_, y)| y)
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance the layout by `elapsed` milliseconds.
    pub fn step(&mut self, elapsed: f32) -> Result<(), JsError> {
        Ok(self.sim.step(elapsed)?)
    }

    /// Update the force configuration from a (possibly partial) JS object.
    ///
    /// Missing fields keep their current values, including a center set with
    /// `setCenter`. Invalid values are rejected and the previous
    /// configuration stays in effect.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, patch: JsValue) -> Result<(), JsError> {
        let patch: ForceConfigPatch = serde_wasm_bindgen::from_value(patch)?;
        let config = self.sim.config().merged(&patch);
        Ok(self.sim.set_config(config)?)
    }

    /// Get the current force configuration as a JS object.
    #[wasm_bindgen(js_name = getConfig)]
    pub fn get_config(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(self.sim.config())?)
    }

    /// Set the gravity target, usually the viewport center.
    #[wasm_bindgen(js_name = setCenter)]
    pub fn set_center(&mut self, x: f32, y: f32) -> Result<(), JsError> {
        let config = ForceConfig {
            center_x: x,
            center_y: y,
            ..*self.sim.config()
        };
        Ok(self.sim.set_config(config)?)
    }

    // =========================================================================
    // Buffer Access (Zero-Copy)
    // =========================================================================

    /// Get a zero-copy view of X positions, indexed by entity id.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for rendering, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().position.xs()) }
    }

    /// Get a zero-copy view of Y positions, indexed by entity id.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().position.ys()) }
    }

    /// Get a zero-copy view of X velocities.
    #[wasm_bindgen(js_name = getVelocitiesXView)]
    pub fn get_velocities_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().velocity.xs()) }
    }

    /// Get a zero-copy view of Y velocities.
    #[wasm_bindgen(js_name = getVelocitiesYView)]
    pub fn get_velocities_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().velocity.ys()) }
    }

    /// Get a zero-copy view of the last repulsion force X per entity.
    ///
    /// Slots without a recorded force read as zero.
    #[wasm_bindgen(js_name = getRepulsionXView)]
    pub fn get_repulsion_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().debug_repulsion.fxs()) }
    }

    #[wasm_bindgen(js_name = getRepulsionYView)]
    pub fn get_repulsion_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().debug_repulsion.fys()) }
    }

    /// Get a zero-copy view of spring force X, indexed by edge entity.
    #[wasm_bindgen(js_name = getSpringXView)]
    pub fn get_spring_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().debug_spring.fxs()) }
    }

    #[wasm_bindgen(js_name = getSpringYView)]
    pub fn get_spring_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().debug_spring.fys()) }
    }

    #[wasm_bindgen(js_name = getGravityXView)]
    pub fn get_gravity_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().debug_gravity.fxs()) }
    }

    #[wasm_bindgen(js_name = getGravityYView)]
    pub fn get_gravity_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.world().debug_gravity.fys()) }
    }

    /// Get a recorded repulsion sample as [source, target, fx, fy].
    #[wasm_bindgen(js_name = getRepulsionSample)]
    pub fn get_repulsion_sample(&self, entity: u32) -> Option<Vec<f32>> {
        self.world()
            .debug_repulsion
            .get(Entity(entity))
            .map(|s| vec![s.source.raw() as f32, s.target.raw() as f32, s.fx, s.fy])
    }

    /// Length of every store buffer (the world capacity).
    #[wasm_bindgen(js_name = bufferLen)]
    pub fn buffer_len(&self) -> usize {
        self.world().capacity()
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Rebuild the spatial index from current positions.
    ///
    /// Call after stepping or dragging, before hit testing.
    #[wasm_bindgen(js_name = rebuildSpatialIndex)]
    pub fn rebuild_spatial_index(&mut self) {
        self.spatial.rebuild(self.sim.world());
    }

    /// Find the nearest entity within `radius` of a world-space point.
    #[wasm_bindgen(js_name = findEntityAt)]
    pub fn find_entity_at(&self, x: f32, y: f32, radius: f32) -> Option<u32> {
        self.spatial.pick(x, y, radius).map(Entity::raw)
    }

    /// Find all entities within a rectangular region.
    #[wasm_bindgen(js_name = findEntitiesInRect)]
    pub fn find_entities_in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<u32> {
        self.spatial
            .in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(Entity::raw)
            .collect()
    }

    // =========================================================================
    // Graph Utilities
    // =========================================================================

    /// Node entities connected to `entity` by an edge in either direction.
    #[wasm_bindgen(js_name = getNeighbors)]
    pub fn get_neighbors(&self, entity: u32) -> Vec<u32> {
        Topology::from_world(self.world())
            .neighbors(Entity(entity))
            .into_iter()
            .map(Entity::raw)
            .collect()
    }

    /// Get the bounding box of all live positioned entities.
    ///
    /// Returns [min_x, min_y, max_x, max_y], or None if nothing is positioned.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f32>> {
        self.world()
            .bounds()
            .map(|(min_x, min_y, max_x, max_y)| vec![min_x, min_y, max_x, max_y])
    }
}

impl ForceGraphWasm {
    fn world(&self) -> &World {
        self.sim.world()
    }

    fn world_mut(&mut self) -> &mut World {
        self.sim.world_mut()
    }
}
