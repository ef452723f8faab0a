//! R-tree hit testing over entity positions, using the rstar crate.
//!
//! The interaction layer uses this to find the entity under the pointer
//! before pinning and dragging it, and for box selection.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::ecs::{Entity, World};

/// Hit radius used when picking the entity under the pointer.
pub const DEFAULT_PICK_RADIUS: f32 = 20.0;

/// A positioned entity in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityPoint {
    pub entity: Entity,
    pub x: f32,
    pub y: f32,
}

impl RTreeObject for EntityPoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for EntityPoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Snapshot index of positioned entities.
///
/// Positions move every step, so the index is rebuilt from the world
/// rather than updated incrementally.
pub struct SpatialIndex {
    tree: RTree<EntityPoint>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk load every live positioned entity of `world`.
    pub fn from_world(world: &World) -> Self {
        let mut index = Self::new();
        index.rebuild(world);
        index
    }

    /// Replace the index contents with the current world positions.
    pub fn rebuild(&mut self, world: &World) {
        let xs = world.position.xs();
        let ys = world.position.ys();
        let points: Vec<_> = world
            .positioned()
            .map(|entity| EntityPoint {
                entity,
                x: xs[entity.index()],
                y: ys[entity.index()],
            })
            .collect();

        self.tree = RTree::bulk_load(points);
    }

    /// Nearest entity to a point.
    pub fn nearest(&self, x: f32, y: f32) -> Option<Entity> {
        self.tree.nearest_neighbor(&[x, y]).map(|p| p.entity)
    }

    /// Nearest entity within `radius` of a point.
    pub fn pick(&self, x: f32, y: f32, radius: f32) -> Option<Entity> {
        let radius_sq = radius * radius;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|p| p.distance_2(&[x, y]) <= radius_sq)
            .map(|p| p.entity)
    }

    /// All entities inside a rectangle.
    pub fn in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<Entity> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|p| p.entity)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
