//! Topology bridge between petgraph and the entity world.
//!
//! The world stores nodes and edges as loose entities. This module loads a
//! petgraph `StableGraph` into a world (node entities first, then one edge
//! entity per graph edge) and builds a `StableGraph` view back out of a world
//! for neighbor and degree queries.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};
use std::collections::HashMap;

use crate::ecs::{Entity, World};
use crate::error::Result;

/// Entities created by [`import_graph`].
#[derive(Debug, Default)]
pub struct GraphImport {
    /// Node entity per source graph node.
    pub nodes: HashMap<NodeIndex, Entity>,
    /// Edge entities in source edge order.
    pub edges: Vec<Entity>,
}

/// Load a graph whose node weights are initial (x, y) positions.
///
/// Every node becomes an entity with Position and a zero Velocity; every
/// edge becomes an entity with an Edge component. Fails without partial
/// rollback if the world runs out of capacity.
pub fn import_graph<E>(
    world: &mut World,
    graph: &StableGraph<(f32, f32), E, Directed>,
) -> Result<GraphImport> {
    let mut import = GraphImport {
        nodes: HashMap::with_capacity(graph.node_count()),
        edges: Vec::with_capacity(graph.edge_count()),
    };

    for index in graph.node_indices() {
        let (x, y) = graph[index];
        import.nodes.insert(index, world.spawn_node(x, y)?);
    }

    for edge in graph.edge_references() {
        let source = import.nodes[&edge.source()];
        let target = import.nodes[&edge.target()];
        import.edges.push(world.spawn_edge(source, target)?);
    }

    tracing::debug!(
        nodes = import.nodes.len(),
        edges = import.edges.len(),
        "graph imported"
    );
    Ok(import)
}

/// Directed graph view of a world's live nodes and edges.
///
/// Node weights are node entities, edge weights are edge entities. Edges
/// whose endpoints are not live positioned entities are left out.
pub struct Topology {
    graph: StableGraph<Entity, Entity, Directed>,
    index: HashMap<Entity, NodeIndex>,
}

impl Topology {
    /// Snapshot the topology of `world`.
    pub fn from_world(world: &World) -> Self {
        let mut graph = StableGraph::with_capacity(world.position.len(), world.edge.len());
        let mut index = HashMap::with_capacity(world.position.len());

        for entity in world.positioned() {
            index.insert(entity, graph.add_node(entity));
        }

        for (edge, source, target) in world.edges() {
            if let (Some(&s), Some(&t)) = (index.get(&source), index.get(&target)) {
                graph.add_edge(s, t, edge);
            }
        }

        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Entities connected to `entity` by an edge in either direction.
    pub fn neighbors(&self, entity: Entity) -> Vec<Entity> {
        self.index
            .get(&entity)
            .map(|&index| {
                self.graph
                    .neighbors_undirected(index)
                    .filter_map(|n| self.graph.node_weight(n).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// (out-degree, in-degree) of a node entity.
    pub fn degree(&self, entity: Entity) -> Option<(usize, usize)> {
        self.index.get(&entity).map(|&index| {
            (
                self.graph.edges_directed(index, Direction::Outgoing).count(),
                self.graph.edges_directed(index, Direction::Incoming).count(),
            )
        })
    }

    /// Edge entities touching `entity`.
    pub fn incident_edges(&self, entity: Entity) -> Vec<Entity> {
        self.index
            .get(&entity)
            .map(|&index| {
                self.graph
                    .edges_directed(index, Direction::Outgoing)
                    .chain(self.graph.edges_directed(index, Direction::Incoming))
                    .map(|e| *e.weight())
                    .collect()
            })
            .unwrap_or_default()
    }
}
