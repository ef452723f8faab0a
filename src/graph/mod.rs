//! Graph topology on top of the entity world.
//!
//! Uses petgraph's StableGraph to load graphs into a world and to answer
//! neighbor/degree queries that the dense component stores do not index.

mod topology;

pub use topology::{GraphImport, Topology, import_graph};
