//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree index over entity positions for
//! pointer picking and rectangle selection.

mod rtree;

pub use rtree::{DEFAULT_PICK_RADIUS, EntityPoint, SpatialIndex};
