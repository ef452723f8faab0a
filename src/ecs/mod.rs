//! Entity/component data store.
//!
//! Entities are plain integer ids issued by an `EntityRegistry`. Components
//! live in dense per-attribute arrays indexed by those ids, collected in a
//! `World` that the simulation owns and passes to the physics step.

mod entity;
mod store;
mod world;

pub use entity::{Entity, EntityRegistry};
pub use store::{DebugForceStore, EdgeStore, FlagStore, ForceSample, Presence, VectorStore};
pub use world::{DEFAULT_CAPACITY, World};
