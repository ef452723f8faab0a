//! Error types shared by the stores, the registry and the physics step.

use crate::ecs::Entity;

/// Errors surfaced to whatever owns the simulation loop.
///
/// Degenerate geometry and dangling edge endpoints are not errors: the
/// physics step recovers from them locally and never reports them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// An entity id does not fit the pre-sized component stores.
    #[error("{entity} exceeds store capacity of {capacity} entities")]
    CapacityExceeded { entity: Entity, capacity: usize },

    /// A force configuration value was rejected before simulation.
    #[error("invalid force config: `{field}` = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },

    /// Elapsed time handed to a step was negative or not finite.
    #[error("elapsed time must be finite and non-negative, got {0}")]
    InvalidElapsed(f32),

    /// A Position or Velocity write carried a NaN or infinite component.
    #[error("{entity} vector ({x}, {y}) must be finite")]
    NonFiniteVector { entity: Entity, x: f32, y: f32 },

    /// The entity was never issued by the registry or is no longer live.
    #[error("{0} is not a live entity")]
    UnknownEntity(Entity),
}

pub type Result<T> = std::result::Result<T, Error>;
