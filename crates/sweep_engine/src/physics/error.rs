//! Error types for geometry tests and collision resolution

use crate::config::ConfigError;
use crate::scene::EntityId;
use thiserror::Error;

/// Failure of a primitive intersection test
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// A direction or normal had zero length
    #[error("degenerate input: zero-length {0}")]
    Degenerate(&'static str),

    /// An intermediate value became NaN or infinite
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Physics pipeline errors
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// Primitive test failure
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A resolved contact broke a pipeline invariant (negative t0, negative remainder, ...)
    #[error("invariant violated by animation {animation}: {detail}")]
    InvariantViolation {
        /// Animation label
        animation: String,
        /// What went wrong
        detail: String,
    },

    /// An animation targets an entity that is no longer in the scene
    #[error("entity {0:?} is not in the scene")]
    MissingEntity(EntityId),

    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
