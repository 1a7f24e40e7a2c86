//! Physics module for swept collision detection and response
//!
//! # Module Organization
//!
//! - [`collision`] - Shape store and analytic intersection routines
//! - [`broad_phase`] - Bounding-sphere culling per collision source
//! - [`narrow_phase`] - Exact swept tests producing closest-hit records
//! - [`hit`] - Closest-hit records and the bounded per-animation buffer
//! - [`resolver`] - Bounce, slide, nudge and mark responses
//! - [`error`] - Geometry and pipeline errors

pub mod broad_phase;
pub mod collision;
pub mod error;
pub mod hit;
pub mod narrow_phase;
pub mod resolver;

pub use broad_phase::cull_candidates;
pub use collision::{BoundingSphere, CollisionShapes, Ray, ShapeFlags, ShapeKind};
pub use error::{GeometryError, PhysicsError};
pub use hit::{ClosestHit, HitBuffer, HitMarker};
pub use narrow_phase::{DetectionStats, NarrowPhase, Segment, SweepPath, SweepSource};
