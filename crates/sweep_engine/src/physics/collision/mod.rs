//! Collision geometry
//!
//! # Module Organization
//!
//! - [`primitives`] - Analytic intersection routines (ray/sphere, ray/plane, segment crossing)
//! - [`shape`] - Per-entity collision descriptor store
//!
//! Shapes are stored in model space and transformed to world space when the
//! owning entity's matrix is recomputed.

pub mod primitives;
pub mod shape;

pub use primitives::{
    finite_plane_contains, plane_intersect, segment_crossing, swept_ray_sphere, BoundingSphere, Ray,
};
pub use shape::{
    CollisionShapes, EdgeShape, FinitePlaneShape, InfinitePlaneShape, ShapeFlags, ShapeKind, SphereShape,
};
