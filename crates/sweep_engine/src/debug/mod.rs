//! Debug module for visualization tools
//!
//! A read-only side channel: the overlay describes the collision state of a
//! frame and never changes it.

pub mod collision_debug;
pub mod draw;

pub use collision_debug::{CollisionDebugColors, CollisionDebugVisualizer};
pub use draw::{DebugDrawSystem, DebugShape};
