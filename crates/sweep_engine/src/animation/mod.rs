//! Animation module
//!
//! # Module Organization
//!
//! - [`state`] - Lifecycle states and allowed transitions
//! - [`particles`] - Particle arrays for point-source animations
//! - [`record`] - Per-object animation record, kinds and responses
//! - [`diagnostics`] - Per-frame counters
//! - [`scheduler`] - The frame pipeline driving every animation

pub mod diagnostics;
pub mod particles;
pub mod record;
pub mod scheduler;
pub mod state;

pub use diagnostics::FrameReport;
pub use particles::ParticleSystem;
pub use record::{particles_exhausted, Animation, AnimationKind, CollisionResponse, EndCondition, LaunchParams, Motion};
pub use scheduler::Scheduler;
pub use state::AnimationState;
