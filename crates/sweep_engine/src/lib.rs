//! # Sweep Engine
//!
//! Frame-stepped animation and swept collision for real-time 3D scenes.
//!
//! ## Features
//!
//! - **Animations**: transform, ballistic, particle and edge-probe kinds with a
//!   small lifecycle state machine
//! - **Swept collision**: continuous detection between spheres, planes, edges
//!   and points, so fast movers are caught mid-frame
//! - **Responses**: bounce, slide, nudge-on-strike and mark
//! - **Configuration**: every tuning constant loadable from TOML or RON
//! - **Debug overlay**: contact points and shapes as plain debug shapes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sweep_engine::prelude::*;
//!
//! let mut scene = Scene::new();
//! let mut floor = CollisionShapes::new();
//! floor.push_infinite_plane(Vec3::y(), 0.0).unwrap();
//! scene.add_entity(Entity::new("floor").with_shapes(floor));
//!
//! let mut ball = CollisionShapes::new();
//! ball.push_sphere(Vec3::zeros(), 1.0);
//! let id = scene.add_entity(Entity::new("ball").with_shapes(ball));
//!
//! let mut scheduler = Scheduler::new(PhysicsConfig::default()).unwrap();
//! let launch = LaunchParams::new(Vec3::new(0.0, 10.0, 0.0), Vec3::zeros());
//! scheduler.push(Animation::base(id, Vec3::zeros(), 1.0).with_launch(launch));
//!
//! let mut clock = FixedTimestep::new(1.0 / 60.0);
//! for _ in 0..600 {
//!     let report = scheduler.tick(&mut scene, &mut clock);
//!     assert!(report.iterations <= scheduler.config().max_iterations);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Configuration
pub mod config;
pub mod core;

// Building blocks
pub mod foundation;
pub mod physics;
pub mod scene;

// Frame pipeline
pub mod animation;

// Side channels
pub mod debug;

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{
            Animation, AnimationKind, AnimationState, CollisionResponse, FrameReport, LaunchParams,
            ParticleSystem, Scheduler,
        },
        config::{Config, ConfigError},
        core::{PhysicsConfig, SimulationConfig},
        foundation::{
            math::{Transform, Vec3},
            time::{Clock, FixedTimestep, Timer},
        },
        physics::{CollisionShapes, PhysicsError, ShapeKind},
        scene::{Entity, EntityId, Scene},
    };
}
