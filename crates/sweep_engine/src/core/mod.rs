//! Core engine settings

pub mod config;

pub use config::{PhysicsConfig, SimulationConfig, MAX_CONTACTS};
