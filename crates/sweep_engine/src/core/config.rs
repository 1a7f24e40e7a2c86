//! # Simulation Configuration
//!
//! Tuning knobs for the collision and animation pipeline. Every value has a
//! default matching the behaviour of the stock scheduler, and the whole tree
//! can be loaded from TOML or RON through the [`Config`] trait.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// Maximum closest-hit records buffered per animation per resolve iteration.
///
/// When more contacts are found the farthest ones are dropped; they are found
/// again on the next iteration if they still matter.
pub const MAX_CONTACTS: usize = 8;

/// # Physics Configuration
///
/// Constants used by integration, detection and resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration along -Y (units/s²), scaled per animation
    pub gravity: f32,
    /// Resolve-loop iteration cap per frame
    pub max_iterations: u32,
    /// Velocity factor kept after a bounce (energy loss)
    pub bounce_drag: f32,
    /// Speed removed per second of contact by the slide response (units/s²)
    pub slide_deceleration: f32,
    /// Distance a plane contact point is backed off along the path
    pub contact_skin: f32,
    /// Deepest starting overlap (distance units) still reported as a contact
    pub penetration_tolerance: f32,
    /// Fraction of the striking speed transferred to a struck animation
    pub target_nudge: f32,
    /// Slack allowed on t0 before it counts as an invariant violation
    pub t0_epsilon: f32,
    /// Keep contact points in the frame report for debug overlays
    pub record_contact_points: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            max_iterations: 10,
            bounce_drag: 0.8,
            slide_deceleration: 20.0,
            contact_skin: 0.01,
            penetration_tolerance: 1.0,
            target_nudge: 0.15,
            t0_epsilon: 1.0e-4,
            record_contact_points: false,
        }
    }
}

impl PhysicsConfig {
    /// Set gravity
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the resolve-loop iteration cap
    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Set the bounce drag factor
    pub fn with_bounce_drag(mut self, drag: f32) -> Self {
        self.bounce_drag = drag;
        self
    }

    /// Enable contact point recording
    pub fn with_contact_points(mut self, enabled: bool) -> Self {
        self.record_contact_points = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid { field, reason: format!("{value} is not finite") })
            }
        }

        finite("gravity", self.gravity)?;
        finite("bounce_drag", self.bounce_drag)?;
        finite("slide_deceleration", self.slide_deceleration)?;
        finite("contact_skin", self.contact_skin)?;
        finite("target_nudge", self.target_nudge)?;
        finite("t0_epsilon", self.t0_epsilon)?;

        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "max_iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.bounce_drag <= 0.0 || self.bounce_drag > 1.0 {
            return Err(ConfigError::Invalid {
                field: "bounce_drag",
                reason: format!("{} is outside (0, 1]", self.bounce_drag),
            });
        }
        if self.contact_skin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "contact_skin",
                reason: "cannot be negative".to_string(),
            });
        }
        if self.penetration_tolerance.is_nan() || self.penetration_tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "penetration_tolerance",
                reason: "must be a non-negative distance".to_string(),
            });
        }
        if self.slide_deceleration < 0.0 || self.t0_epsilon < 0.0 {
            return Err(ConfigError::Invalid {
                field: "slide_deceleration",
                reason: "deceleration and t0 slack cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

impl Config for PhysicsConfig {}

/// # Simulation Configuration
///
/// What a host application loads: physics tuning plus frame pacing and logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Physics tuning
    pub physics: PhysicsConfig,
    /// Fixed frame delta in seconds; `None` follows the wall clock
    pub fixed_delta: Option<f32>,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            fixed_delta: Some(1.0 / 60.0),
            log_level: "info".to_string(),
        }
    }
}

impl Config for SimulationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PhysicsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_drag_and_iterations() {
        let config = PhysicsConfig::default().with_bounce_drag(1.5);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "bounce_drag", .. })));

        let config = PhysicsConfig::default().with_max_iterations(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "max_iterations", .. })));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = "fixed_delta = 0.1\n[physics]\ngravity = 386.22\nmax_iterations = 4\n";
        let config = SimulationConfig::from_str_with_format(text, "sim.toml").unwrap();
        assert_eq!(config.fixed_delta, Some(0.1));
        assert_eq!(config.physics.gravity, 386.22);
        assert_eq!(config.physics.max_iterations, 4);
        assert_eq!(config.physics.bounce_drag, 0.8);
    }

    #[test]
    fn test_ron_round_trip_through_text() {
        let text = "(physics: (bounce_drag: 0.5), log_level: \"debug\")";
        let config = SimulationConfig::from_str_with_format(text, "sim.ron").unwrap();
        assert_eq!(config.physics.bounce_drag, 0.5);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = PhysicsConfig::from_str_with_format("", "physics.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
