//! Debug drawing primitives and system
//!
//! Shapes are plain data for a renderer to pick up. Each one expires after
//! its duration.

use crate::foundation::math::{Vec3, Vec4};

/// Debug shape primitives that can be rendered for visualization
#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    /// Line segment from start to end
    Line {
        /// Start point
        start: Vec3,
        /// End point
        end: Vec3,
        /// RGBA color
        color: Vec4,
        /// Seconds left
        duration: f32,
    },

    /// Wireframe sphere
    Sphere {
        /// Center
        center: Vec3,
        /// Radius
        radius: f32,
        /// RGBA color
        color: Vec4,
        /// Seconds left
        duration: f32,
    },

    /// Three axis-aligned lines crossing at a point
    Cross {
        /// Center
        position: Vec3,
        /// Half length of each arm
        size: f32,
        /// RGBA color
        color: Vec4,
        /// Seconds left
        duration: f32,
    },
}

impl DebugShape {
    fn duration_mut(&mut self) -> &mut f32 {
        match self {
            DebugShape::Line { duration, .. }
            | DebugShape::Sphere { duration, .. }
            | DebugShape::Cross { duration, .. } => duration,
        }
    }

    /// Remaining duration
    pub fn duration(&self) -> f32 {
        match self {
            DebugShape::Line { duration, .. }
            | DebugShape::Sphere { duration, .. }
            | DebugShape::Cross { duration, .. } => *duration,
        }
    }

    /// Set duration (returns modified shape)
    pub fn with_duration(mut self, new_duration: f32) -> Self {
        *self.duration_mut() = new_duration;
        self
    }

    /// Decrease duration by delta_time, returns true if expired
    pub fn tick(&mut self, delta_time: f32) -> bool {
        let duration = self.duration_mut();
        *duration -= delta_time;
        *duration <= 0.0
    }
}

/// Collects debug shapes for a renderer
#[derive(Debug)]
pub struct DebugDrawSystem {
    shapes: Vec<DebugShape>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawSystem {
    /// Create a new debug draw system
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            enabled: true,
        }
    }

    fn push(&mut self, shape: DebugShape) {
        if self.enabled {
            self.shapes.push(shape);
        }
    }

    /// Draw a line segment
    pub fn draw_line(&mut self, start: Vec3, end: Vec3, color: Vec4, duration: f32) {
        self.push(DebugShape::Line { start, end, color, duration });
    }

    /// Draw a sphere
    pub fn draw_sphere(&mut self, center: Vec3, radius: f32, color: Vec4, duration: f32) {
        self.push(DebugShape::Sphere { center, radius, color, duration });
    }

    /// Draw a cross marker
    pub fn draw_cross(&mut self, position: Vec3, size: f32, color: Vec4, duration: f32) {
        self.push(DebugShape::Cross { position, size, color, duration });
    }

    /// Update shape lifetimes and remove expired shapes
    pub fn update(&mut self, delta_time: f32) {
        if !self.enabled {
            return;
        }
        self.shapes.retain_mut(|shape| !shape.tick(delta_time));
    }

    /// All shapes for rendering, in drawing order
    pub fn shapes(&self) -> impl Iterator<Item = &DebugShape> + '_ {
        let enabled = self.enabled;
        self.shapes.iter().filter(move |_| enabled)
    }

    /// Number of stored shapes
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Clear all shapes
    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

impl Default for DebugDrawSystem {
    fn default() -> Self {
        Self::new()
    }
}
