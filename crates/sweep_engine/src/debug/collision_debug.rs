//! Collision-specific debug visualization
//!
//! Turns the scene's world-space collision shapes and the contact points of a
//! [`FrameReport`] into [`DebugShape`]s. Reads only; nothing here feeds back
//! into the simulation.

use crate::animation::FrameReport;
use crate::debug::draw::{DebugDrawSystem, DebugShape};
use crate::foundation::math::{Vec3, Vec4};
use crate::scene::{Entity, Scene};

/// Color scheme for collision visualization
#[derive(Clone, Debug)]
pub struct CollisionDebugColors {
    /// Broad-phase cull spheres
    pub cull: Vec4,
    /// Collision spheres
    pub shape: Vec4,
    /// Plane normals and outlines
    pub plane: Vec4,
    /// Edges
    pub edge: Vec4,
    /// Contact markers
    pub contact: Vec4,
}

impl Default for CollisionDebugColors {
    fn default() -> Self {
        Self {
            cull: Vec4::new(0.5, 0.8, 1.0, 0.15),
            shape: Vec4::new(0.0, 1.0, 0.0, 0.3),
            plane: Vec4::new(1.0, 0.5, 0.0, 0.6),
            edge: Vec4::new(0.0, 1.0, 1.0, 0.6),
            contact: Vec4::new(1.0, 0.0, 0.0, 1.0),
        }
    }
}

/// Per-frame collision overlay
#[derive(Debug)]
pub struct CollisionDebugVisualizer {
    debug_draw: DebugDrawSystem,
    colors: CollisionDebugColors,

    /// Show broad-phase cull spheres
    pub show_cull: bool,

    /// Show collision shapes
    pub show_shapes: bool,

    /// Show contact points
    pub show_contacts: bool,

    /// Length of drawn plane normals
    pub normal_length: f32,
}

impl CollisionDebugVisualizer {
    /// Create a visualizer showing shapes and contacts
    pub fn new() -> Self {
        Self {
            debug_draw: DebugDrawSystem::new(),
            colors: CollisionDebugColors::default(),
            show_cull: false,
            show_shapes: true,
            show_contacts: true,
            normal_length: 2.0,
        }
    }

    /// Set custom color scheme
    pub fn with_colors(mut self, colors: CollisionDebugColors) -> Self {
        self.colors = colors;
        self
    }

    /// Replace the overlay with the state of `scene` and the contacts in `report`.
    ///
    /// Contact points are only present when the physics config records them.
    pub fn capture(&mut self, scene: &Scene, report: &FrameReport) {
        self.debug_draw.clear();
        for (_, entity) in scene.iter() {
            if !entity.collision_enabled {
                continue;
            }
            if self.show_cull {
                self.debug_draw
                    .draw_sphere(entity.position(), entity.cull_distance, self.colors.cull, 0.0);
            }
            if self.show_shapes {
                self.draw_shapes(entity);
            }
        }

        if self.show_contacts {
            for point in &report.contact_points {
                self.debug_draw.draw_cross(*point, 0.25, self.colors.contact, 0.0);
            }
        }
    }

    fn draw_shapes(&mut self, entity: &Entity) {
        let shapes = entity.world_shapes();
        for sphere in shapes.spheres() {
            self.debug_draw
                .draw_sphere(sphere.center, sphere.radius(), self.colors.shape, 0.0);
        }
        for plane in shapes.infinite_planes() {
            let anchor = entity.position() + plane.normal * plane.distance;
            self.debug_draw
                .draw_line(anchor, anchor + plane.normal * self.normal_length, self.colors.plane, 0.0);
        }
        for plane in shapes.finite_planes() {
            let c = plane.center;
            let (w, h) = (plane.half_width, plane.half_height);
            let corners = [c + w + h, c - w + h, c - w - h, c + w - h];
            for i in 0..corners.len() {
                self.debug_draw
                    .draw_line(corners[i], corners[(i + 1) % corners.len()], self.colors.plane, 0.0);
            }
            self.debug_draw
                .draw_line(c, c + plane.normal * self.normal_length, self.colors.plane, 0.0);
        }
        for edge in shapes.edges() {
            self.debug_draw.draw_line(edge.origin, edge.end(), self.colors.edge, 0.0);
        }
    }

    /// Expire shapes older than `delta_time`
    pub fn update(&mut self, delta_time: f32) {
        self.debug_draw.update(delta_time);
    }

    /// All debug shapes for rendering
    pub fn shapes(&self) -> impl Iterator<Item = &DebugShape> + '_ {
        self.debug_draw.shapes()
    }

    /// Enable/disable the overlay
    pub fn set_enabled(&mut self, enabled: bool) {
        self.debug_draw.enabled = enabled;
    }

    /// Underlying draw system
    pub fn debug_draw(&self) -> &DebugDrawSystem {
        &self.debug_draw
    }
}

impl Default for CollisionDebugVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::CollisionShapes;

    fn scene() -> Scene {
        let mut scene = Scene::new();
        let mut ball = CollisionShapes::new();
        ball.push_sphere(Vec3::zeros(), 1.0);
        scene.add_entity(Entity::new("ball").with_position(Vec3::new(0.0, 5.0, 0.0)).with_shapes(ball));

        let mut floor = CollisionShapes::new();
        floor.push_infinite_plane(Vec3::y(), 0.0).unwrap();
        scene.add_entity(Entity::new("floor").with_shapes(floor));
        scene
    }

    #[test]
    fn test_capture_draws_shapes_and_contacts() {
        let scene = scene();
        let report = FrameReport {
            contact_points: vec![Vec3::new(0.0, 1.01, 0.0)],
            ..Default::default()
        };

        let mut viz = CollisionDebugVisualizer::new();
        viz.capture(&scene, &report);
        let crosses = viz.shapes().filter(|s| matches!(s, DebugShape::Cross { .. })).count();
        let spheres = viz.shapes().filter(|s| matches!(s, DebugShape::Sphere { .. })).count();
        let lines = viz.shapes().filter(|s| matches!(s, DebugShape::Line { .. })).count();
        assert_eq!((crosses, spheres, lines), (1, 1, 1));

        viz.update(0.1);
        assert_eq!(viz.shapes().count(), 0);
    }

    #[test]
    fn test_cull_spheres_are_optional() {
        let scene = scene();
        let mut viz = CollisionDebugVisualizer::new();
        viz.show_cull = true;
        viz.show_shapes = false;
        viz.capture(&scene, &FrameReport::default());
        assert_eq!(viz.shapes().count(), 2);
    }
}
