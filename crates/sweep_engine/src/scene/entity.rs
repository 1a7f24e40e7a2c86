//! Scene entity

use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::physics::collision::CollisionShapes;

/// Something placed in the scene: a transform plus optional collision shapes
#[derive(Debug, Clone)]
pub struct Entity {
    /// Display / lookup name
    pub name: String,
    /// Position, rotation and scale
    pub transform: Transform,
    /// Bounding radius used only by the broad phase
    pub cull_distance: f32,
    /// Participates in collision detection
    pub collision_enabled: bool,
    /// Rendered
    pub visible: bool,
    shapes: CollisionShapes,
    world_shapes: CollisionShapes,
    world_matrix: Mat4,
    dirty: bool,
}

impl Entity {
    /// Create an entity at the origin with no shapes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            cull_distance: 0.0,
            collision_enabled: false,
            visible: true,
            shapes: CollisionShapes::new(),
            world_shapes: CollisionShapes::new(),
            world_matrix: Mat4::identity(),
            dirty: true,
        }
    }

    /// Set the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self.dirty = true;
        self
    }

    /// Attach collision shapes and enable collision.
    ///
    /// The cull distance grows to enclose the shapes if it was smaller.
    pub fn with_shapes(mut self, shapes: CollisionShapes) -> Self {
        self.cull_distance = self.cull_distance.max(shapes.bounding_radius());
        self.shapes = shapes;
        self.collision_enabled = true;
        self.dirty = true;
        self
    }

    /// Set the broad-phase radius
    pub fn with_cull_distance(mut self, cull_distance: f32) -> Self {
        self.cull_distance = cull_distance;
        self
    }

    /// Enable or disable collision detection
    pub fn with_collision(mut self, enabled: bool) -> Self {
        self.collision_enabled = enabled;
        self
    }

    /// Set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Current world position
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Move the entity; world data is stale until [`Entity::reset_matrix`]
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
        self.dirty = true;
    }

    /// Model-space shapes
    pub fn shapes(&self) -> &CollisionShapes {
        &self.shapes
    }

    /// Mutable model-space shapes; marks the entity dirty
    pub fn shapes_mut(&mut self) -> &mut CollisionShapes {
        self.dirty = true;
        &mut self.shapes
    }

    /// World-space shapes as of the last [`Entity::reset_matrix`]
    pub fn world_shapes(&self) -> &CollisionShapes {
        &self.world_shapes
    }

    /// World matrix as of the last [`Entity::reset_matrix`]
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// True when the transform or shapes changed since the last matrix update
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark world data stale
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Recompute the world matrix and world-space shapes
    pub fn reset_matrix(&mut self) {
        self.world_matrix = self.transform.to_matrix();
        self.world_shapes = self.shapes.to_world(&self.world_matrix, &self.transform.rotation);
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reset_matrix_refreshes_world_shapes() {
        let mut shapes = CollisionShapes::new();
        shapes.push_sphere(Vec3::zeros(), 1.0);
        let mut entity = Entity::new("ball").with_shapes(shapes);
        assert!(entity.collision_enabled);
        assert_relative_eq!(entity.cull_distance, 1.0);

        entity.set_position(Vec3::new(0.0, 5.0, 0.0));
        assert!(entity.is_dirty());
        entity.reset_matrix();
        assert!(!entity.is_dirty());
        assert_relative_eq!(entity.world_shapes().spheres()[0].center, Vec3::new(0.0, 5.0, 0.0));
    }
}
