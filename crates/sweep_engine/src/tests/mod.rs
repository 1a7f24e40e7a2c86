//! Whole-pipeline tests driving the scheduler over small scenes

mod properties;

use crate::foundation::math::Vec3;
use crate::physics::collision::CollisionShapes;
use crate::scene::{Entity, EntityId, Scene};

fn add_ball(scene: &mut Scene, name: &str, position: Vec3, radius: f32) -> EntityId {
    let mut shapes = CollisionShapes::new();
    shapes.push_sphere(Vec3::zeros(), radius);
    scene.add_entity(Entity::new(name).with_position(position).with_shapes(shapes))
}

fn add_floor(scene: &mut Scene) -> EntityId {
    let mut shapes = CollisionShapes::new();
    shapes
        .push_infinite_plane(Vec3::y(), 0.0)
        .expect("unit normal");
    scene.add_entity(Entity::new("floor").with_shapes(shapes))
}
