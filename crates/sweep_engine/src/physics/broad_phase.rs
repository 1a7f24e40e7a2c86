//! Broad-phase culling
//!
//! A swept bounding-sphere test per (source, entity) pair. The bound is
//! conservative: the source may travel `reach` this frame, so any entity
//! farther than `reach + both cull radii` cannot be touched.

use log::trace;

use crate::physics::collision::{BoundingSphere, ShapeFlags};
use crate::scene::{EntityId, Scene};

/// Fill `mask` (indexed like [`Scene::iter`]) with the entities the source
/// may hit this frame. Returns the number of candidates.
///
/// Entities carrying an infinite plane are always candidates.
pub fn cull_candidates(scene: &Scene, source: EntityId, reach: f32, mask: &mut Vec<bool>) -> usize {
    mask.clear();
    mask.resize(scene.len(), false);

    let Some(source_entity) = scene.get(source) else {
        return 0;
    };
    let source_bound = BoundingSphere::new(source_entity.position(), source_entity.cull_distance);

    let mut count = 0;
    for (slot, (id, other)) in mask.iter_mut().zip(scene.iter()) {
        if id == source || !other.collision_enabled {
            continue;
        }
        let unbounded = other.world_shapes().flags().contains(ShapeFlags::INFINITE_PLANE);
        let other_bound = BoundingSphere::new(other.position(), other.cull_distance);
        if unbounded || source_bound.within_reach(&other_bound, reach) {
            *slot = true;
            count += 1;
        }
    }

    trace!("{} broad-phase candidates for {:?}", count, source);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::collision::CollisionShapes;
    use crate::scene::Entity;

    fn ball(scene: &mut Scene, name: &str, position: Vec3, radius: f32) -> EntityId {
        let mut shapes = CollisionShapes::new();
        shapes.push_sphere(Vec3::zeros(), radius);
        scene.add_entity(Entity::new(name).with_position(position).with_shapes(shapes))
    }

    #[test]
    fn test_distance_against_reach_and_radii() {
        let mut scene = Scene::new();
        let source = ball(&mut scene, "source", Vec3::zeros(), 1.0);
        ball(&mut scene, "near", Vec3::new(10.0, 0.0, 0.0), 1.0);
        ball(&mut scene, "far", Vec3::new(100.0, 0.0, 0.0), 1.0);

        let mut mask = Vec::new();
        let count = cull_candidates(&scene, source, 8.0, &mut mask);
        assert_eq!(count, 1);
        assert_eq!(mask, vec![false, true, false]);
    }

    #[test]
    fn test_infinite_planes_and_disabled_entities() {
        let mut scene = Scene::new();
        let source = ball(&mut scene, "source", Vec3::zeros(), 1.0);

        let mut floor = CollisionShapes::new();
        floor.push_infinite_plane(Vec3::y(), 0.0).unwrap();
        scene.add_entity(Entity::new("floor").with_position(Vec3::new(0.0, -1000.0, 0.0)).with_shapes(floor));

        let mut ghost = CollisionShapes::new();
        ghost.push_sphere(Vec3::zeros(), 5.0);
        scene.add_entity(Entity::new("ghost").with_shapes(ghost).with_collision(false));

        let mut mask = Vec::new();
        assert_eq!(cull_candidates(&scene, source, 0.0, &mut mask), 1);
        assert_eq!(mask, vec![false, true, false]);
    }
}
