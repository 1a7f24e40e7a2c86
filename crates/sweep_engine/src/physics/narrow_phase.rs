//! Narrow-phase collision detection
//!
//! Exact swept tests between one moving source and the shapes of every
//! broad-phase candidate. Sources come in two flavours:
//!
//! - **Body**: the entity's spheres swept along this frame's displacement
//! - **Segments**: independent segments (particle paths, probe edges)
//!
//! Targets are spheres, infinite planes and finite planes; edges and points
//! are only ever sources. Entities and shapes are visited in scene order so
//! ties resolve the same way every run.

use log::warn;

use crate::core::PhysicsConfig;
use crate::foundation::math::{Vec3, DEGENERATE_LENGTH_SQUARED};
use crate::physics::collision::{
    finite_plane_contains, plane_intersect, segment_crossing, swept_ray_sphere, ShapeKind,
};
use crate::physics::error::GeometryError;
use crate::physics::hit::{ClosestHit, HitBuffer, HitMarker};
use crate::scene::{Entity, EntityId, Scene};

/// Straight path of a point-like source for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// World position at the start of the frame
    pub start: Vec3,
    /// Travel this frame
    pub vector: Vec3,
    /// Kind of the source shape (point or edge)
    pub source_kind: ShapeKind,
    /// Index of the source shape or particle
    pub source_index: usize,
    /// Inactive segments are skipped
    pub active: bool,
}

/// How a source moves this frame
#[derive(Debug, Clone, Copy)]
pub enum SweepPath<'a> {
    /// Rigid displacement of the whole entity
    Body {
        /// Displacement this frame
        delta: Vec3,
        /// Length of `delta`
        delta_length: f32,
    },
    /// Independent segments
    Segments(&'a [Segment]),
}

/// Everything the detector needs to know about a moving source
#[derive(Debug, Clone, Copy)]
pub struct SweepSource<'a> {
    /// Source entity
    pub entity: EntityId,
    /// Motion this frame
    pub path: SweepPath<'a>,
    /// Entity position at the start of the current sweep
    pub last_position: Vec3,
    /// Source velocity, copied into every record
    pub velocity: Vec3,
    /// Marker resolved in the previous iteration
    pub last_hit: Option<HitMarker>,
    /// Markers already consumed this frame
    pub ignored: &'a [HitMarker],
}

impl SweepSource<'_> {
    fn skips(&self, marker: &HitMarker) -> bool {
        self.last_hit.as_ref() == Some(marker) || self.ignored.contains(marker)
    }
}

/// Counters from one detection sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionStats {
    /// Shape pairs tested
    pub hit_tests: u32,
    /// Tests aborted because of degenerate or non-finite input
    pub degenerate_inputs: u32,
}

struct SphereSweep {
    origin: Vec3,
    path: Vec3,
    length: f32,
    radius: f32,
    body_start: Vec3,
    source_index: usize,
}

/// Narrow-phase detector
pub struct NarrowPhase<'a> {
    config: &'a PhysicsConfig,
}

impl<'a> NarrowPhase<'a> {
    /// Create a detector using the given tuning
    pub fn new(config: &'a PhysicsConfig) -> Self {
        Self { config }
    }

    /// Test `source` against every candidate entity and push contacts into `hits`.
    ///
    /// `candidates` is indexed like [`Scene::iter`].
    pub fn detect(
        &self,
        scene: &Scene,
        source: &SweepSource<'_>,
        candidates: &[bool],
        hits: &mut HitBuffer,
        stats: &mut DetectionStats,
    ) {
        let Some(source_entity) = scene.get(source.entity) else {
            return;
        };

        for ((target_id, target), candidate) in scene.iter().zip(candidates) {
            if !*candidate || target_id == source.entity {
                continue;
            }

            match source.path {
                SweepPath::Body { delta, delta_length } => {
                    if delta_length <= 0.0 {
                        return;
                    }
                    let path = delta / delta_length;
                    for (source_index, sphere) in source_entity.world_shapes().spheres().iter().enumerate() {
                        let sweep = SphereSweep {
                            origin: sphere.center - delta,
                            path,
                            length: delta_length,
                            radius: sphere.radius(),
                            body_start: source.last_position,
                            source_index,
                        };
                        self.sweep_sphere(&sweep, source, target_id, target, hits, stats);
                    }
                }
                SweepPath::Segments(segments) => {
                    for segment in segments.iter().filter(|s| s.active) {
                        self.sweep_segment(segment, source, target_id, target, hits, stats);
                    }
                }
            }
        }
    }

    fn sweep_sphere(
        &self,
        sweep: &SphereSweep,
        source: &SweepSource<'_>,
        target_id: EntityId,
        target: &Entity,
        hits: &mut HitBuffer,
        stats: &mut DetectionStats,
    ) {
        let shapes = target.world_shapes();
        let record = |kind, index, distance: f32, normal, point| ClosestHit {
            marker: HitMarker {
                entity: target_id,
                kind,
                index,
            },
            t0: distance.max(0.0) / sweep.length,
            distance,
            normal,
            point,
            source_kind: ShapeKind::Sphere,
            source_index: sweep.source_index,
            striking_velocity: source.velocity,
        };

        for (index, other) in shapes.spheres().iter().enumerate() {
            let marker = HitMarker {
                entity: target_id,
                kind: ShapeKind::Sphere,
                index,
            };
            if source.skips(&marker) {
                continue;
            }
            stats.hit_tests += 1;

            let reach = sweep.radius + other.radius();
            let result = swept_ray_sphere(&sweep.path, &(other.center - sweep.origin), reach * reach);
            let Some(hit) = checked(result, stats, "sphere-sphere") else {
                continue;
            };
            if hit > sweep.length || hit < -self.config.penetration_tolerance {
                continue;
            }

            let travel = hit.max(0.0);
            let normal = sweep.origin + sweep.path * travel - other.center;
            let point = sweep.body_start + sweep.path * travel;
            hits.push(record(ShapeKind::Sphere, index, hit, normal, point));
        }

        for (index, plane) in shapes.infinite_planes().iter().enumerate() {
            let marker = HitMarker {
                entity: target_id,
                kind: ShapeKind::InfinitePlane,
                index,
            };
            if source.skips(&marker) {
                continue;
            }
            stats.hit_tests += 1;

            let plane_point = target.position() + plane.normal * plane.distance;
            let side = (sweep.origin - plane_point).dot(&plane.normal);
            let facing = if side >= 0.0 { plane.normal } else { -plane.normal };

            if side.abs() < sweep.radius {
                // Already overlapping: push back out when moving deeper. A
                // center behind the plane is only recovered within tolerance.
                let depth = sweep.radius - side.abs();
                let recoverable = side >= 0.0 || depth <= self.config.penetration_tolerance;
                if sweep.path.dot(&facing) < 0.0 && recoverable {
                    let point = sweep.body_start + facing * (depth + self.config.contact_skin);
                    hits.push(record(ShapeKind::InfinitePlane, index, -depth, facing, point));
                }
                continue;
            }

            let offset_plane = plane_point + facing * sweep.radius;
            let result = plane_intersect(&offset_plane, &plane.normal, &sweep.origin, &sweep.path);
            let Some(hit) = checked(result, stats, "sphere-plane") else {
                continue;
            };
            if hit > sweep.length {
                continue;
            }

            let backed = hit - hit.min(self.config.contact_skin);
            let point = sweep.body_start + sweep.path * backed;
            hits.push(record(ShapeKind::InfinitePlane, index, hit, facing, point));
        }

        for (index, plane) in shapes.finite_planes().iter().enumerate() {
            let marker = HitMarker {
                entity: target_id,
                kind: ShapeKind::FinitePlane,
                index,
            };
            if source.skips(&marker) {
                continue;
            }
            stats.hit_tests += 1;

            let side = (sweep.origin - plane.center).dot(&plane.normal);
            if side.abs() < sweep.radius {
                continue;
            }
            let facing = if side >= 0.0 { plane.normal } else { -plane.normal };
            let offset_plane = plane.center + facing * sweep.radius;
            let result = plane_intersect(&offset_plane, &plane.normal, &sweep.origin, &sweep.path);
            let Some(hit) = checked(result, stats, "sphere-finite-plane") else {
                continue;
            };
            if hit > sweep.length {
                continue;
            }

            let touch = sweep.origin + sweep.path * hit - facing * sweep.radius;
            if !finite_plane_contains(&(touch - plane.center), &plane.width_basis(), &plane.height_basis()) {
                continue;
            }
            let backed = hit - hit.min(self.config.contact_skin);
            let point = sweep.body_start + sweep.path * backed;
            hits.push(record(ShapeKind::FinitePlane, index, hit, facing, point));
        }
    }

    fn sweep_segment(
        &self,
        segment: &Segment,
        source: &SweepSource<'_>,
        target_id: EntityId,
        target: &Entity,
        hits: &mut HitBuffer,
        stats: &mut DetectionStats,
    ) {
        let shapes = target.world_shapes();
        let length_squared = segment.vector.magnitude_squared();
        if length_squared <= DEGENERATE_LENGTH_SQUARED {
            return;
        }
        let length = length_squared.sqrt();
        let direction = segment.vector / length;
        let end = segment.start + segment.vector;
        let record = |kind, index, distance: f32, normal, point| ClosestHit {
            marker: HitMarker {
                entity: target_id,
                kind,
                index,
            },
            t0: distance.max(0.0) / length,
            distance,
            normal,
            point,
            source_kind: segment.source_kind,
            source_index: segment.source_index,
            striking_velocity: source.velocity,
        };

        for (index, sphere) in shapes.spheres().iter().enumerate() {
            let marker = HitMarker {
                entity: target_id,
                kind: ShapeKind::Sphere,
                index,
            };
            if source.skips(&marker) {
                continue;
            }
            stats.hit_tests += 1;

            let result = swept_ray_sphere(&direction, &(sphere.center - segment.start), sphere.radius_squared());
            let Some(hit) = checked(result, stats, "segment-sphere") else {
                continue;
            };
            if hit > length || hit < -self.config.penetration_tolerance {
                continue;
            }
            let point = segment.start + direction * hit.max(0.0);
            hits.push(record(ShapeKind::Sphere, index, hit, point - sphere.center, point));
        }

        for (index, plane) in shapes.infinite_planes().iter().enumerate() {
            let marker = HitMarker {
                entity: target_id,
                kind: ShapeKind::InfinitePlane,
                index,
            };
            if source.skips(&marker) {
                continue;
            }
            stats.hit_tests += 1;

            let plane_point = target.position() + plane.normal * plane.distance;
            let d0 = (segment.start - plane_point).dot(&plane.normal);
            let d1 = (end - plane_point).dot(&plane.normal);
            let Some(t) = segment_crossing(d0, d1) else {
                continue;
            };
            let facing = if d0 > 0.0 { plane.normal } else { -plane.normal };
            let point = segment.start + segment.vector * t;
            hits.push(record(ShapeKind::InfinitePlane, index, t * length, facing, point));
        }

        for (index, plane) in shapes.finite_planes().iter().enumerate() {
            let marker = HitMarker {
                entity: target_id,
                kind: ShapeKind::FinitePlane,
                index,
            };
            if source.skips(&marker) {
                continue;
            }
            stats.hit_tests += 1;

            let d0 = (segment.start - plane.center).dot(&plane.normal);
            let d1 = (end - plane.center).dot(&plane.normal);
            let Some(t) = segment_crossing(d0, d1) else {
                continue;
            };
            let point = segment.start + segment.vector * t;
            if !finite_plane_contains(&(point - plane.center), &plane.width_basis(), &plane.height_basis()) {
                continue;
            }
            let facing = if d0 > 0.0 { plane.normal } else { -plane.normal };
            hits.push(record(ShapeKind::FinitePlane, index, t * length, facing, point));
        }
    }
}

/// Flatten a primitive result, counting and logging degenerate input as NO_HIT
fn checked(
    result: Result<Option<f32>, GeometryError>,
    stats: &mut DetectionStats,
    test: &'static str,
) -> Option<f32> {
    match result {
        Ok(hit) => hit,
        Err(e) => {
            stats.degenerate_inputs += 1;
            warn!("{} test skipped: {}", test, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::CollisionShapes;
    use approx::assert_relative_eq;

    fn sphere_entity(name: &str, position: Vec3, radius: f32) -> Entity {
        let mut shapes = CollisionShapes::new();
        shapes.push_sphere(Vec3::zeros(), radius);
        Entity::new(name).with_position(position).with_shapes(shapes)
    }

    fn body<'a>(entity: EntityId, start: Vec3, delta: Vec3) -> SweepSource<'a> {
        SweepSource {
            entity,
            path: SweepPath::Body {
                delta,
                delta_length: delta.magnitude(),
            },
            last_position: start,
            velocity: delta,
            last_hit: None,
            ignored: &[],
        }
    }

    #[test]
    fn test_projectile_hits_sphere_at_expected_fraction() {
        let config = PhysicsConfig::default();
        let mut scene = Scene::new();
        // Source already moved to the end of its frame
        let source = scene.add_entity(sphere_entity("shot", Vec3::new(0.0, 0.0, -100.0), 0.0));
        let obstacle = scene.add_entity(sphere_entity("rock", Vec3::new(0.0, 0.0, -50.0), 5.0));

        let mut hits = HitBuffer::new();
        let mut stats = DetectionStats::default();
        let sweep = body(source, Vec3::zeros(), Vec3::new(0.0, 0.0, -100.0));
        NarrowPhase::new(&config).detect(&scene, &sweep, &[true, true], &mut hits, &mut stats);

        assert_eq!(hits.len(), 1);
        let hit = hits.closest().unwrap();
        assert_eq!(hit.marker.entity, obstacle);
        assert_relative_eq!(hit.t0, 0.45, epsilon = 1.0e-5);
        assert_relative_eq!(hit.point, Vec3::new(0.0, 0.0, -45.0), epsilon = 1.0e-4);
        assert_eq!(stats.hit_tests, 1);
    }

    #[test]
    fn test_last_hit_marker_is_skipped() {
        let config = PhysicsConfig::default();
        let mut scene = Scene::new();
        let source = scene.add_entity(sphere_entity("shot", Vec3::new(0.0, 0.0, -100.0), 0.0));
        let obstacle = scene.add_entity(sphere_entity("rock", Vec3::new(0.0, 0.0, -50.0), 5.0));

        let mut sweep = body(source, Vec3::zeros(), Vec3::new(0.0, 0.0, -100.0));
        sweep.last_hit = Some(HitMarker {
            entity: obstacle,
            kind: ShapeKind::Sphere,
            index: 0,
        });

        let mut hits = HitBuffer::new();
        let mut stats = DetectionStats::default();
        NarrowPhase::new(&config).detect(&scene, &sweep, &[true, true], &mut hits, &mut stats);
        assert!(hits.is_empty());
        assert_eq!(stats.hit_tests, 0);
    }

    #[test]
    fn test_sphere_lands_on_offset_plane() {
        let config = PhysicsConfig::default();
        let mut scene = Scene::new();
        let source = scene.add_entity(sphere_entity("ball", Vec3::new(0.0, -2.0, 0.0), 1.0));
        let mut floor = CollisionShapes::new();
        floor.push_infinite_plane(Vec3::y(), 0.0).unwrap();
        scene.add_entity(Entity::new("floor").with_shapes(floor));

        let mut hits = HitBuffer::new();
        let mut stats = DetectionStats::default();
        let sweep = body(source, Vec3::new(0.0, 4.0, 0.0), Vec3::new(0.0, -6.0, 0.0));
        NarrowPhase::new(&config).detect(&scene, &sweep, &[false, true], &mut hits, &mut stats);

        let hit = hits.closest().unwrap();
        // Center meets the plane offset by the radius after 3 of 6 units
        assert_relative_eq!(hit.t0, 0.5, epsilon = 1.0e-5);
        assert_relative_eq!(hit.normal, Vec3::y());
        assert_relative_eq!(hit.point.y, 1.0 + config.contact_skin, epsilon = 1.0e-5);
    }

    #[test]
    fn test_deep_overlap_pushes_out_past_tolerance() {
        let config = PhysicsConfig::default();
        let mut scene = Scene::new();
        let source = scene.add_entity(sphere_entity("boulder", Vec3::new(0.0, 1.4, 0.0), 3.0));
        let mut floor = CollisionShapes::new();
        floor.push_infinite_plane(Vec3::y(), 0.0).unwrap();
        scene.add_entity(Entity::new("floor").with_shapes(floor));

        let mut hits = HitBuffer::new();
        let mut stats = DetectionStats::default();
        let sweep = body(source, Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, -0.1, 0.0));
        NarrowPhase::new(&config).detect(&scene, &sweep, &[false, true], &mut hits, &mut stats);

        // Half the radius deep, more than the tolerance allows behind a plane
        let hit = hits.closest().unwrap();
        assert!(-hit.distance > config.penetration_tolerance);
        assert_relative_eq!(hit.distance, -1.5, epsilon = 1.0e-4);
        assert_relative_eq!(hit.t0, 0.0);
        assert_relative_eq!(hit.normal, Vec3::y());
        assert_relative_eq!(hit.point.y, 3.0 + config.contact_skin, epsilon = 1.0e-4);
    }

    #[test]
    fn test_finite_plane_bounds_reject_wide_miss() {
        let config = PhysicsConfig::default();
        let mut scene = Scene::new();
        let mut wall = CollisionShapes::new();
        wall.push_finite_plane(Vec3::zeros(), Vec3::z(), Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0))
            .unwrap();
        let wall = scene.add_entity(Entity::new("wall").with_shapes(wall));
        let probe = scene.add_entity(Entity::new("probe"));

        let segments = [
            Segment {
                start: Vec3::new(1.0, 1.0, 10.0),
                vector: Vec3::new(0.0, 0.0, -20.0),
                source_kind: ShapeKind::Point,
                source_index: 0,
                active: true,
            },
            Segment {
                start: Vec3::new(8.0, 0.0, 10.0),
                vector: Vec3::new(0.0, 0.0, -20.0),
                source_kind: ShapeKind::Point,
                source_index: 1,
                active: true,
            },
        ];
        let sweep = SweepSource {
            entity: probe,
            path: SweepPath::Segments(&segments),
            last_position: Vec3::zeros(),
            velocity: Vec3::zeros(),
            last_hit: None,
            ignored: &[],
        };

        let mut hits = HitBuffer::new();
        let mut stats = DetectionStats::default();
        NarrowPhase::new(&config).detect(&scene, &sweep, &[true, false], &mut hits, &mut stats);

        assert_eq!(hits.len(), 1);
        let hit = hits.closest().unwrap();
        assert_eq!(hit.marker.entity, wall);
        assert_eq!(hit.source_index, 0);
        assert_relative_eq!(hit.t0, 0.5);
        assert_relative_eq!(hit.normal, Vec3::z());
    }
}
