//! Primitive intersection routines
//!
//! Pure, stateless tests that every higher-level collision check composes.
//! Distances are measured along unit-length directions; `Ok(None)` is the
//! NO_HIT answer and `Err` flags input that would otherwise poison the
//! caller's state with NaN.

use crate::foundation::math::{is_finite, try_normalize, Vec3};
use crate::physics::error::GeometryError;

/// Cosine below which a ray is considered parallel to a plane
pub const PARALLEL_EPSILON: f32 = 1.0e-6;

/// A ray for swept tests
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`
    pub fn new(origin: Vec3, direction: Vec3) -> Result<Self, GeometryError> {
        let direction = try_normalize(&direction).ok_or(GeometryError::Degenerate("ray direction"))?;
        Ok(Self { origin, direction })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Nearest entry distance into a sphere, see [`swept_ray_sphere`]
    pub fn sphere_hit(&self, center: &Vec3, radius_squared: f32) -> Result<Option<f32>, GeometryError> {
        swept_ray_sphere(&self.direction, &(center - self.origin), radius_squared)
    }

    /// Distance to a plane crossing, see [`plane_intersect`]
    pub fn plane_hit(&self, point: &Vec3, normal: &Vec3) -> Result<Option<f32>, GeometryError> {
        plane_intersect(point, normal, &self.origin, &self.direction)
    }
}

/// A bounding sphere used by the broad phase
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// True if the spheres overlap once this one is inflated by `reach`
    /// (the distance its owner can travel this frame)
    pub fn within_reach(&self, other: &BoundingSphere, reach: f32) -> bool {
        let distance = (self.center - other.center).magnitude();
        distance <= reach + self.radius + other.radius
    }
}

/// Intersection of a ray and a static sphere, arrow-like.
///
/// `direction` must be unit length; `origin_offset` is the vector from the
/// ray origin to the sphere center. Returns the nearest intersection
/// distance, which is negative when the origin already lies inside the
/// sphere. NO_HIT when the center is behind the origin or the closest
/// approach is farther than the radius.
pub fn swept_ray_sphere(
    direction: &Vec3,
    origin_offset: &Vec3,
    radius_squared: f32,
) -> Result<Option<f32>, GeometryError> {
    if !is_finite(direction) || direction.magnitude_squared() == 0.0 {
        return Err(GeometryError::Degenerate("sweep direction"));
    }

    let tca = origin_offset.dot(direction);
    if tca.is_nan() {
        return Err(GeometryError::NonFinite("sweep projection"));
    }
    if tca < 0.0 {
        return Ok(None);
    }

    let d2 = origin_offset.dot(origin_offset) - tca * tca;
    if d2 > radius_squared {
        return Ok(None);
    }

    let thc = (radius_squared - d2).sqrt();
    if thc.is_nan() {
        return Err(GeometryError::NonFinite("sweep half chord"));
    }
    Ok(Some(tca - thc))
}

/// Distance along `ray_direction` from `ray_origin` to the plane through
/// `plane_point` with `plane_normal`.
///
/// NO_HIT when the ray is parallel to the plane or the plane is behind the origin.
pub fn plane_intersect(
    plane_point: &Vec3,
    plane_normal: &Vec3,
    ray_origin: &Vec3,
    ray_direction: &Vec3,
) -> Result<Option<f32>, GeometryError> {
    if plane_normal.magnitude_squared() == 0.0 {
        return Err(GeometryError::Degenerate("plane normal"));
    }
    if ray_direction.magnitude_squared() == 0.0 {
        return Err(GeometryError::Degenerate("ray direction"));
    }

    let angle_cos = plane_normal.dot(ray_direction);
    if angle_cos.is_nan() {
        return Err(GeometryError::NonFinite("plane angle"));
    }
    if angle_cos.abs() < PARALLEL_EPSILON {
        return Ok(None);
    }

    let t = plane_normal.dot(&(plane_point - ray_origin)) / angle_cos;
    if !t.is_finite() {
        return Err(GeometryError::NonFinite("plane distance"));
    }
    if t < 0.0 {
        return Ok(None);
    }
    Ok(Some(t))
}

/// Fraction along a segment at which it crosses a plane, given the signed
/// distances of both endpoints. NO_HIT unless the endpoints are strictly on
/// opposite sides.
pub fn segment_crossing(start_distance: f32, end_distance: f32) -> Option<f32> {
    let crosses = (start_distance > 0.0 && end_distance < 0.0)
        || (start_distance < 0.0 && end_distance > 0.0);
    if !crosses {
        return None;
    }
    Some(-start_distance / (end_distance - start_distance))
}

/// In-bounds test for a point expressed relative to a finite plane center.
///
/// `width_basis` and `height_basis` are the half-extent axes pre-divided by
/// their squared length, so both projections land in `[-1, 1]` inside the plane.
pub fn finite_plane_contains(local: &Vec3, width_basis: &Vec3, height_basis: &Vec3) -> bool {
    local.dot(width_basis).abs() <= 1.0 && local.dot(height_basis).abs() <= 1.0
}
