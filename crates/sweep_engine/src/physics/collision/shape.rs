//! Collision descriptor store
//!
//! Every entity owns a [`CollisionShapes`] table holding its shapes in MODEL
//! SPACE. [`CollisionShapes::to_world`] produces the world-space copy the
//! detector reads; the scene refreshes it whenever the entity matrix is
//! recomputed, so shapes never change in the middle of a frame.

use bitflags::bitflags;

use crate::foundation::math::{try_normalize, Mat4, Point3, Quat, Vec3};
use crate::physics::error::GeometryError;

/// Kind of collision shape, used in hit markers and source/target tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Sphere
    Sphere,
    /// Infinite plane
    InfinitePlane,
    /// Finite (rectangular) plane
    FinitePlane,
    /// Edge / segment
    Edge,
    /// Single tracked point
    Point,
}

impl ShapeKind {
    /// Short tag for logs
    pub fn tag(&self) -> &'static str {
        match self {
            ShapeKind::Sphere => "Sph",
            ShapeKind::InfinitePlane => "iPlane",
            ShapeKind::FinitePlane => "fPlane",
            ShapeKind::Edge => "Edge",
            ShapeKind::Point => "Point",
        }
    }

    fn flag(&self) -> ShapeFlags {
        match self {
            ShapeKind::Sphere => ShapeFlags::SPHERE,
            ShapeKind::InfinitePlane => ShapeFlags::INFINITE_PLANE,
            ShapeKind::FinitePlane => ShapeFlags::FINITE_PLANE,
            ShapeKind::Edge => ShapeFlags::EDGE,
            ShapeKind::Point => ShapeFlags::POINT,
        }
    }
}

bitflags! {
    /// Which shape kinds a table carries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShapeFlags: u8 {
        /// At least one sphere
        const SPHERE = 1 << 0;
        /// At least one infinite plane
        const INFINITE_PLANE = 1 << 1;
        /// At least one finite plane
        const FINITE_PLANE = 1 << 2;
        /// At least one edge
        const EDGE = 1 << 3;
        /// At least one point
        const POINT = 1 << 4;
    }
}

/// Sphere shape; the squared radius is cached and kept in sync
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereShape {
    /// Center (local offset in model space, absolute in world space)
    pub center: Vec3,
    radius: f32,
    radius_squared: f32,
}

impl SphereShape {
    /// Create a sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            radius_squared: radius * radius,
        }
    }

    /// Radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Cached radius²
    pub fn radius_squared(&self) -> f32 {
        self.radius_squared
    }

    /// Change the radius, recomputing radius²
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
        self.radius_squared = radius * radius;
    }
}

/// Infinite plane: unit normal and signed distance from the entity origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfinitePlaneShape {
    /// Unit normal
    pub normal: Vec3,
    /// Offset of the plane from the entity origin along `normal`
    pub distance: f32,
}

/// Rectangular plane described by its center, unit normal and half axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinitePlaneShape {
    /// Center of the rectangle
    pub center: Vec3,
    /// Unit normal
    pub normal: Vec3,
    /// Half-width axis (center to edge)
    pub half_width: Vec3,
    /// Half-height axis (center to edge)
    pub half_height: Vec3,
}

impl FinitePlaneShape {
    /// Width axis scaled so in-bounds projections fall in `[-1, 1]`
    pub fn width_basis(&self) -> Vec3 {
        self.half_width / self.half_width.magnitude_squared()
    }

    /// Height axis scaled so in-bounds projections fall in `[-1, 1]`
    pub fn height_basis(&self) -> Vec3 {
        self.half_height / self.half_height.magnitude_squared()
    }
}

/// Segment from `origin` to `origin + vector`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeShape {
    /// Segment start
    pub origin: Vec3,
    /// Segment direction and length
    pub vector: Vec3,
}

impl EdgeShape {
    /// Segment end point
    pub fn end(&self) -> Vec3 {
        self.origin + self.vector
    }
}

/// Per-entity table of collision shapes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionShapes {
    spheres: Vec<SphereShape>,
    infinite_planes: Vec<InfinitePlaneShape>,
    finite_planes: Vec<FinitePlaneShape>,
    edges: Vec<EdgeShape>,
    points: Vec<Vec3>,
}

impl CollisionShapes {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sphere, returning its index
    pub fn push_sphere(&mut self, center: Vec3, radius: f32) -> usize {
        self.spheres.push(SphereShape::new(center, radius));
        self.spheres.len() - 1
    }

    /// Add an infinite plane; the normal is normalized
    pub fn push_infinite_plane(&mut self, normal: Vec3, distance: f32) -> Result<usize, GeometryError> {
        let normal = try_normalize(&normal).ok_or(GeometryError::Degenerate("infinite plane normal"))?;
        self.infinite_planes.push(InfinitePlaneShape { normal, distance });
        Ok(self.infinite_planes.len() - 1)
    }

    /// Add a finite plane; the normal is normalized and both half axes must be non-zero
    pub fn push_finite_plane(
        &mut self,
        center: Vec3,
        normal: Vec3,
        half_width: Vec3,
        half_height: Vec3,
    ) -> Result<usize, GeometryError> {
        let normal = try_normalize(&normal).ok_or(GeometryError::Degenerate("finite plane normal"))?;
        if try_normalize(&half_width).is_none() || try_normalize(&half_height).is_none() {
            return Err(GeometryError::Degenerate("finite plane axis"));
        }
        self.finite_planes.push(FinitePlaneShape {
            center,
            normal,
            half_width,
            half_height,
        });
        Ok(self.finite_planes.len() - 1)
    }

    /// Add an edge
    pub fn push_edge(&mut self, origin: Vec3, vector: Vec3) -> usize {
        self.edges.push(EdgeShape { origin, vector });
        self.edges.len() - 1
    }

    /// Add a tracked point
    pub fn push_point(&mut self, position: Vec3) -> usize {
        self.points.push(position);
        self.points.len() - 1
    }

    /// Change a sphere's radius; false if the index is out of range
    pub fn set_sphere_radius(&mut self, index: usize, radius: f32) -> bool {
        match self.spheres.get_mut(index) {
            Some(sphere) => {
                sphere.set_radius(radius);
                true
            }
            None => false,
        }
    }

    /// Replace every tracked point
    pub fn set_points(&mut self, points: impl IntoIterator<Item = Vec3>) {
        self.points.clear();
        self.points.extend(points);
    }

    /// Spheres
    pub fn spheres(&self) -> &[SphereShape] {
        &self.spheres
    }

    /// Infinite planes
    pub fn infinite_planes(&self) -> &[InfinitePlaneShape] {
        &self.infinite_planes
    }

    /// Finite planes
    pub fn finite_planes(&self) -> &[FinitePlaneShape] {
        &self.finite_planes
    }

    /// Edges
    pub fn edges(&self) -> &[EdgeShape] {
        &self.edges
    }

    /// Points
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Number of shapes of a given kind
    pub fn count(&self, kind: ShapeKind) -> usize {
        match kind {
            ShapeKind::Sphere => self.spheres.len(),
            ShapeKind::InfinitePlane => self.infinite_planes.len(),
            ShapeKind::FinitePlane => self.finite_planes.len(),
            ShapeKind::Edge => self.edges.len(),
            ShapeKind::Point => self.points.len(),
        }
    }

    /// Kinds present in this table
    pub fn flags(&self) -> ShapeFlags {
        [
            ShapeKind::Sphere,
            ShapeKind::InfinitePlane,
            ShapeKind::FinitePlane,
            ShapeKind::Edge,
            ShapeKind::Point,
        ]
        .iter()
        .filter(|kind| self.count(**kind) > 0)
        .fold(ShapeFlags::empty(), |flags, kind| flags | kind.flag())
    }

    /// True when the table holds no shapes at all
    pub fn is_empty(&self) -> bool {
        self.flags().is_empty()
    }

    /// Radius around the model origin enclosing every bounded shape.
    ///
    /// Infinite planes have no meaningful bound and are ignored.
    pub fn bounding_radius(&self) -> f32 {
        let spheres = self.spheres.iter().map(|s| s.center.magnitude() + s.radius);
        let finite = self
            .finite_planes
            .iter()
            .map(|p| p.center.magnitude() + p.half_width.magnitude() + p.half_height.magnitude());
        let edges = self
            .edges
            .iter()
            .map(|e| e.origin.magnitude().max(e.end().magnitude()));
        let points = self.points.iter().map(|p| p.magnitude());

        spheres.chain(finite).chain(edges).chain(points).fold(0.0, f32::max)
    }

    /// World-space copy of this table.
    ///
    /// `matrix` is the entity's TRS matrix; normals only follow `rotation`.
    /// Sphere radii and plane distances are world units and are not scaled.
    pub fn to_world(&self, matrix: &Mat4, rotation: &Quat) -> CollisionShapes {
        let point = |p: &Vec3| matrix.transform_point(&Point3::from(*p)).coords;
        let vector = |v: &Vec3| matrix.transform_vector(v);

        CollisionShapes {
            spheres: self
                .spheres
                .iter()
                .map(|s| SphereShape {
                    center: point(&s.center),
                    ..*s
                })
                .collect(),
            infinite_planes: self
                .infinite_planes
                .iter()
                .map(|p| InfinitePlaneShape {
                    normal: rotation * p.normal,
                    distance: p.distance,
                })
                .collect(),
            finite_planes: self
                .finite_planes
                .iter()
                .map(|p| FinitePlaneShape {
                    center: point(&p.center),
                    normal: rotation * p.normal,
                    half_width: vector(&p.half_width),
                    half_height: vector(&p.half_height),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeShape {
                    origin: point(&e.origin),
                    vector: vector(&e.vector),
                })
                .collect(),
            points: self.points.iter().map(point).collect(),
        }
    }
}
