//! Math utilities and types
//!
//! Provides the fundamental vector, matrix and transform types shared by the
//! collision and animation layers.

pub use nalgebra::{Matrix4, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// RGBA color / 4D vector type
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Squared length under which a vector is treated as zero length
pub const DEGENERATE_LENGTH_SQUARED: f32 = 1.0e-12;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Rotate by a scaled axis (radians around each axis), as produced by
    /// integrating an angular velocity over one frame
    pub fn rotate_by(&mut self, scaled_axis: Vec3) {
        if scaled_axis.magnitude_squared() > DEGENERATE_LENGTH_SQUARED {
            self.rotation = Quat::from_scaled_axis(scaled_axis) * self.rotation;
        }
    }
}

/// Reflect `incident` about the unit-length `normal`.
///
/// `r = v - 2 (v . n) n`
pub fn reflect(incident: &Vec3, normal: &Vec3) -> Vec3 {
    incident - normal * (2.0 * incident.dot(normal))
}

/// True when every component is finite
pub fn is_finite(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Normalize `v`, or `None` if it has (near) zero length or is not finite
pub fn try_normalize(v: &Vec3) -> Option<Vec3> {
    let length_squared = v.magnitude_squared();
    if !length_squared.is_finite() || length_squared <= DEGENERATE_LENGTH_SQUARED {
        return None;
    }
    Some(v / length_squared.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reflect_off_floor() {
        let v = Vec3::new(1.0, -2.0, 0.5);
        let r = reflect(&v, &Vec3::y());
        assert_relative_eq!(r, Vec3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_try_normalize_rejects_zero() {
        assert!(try_normalize(&Vec3::zeros()).is_none());
        assert!(try_normalize(&Vec3::new(f32::NAN, 0.0, 1.0)).is_none());
        assert_relative_eq!(try_normalize(&Vec3::new(0.0, 3.0, 0.0)).unwrap(), Vec3::y());
    }

    #[test]
    fn test_transform_matrix_translates() {
        let mut transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        transform.rotate_by(Vec3::zeros());
        let p = transform.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::new(2.0, 2.0, 3.0));
    }
}
