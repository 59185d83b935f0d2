//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the TRS `Transform` used for node-local
//! transforms and bind-pose decomposition.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Rotation3,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Non-normalized quaternion, used for animation tangents
pub type RawQuat = Quaternion<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
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
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from full TRS specification
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a transform from a transformation matrix
    ///
    /// Assumes the matrix has no shear. A zero scale axis yields an
    /// identity rotation for that axis.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        let safe = |s: f32| if s > f32::EPSILON { s } else { 1.0 };
        let (sx, sy, sz) = (safe(scale_x), safe(scale_y), safe(scale_z));
        let rotation_matrix = Matrix3::new(
            matrix.m11 / sx, matrix.m12 / sy, matrix.m13 / sz,
            matrix.m21 / sx, matrix.m22 / sy, matrix.m23 / sz,
            matrix.m31 / sx, matrix.m32 / sy, matrix.m33 / sz,
        );
        let rotation = Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation_matrix));

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Swap the Y and Z components of a vector
pub fn swap_yz(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// Mirror a vector across the Y axis (negate X and Z)
pub fn mirror_xz(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, -v.z)
}

/// Negate the X and Z components of a rotation
///
/// Equivalent to conjugating by a 180° rotation about Y.
pub fn mirror_rotation_xz(q: Quat) -> Quat {
    Quat::new_unchecked(Quaternion::new(q.w, -q.i, q.j, -q.k))
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// sqrt(2) / 2, the component of a 90° quaternion
    pub const SQRT2_HALF: f32 = std::f32::consts::FRAC_1_SQRT_2;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Quat with axis rotations in degrees
pub trait QuatExt {
    /// Rotation around the X axis
    fn rotation_x_deg(degrees: f32) -> Quat;

    /// Rotation around the Y axis
    fn rotation_y_deg(degrees: f32) -> Quat;

    /// Rotation around the Z axis
    fn rotation_z_deg(degrees: f32) -> Quat;
}

impl QuatExt for Quat {
    fn rotation_x_deg(degrees: f32) -> Quat {
        Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(degrees))
    }

    fn rotation_y_deg(degrees: f32) -> Quat {
        Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(degrees))
    }

    fn rotation_z_deg(degrees: f32) -> Quat {
        Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(degrees))
    }
}
