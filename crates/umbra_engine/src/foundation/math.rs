//! Math utilities and types
//!
//! Provides the vector/matrix aliases used across the engine together with the
//! OpenGL-convention projection and view builders the renderer relies on.
//! All matrices are column-major and upload to the GPU without transposition.

pub use nalgebra::{Matrix3, Matrix4, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// World up axis shared by cameras and light views
    pub const WORLD_UP: [f32; 3] = [0.0, 1.0, 0.0];
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Parse whitespace separated floats, e.g. `"1 2 3"`.
    ///
    /// Returns `None` if any component fails to parse.
    pub fn parse_floats(text: &str) -> Option<Vec<f32>> {
        text.split_whitespace()
            .map(|component| component.parse::<f32>().ok())
            .collect()
    }
}

/// Extension trait for Mat4 with the builders used by the render passes
pub trait Mat4Ext {
    /// Right-handed perspective projection with OpenGL clip space (depth in [-1, 1])
    fn perspective_gl(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed orthographic projection with OpenGL clip space
    fn orthographic_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Compose `translate · rotate(angle, axis) · scale`.
    ///
    /// A zero angle or a degenerate axis yields no rotation so that configuration rows
    /// written as `"0 0 0 0"` stay valid.
    fn model_matrix(position: &Vec3, angle_degrees: f32, axis: &Vec3, scale: &Vec3) -> Mat4;

    /// Strip the translation part, keeping the upper-left 3x3 block
    fn without_translation(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective_gl(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y_radians, near, far)
    }

    fn orthographic_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(left, right, bottom, top, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn model_matrix(position: &Vec3, angle_degrees: f32, axis: &Vec3, scale: &Vec3) -> Mat4 {
        let translation = Mat4::new_translation(position);
        let scaling = Mat4::new_nonuniform_scaling(scale);

        if angle_degrees == 0.0 || axis.norm_squared() <= f32::EPSILON {
            return translation * scaling;
        }

        let rotation = Mat4::from_axis_angle(
            &Unit::new_normalize(*axis),
            utils::deg_to_rad(angle_degrees),
        );
        translation * rotation * scaling
    }

    fn without_translation(&self) -> Mat4 {
        let upper: Mat3 = self.fixed_view::<3, 3>(0, 0).into_owned();
        upper.to_homogeneous()
    }
}
