//! # Fly Camera
//!
//! First-person camera driven by yaw/pitch angles. Orientation is stored as angles and
//! the front/right/up basis is re-derived from them on every look update, so the basis
//! never drifts. Matrices are recomputed once per frame in [`Camera::update`], which
//! also scales the movement step by the frame time.
//!
//! ## Conventions
//! - Right-handed, Y-up world; yaw -90° looks down -Z.
//! - Angles are in degrees. Pitch is clamped to [-89°, 89°], field of view to [1°, 45°].
//! - Projection uses OpenGL clip space.

use crate::foundation::math::{constants, utils, Mat4, Mat4Ext, Vec3};

/// Base movement speed in world units per second
pub const MOVE_SPEED: f32 = 5.0;

/// Degrees of rotation per pixel of cursor motion
pub const LOOK_SENSITIVITY: f32 = 0.1;

/// Degrees of field-of-view change per scroll step
pub const ZOOM_STEP: f32 = 2.0;

/// Pitch limit in degrees
pub const PITCH_LIMIT: f32 = 89.0;

/// Field-of-view limits in degrees
pub const FOV_RANGE: (f32, f32) = (1.0, 45.0);

/// First-person perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    world_up: Vec3,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    speed: f32,
    view: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Camera at (0, 1, 3) looking down -Z with an 800x600 aspect
    pub fn new() -> Self {
        let world_up = Vec3::from(constants::WORLD_UP);
        let front = Vec3::new(0.0, 0.0, -1.0);
        let right = front.cross(&world_up).normalize();
        let up = right.cross(&front).normalize();

        Self {
            position: Vec3::new(0.0, 1.0, 3.0),
            yaw: -90.0,
            pitch: 0.0,
            front,
            right,
            up,
            world_up,
            fov: FOV_RANGE.1,
            aspect: 800.0 / 600.0,
            near: 0.1,
            far: 100.0,
            speed: 0.0,
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }

    /// Builder-style position override
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder-style aspect override
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Recompute matrices and the movement step for this frame
    pub fn update(&mut self, elapsed_seconds: f32) {
        self.speed = MOVE_SPEED * elapsed_seconds;
        self.projection =
            Mat4::perspective_gl(utils::deg_to_rad(self.fov), self.aspect, self.near, self.far);
        self.view = Mat4::look_at(self.position, self.position + self.front, self.up);
    }

    /// Step along the view direction
    pub fn move_forward(&mut self) {
        self.position += self.front * self.speed;
    }

    /// Step against the view direction
    pub fn move_backward(&mut self) {
        self.position -= self.front * self.speed;
    }

    /// Strafe left
    pub fn move_left(&mut self) {
        self.position -= self.strafe_axis() * self.speed;
    }

    /// Strafe right
    pub fn move_right(&mut self) {
        self.position += self.strafe_axis() * self.speed;
    }

    /// Step along the camera up vector
    pub fn move_up(&mut self) {
        self.position += self.up * self.speed;
    }

    /// Step against the camera up vector
    pub fn move_down(&mut self) {
        self.position -= self.up * self.speed;
    }

    // Taken from the current front and up rather than the cached right vector.
    fn strafe_axis(&self) -> Vec3 {
        self.front.cross(&self.up).normalize()
    }

    /// Apply a cursor delta in pixels
    pub fn on_look(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * LOOK_SENSITIVITY;
        self.pitch = (self.pitch - delta_y * LOOK_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (yaw, pitch) = (utils::deg_to_rad(self.yaw), utils::deg_to_rad(self.pitch));
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }

    /// Apply a scroll delta, zooming by narrowing the field of view
    pub fn on_scroll(&mut self, delta_y: f32) {
        self.fov = (self.fov - delta_y * ZOOM_STEP).clamp(FOV_RANGE.0, FOV_RANGE.1);
    }

    /// Aspect ratio from a framebuffer size; zero-sized (minimised) frames are ignored
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the camera
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Unit view direction
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Unit right vector
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Unit up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Yaw in degrees
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Vertical field of view in degrees
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Distance covered by one move call this frame
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// View matrix from the last [`Camera::update`]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Projection matrix from the last [`Camera::update`]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let camera = Camera::new();
        assert_relative_eq!(camera.position(), Vec3::new(0.0, 1.0, 3.0));
        assert_relative_eq!(camera.front(), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(camera.up(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(camera.fov(), 45.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new();
        for delta in [-100_000.0, -5.0, 0.0, 3.0, 25_000.0, -1.0e9, 1.0e9] {
            camera.on_look(delta * 0.5, delta);
            assert!((-PITCH_LIMIT..=PITCH_LIMIT).contains(&camera.pitch()));
        }

        camera.on_look(0.0, -10_000.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        camera.on_look(0.0, 10_000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT);
    }

    #[test]
    fn test_fov_is_clamped() {
        let mut camera = Camera::new();
        for delta in [1.0, 100.0, -3.0, -1000.0, 0.25, 7.0] {
            camera.on_scroll(delta);
            assert!((FOV_RANGE.0..=FOV_RANGE.1).contains(&camera.fov()));
        }

        camera.on_scroll(1000.0);
        assert_eq!(camera.fov(), 1.0);
        camera.on_scroll(-1000.0);
        assert_eq!(camera.fov(), 45.0);
    }

    #[test]
    fn test_forward_then_backward_returns_home() {
        let mut camera = Camera::new();
        camera.on_look(37.0, 12.0);
        let start = camera.position();

        camera.update(0.016);
        camera.move_forward();
        camera.update(0.016);
        camera.move_backward();

        assert_relative_eq!(camera.position(), start, epsilon = 1e-5);
    }

    #[test]
    fn test_basis_stays_orthonormal_after_look() {
        let mut camera = Camera::new();
        camera.on_look(123.0, -45.0);

        assert_relative_eq!(camera.front().norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.front().dot(&camera.right()), 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.front().dot(&camera.up()), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_strafe_uses_current_front() {
        let mut camera = Camera::new();
        // Yaw +90 degrees: looking down +X, so right is +Z.
        camera.on_look(900.0, 0.0);
        camera.update(1.0);
        let start = camera.position();
        camera.move_right();

        assert_relative_eq!(camera.position() - start, Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-4);
    }

    #[test]
    fn test_update_builds_view_from_position_and_front() {
        let mut camera = Camera::new();
        camera.update(0.5);

        let expected = Mat4::look_at(
            Vec3::new(0.0, 1.0, 3.0),
            Vec3::new(0.0, 1.0, 2.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(camera.view(), expected, epsilon = 1e-6);
        assert_relative_eq!(camera.speed(), 2.5);
    }

    #[test]
    fn test_set_position_round_trip() {
        let mut camera = Camera::new();
        camera.on_look(10.0, 10.0);
        camera.set_position(Vec3::new(-4.0, 2.5, 9.0));
        assert_eq!(camera.position(), Vec3::new(-4.0, 2.5, 9.0));
    }
}
