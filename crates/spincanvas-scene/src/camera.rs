//! Perspective camera and the directional light placed at mount

use bevy_color::Color;
use bevy_math::{Mat4, Quat, Vec3};

/// Perspective camera looking down its local -Z axis
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Quat,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 1.0, 0.1, 1000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    /// Aspect ratio for a viewport; a zero height keeps the current ratio
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// Recompute the projection matrix after changing lens parameters
    pub fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 5.0,
            position: Vec3::new(0.0, 0.0, 10.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_from_viewport() {
        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(1920, 1080);
        camera.update_projection();
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);

        let expected = Mat4::perspective_rh_gl(75f32.to_radians(), 1920.0 / 1080.0, 0.1, 1000.0);
        assert_eq!(camera.projection(), expected);
    }

    #[test]
    fn test_zero_height_keeps_aspect() {
        let mut camera = PerspectiveCamera::new(75.0, 1.5, 0.1, 1000.0);
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect, 1.5);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        let clip = camera.view_projection() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }
}
