use cgmath::SquareMatrix;

use crate::config::CameraConfig;
use crate::math::{self, Mat4, Vec3};

use super::camera_utils::{convert_matrix4_to_array, CameraUniform, OPENGL_TO_WGPU_MATRIX};

/// Spherical placement of the camera around a target point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub azimuth: f32,
    /// Measured from +Y, clamped away from the poles when applied
    pub elevation: f32,
    pub radius: f32,
    pub target: Vec3,
    pub sensitivity: f32,
}

impl Orbit {
    pub fn position(&self) -> Vec3 {
        math::orbit_position(self.azimuth, self.elevation, self.target, self.radius)
    }
}

/// Perspective camera driven by an [`Orbit`].
///
/// `transform` is camera-to-world; the view matrix is its inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub field_of_view: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub up: Vec3,
    pub transform: Mat4,
    pub orbit: Orbit,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let orbit = Orbit {
            azimuth: config.azimuth,
            elevation: config.elevation,
            radius: config.radius,
            target: config.target,
            sensitivity: config.sensitivity,
        };

        let mut camera = Self {
            field_of_view: config.field_of_view,
            aspect,
            near: config.near,
            far: config.far,
            up: config.up,
            transform: Mat4::identity(),
            orbit,
        };
        camera.update_transform();
        camera
    }

    /// Rebuilds `transform` from the orbit parameters
    pub fn update_transform(&mut self) {
        self.transform = math::look_at(self.orbit.position(), self.orbit.target, self.up);
    }

    /// Applies a pointer drag of `(dx, dy)` pixels.
    ///
    /// Elevation is clamped here as well so dragging past a pole does not
    /// accumulate hidden travel.
    pub fn orbit_by(&mut self, dx: f32, dy: f32) {
        self.orbit.azimuth -= dx * self.orbit.sensitivity;
        self.orbit.elevation -= dy * self.orbit.sensitivity;
        self.orbit.elevation = self.orbit.elevation.clamp(
            math::ELEVATION_MARGIN,
            std::f32::consts::FRAC_PI_2 - math::ELEVATION_MARGIN,
        );
        self.update_transform();
    }

    /// Ignores zero-height sizes, which winit reports while minimised.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn projection_matrix(&self) -> Mat4 {
        math::perspective(self.field_of_view, self.aspect, self.near, self.far)
    }

    pub fn view_matrix(&self) -> Mat4 {
        math::inverse(self.transform).unwrap_or(Mat4::from_scale(1.0))
    }

    /// GL-convention view-projection, the space picking and depth sorting work in
    pub fn view_projection(&self) -> Mat4 {
        math::multiply(self.projection_matrix(), self.view_matrix())
    }

    pub fn position(&self) -> Vec3 {
        math::position_of(self.transform)
    }

    /// GPU-side camera data with the depth range remapped to wgpu's `[0, 1]`
    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_position: self.position().extend(1.0).into(),
            view_proj: convert_matrix4_to_array(OPENGL_TO_WGPU_MATRIX * self.view_projection()),
        }
    }
}
