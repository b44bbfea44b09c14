use cgmath::InnerSpace;

use crate::math::{inverse, look_at, multiply, orthographic, transform_point, y_rotation, Mat4, Vec3};

/// Distance the shadow camera is pulled back from its target along the light direction
pub const SHADOW_DISTANCE: f32 = 10.0;
/// Half extent of the orthographic shadow volume
pub const SHADOW_HALF_EXTENT: f32 = 20.0;
pub const SHADOW_NEAR: f32 = 1.0;
pub const SHADOW_FAR: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
}

/// The single shadow-casting light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub direction: Vec3,
}

impl DirectionalLight {
    /// Light-space view-projection used by the shadow pass, aimed at `target`.
    pub fn shadow_view_projection(&self, target: Vec3) -> Mat4 {
        let eye = target - self.direction * SHADOW_DISTANCE;
        // a vertical light would make the default up vector degenerate
        let up = if self.direction.cross(Vec3::unit_y()).magnitude2() < 1e-8 {
            Vec3::unit_z()
        } else {
            Vec3::unit_y()
        };

        let view = inverse(look_at(eye, target, up)).unwrap_or(Mat4::from_scale(1.0));
        let projection = orthographic(
            -SHADOW_HALF_EXTENT,
            SHADOW_HALF_EXTENT,
            -SHADOW_HALF_EXTENT,
            SHADOW_HALF_EXTENT,
            SHADOW_NEAR,
            SHADOW_FAR,
        );
        multiply(projection, view)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub position: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    /// Rotates the light about the world Y axis through the origin.
    pub fn orbit(&mut self, angle_in_radians: f32) {
        self.position = transform_point(y_rotation(angle_in_radians), self.position);
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.1, 0.1, 0.1),
        }
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.5, 0.5, 0.5),
            direction: Vec3::new(0.0, -1.0, -1.0),
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.3, 0.3, 0.3),
            position: Vec3::new(0.0, 5.0, 5.0),
            constant: 1.0,
            linear: 0.009,
            quadratic: 0.032,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cgmath::SquareMatrix;

    #[test]
    fn shadow_projection_keeps_target_inside_the_volume() {
        let light = DirectionalLight::default();
        let m = light.shadow_view_projection(Vec3::new(0.0, 0.0, 0.0));
        let clip = transform_point(m, Vec3::new(0.0, 0.0, 0.0));

        assert_abs_diff_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(clip.y, 0.0, epsilon = 1e-5);
        assert!(clip.z > -1.0 && clip.z < 1.0);
    }

    #[test]
    fn vertical_light_still_produces_a_finite_matrix() {
        let light = DirectionalLight {
            color: Vec3::new(1.0, 1.0, 1.0),
            direction: Vec3::new(0.0, -1.0, 0.0),
        };
        let m = light.shadow_view_projection(Vec3::new(0.0, 0.0, 0.0));
        let as_slice: &[f32; 16] = m.as_ref();
        assert!(as_slice.iter().all(|v| v.is_finite()));
        assert!(m != Mat4::identity());
    }

    #[test]
    fn point_light_orbit_preserves_height_and_radius() {
        let mut light = PointLight::default();
        light.orbit(std::f32::consts::FRAC_PI_2);

        assert_abs_diff_eq!(light.position, Vec3::new(5.0, 5.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(light.attenuation(0.0), 1.0, epsilon = 1e-5);
    }
}
