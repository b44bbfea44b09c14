//! # Transform Math
//!
//! Thin helpers over `cgmath` for the transform conventions the viewer relies on.
//!
//! Matrices are `cgmath::Matrix4<f32>` and points are transformed as column
//! vectors (`m * v`). Composition follows the builder convention: every
//! builder composes on the right (`translate(m, t) == m * translation(t)`), so
//! `multiply(parent, local)` applies `local` first and `parent` second. Swapping
//! operand order changes every transform result.
//!
//! All functions are pure. Inputs outside a function's domain (a zero-height
//! aspect, `near == far`, a non-affine transform passed to `transform_point`)
//! are caller contracts and are not validated.

use cgmath::{InnerSpace, Matrix, Matrix4, Rad, SquareMatrix, Vector3, Vector4};

pub type Vec3 = Vector3<f32>;
pub type Vec4 = Vector4<f32>;
pub type Mat4 = Matrix4<f32>;

/// Vectors shorter than this normalize to zero instead of NaN
pub const NORMALIZE_EPSILON: f32 = 1e-5;

/// Keeps orbit elevation away from the poles where `look_at` degenerates
pub const ELEVATION_MARGIN: f32 = 0.001;

/// Returns the unit vector along `v`, or the zero vector when `|v| < 1e-5`.
pub fn normalize(v: Vec3) -> Vec3 {
    let length = v.magnitude();
    if length > NORMALIZE_EPSILON {
        v / length
    } else {
        Vec3::new(0.0, 0.0, 0.0)
    }
}

/// Builds a camera-to-world matrix looking from `eye` towards `target`.
///
/// The basis is `z = normalize(eye - target)`, `x = normalize(up × z)`,
/// `y = normalize(z × x)` with `eye` as the translation column. The result
/// degenerates when `up` is parallel to the view axis.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let z_axis = normalize(eye - target);
    let x_axis = normalize(up.cross(z_axis));
    let y_axis = normalize(z_axis.cross(x_axis));

    #[rustfmt::skip]
    let m = Mat4::new(
        x_axis.x, x_axis.y, x_axis.z, 0.0,
        y_axis.x, y_axis.y, y_axis.z, 0.0,
        z_axis.x, z_axis.y, z_axis.z, 0.0,
        eye.x,    eye.y,    eye.z,    1.0,
    );
    m
}

/// Symmetric perspective frustum mapping view space into GL clip space.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    cgmath::perspective(Rad(fov_y), aspect, near, far)
}

/// Orthographic box projection, used for the directional light's shadow pass.
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    cgmath::ortho(left, right, bottom, top, near, far)
}

/// `a * b`: applies `b` first, then `a`.
pub fn multiply(a: Mat4, b: Mat4) -> Mat4 {
    a * b
}

/// General 4×4 inverse. `None` when the matrix is singular.
pub fn inverse(m: Mat4) -> Option<Mat4> {
    m.invert()
}

pub fn transpose(m: Mat4) -> Mat4 {
    m.transpose()
}

/// Transforms a point with `w = 1` and divides by the resulting `w`.
pub fn transform_point(m: Mat4, point: Vec3) -> Vec3 {
    let v = m * point.extend(1.0);
    v.truncate() / v.w
}

/// Transforms a direction with `w = 0`; translation is ignored and no divide happens.
pub fn transform_direction(m: Mat4, direction: Vec3) -> Vec3 {
    (m * direction.extend(0.0)).truncate()
}

pub fn translation(t: Vec3) -> Mat4 {
    Mat4::from_translation(t)
}

pub fn x_rotation(angle_in_radians: f32) -> Mat4 {
    Mat4::from_angle_x(Rad(angle_in_radians))
}

pub fn y_rotation(angle_in_radians: f32) -> Mat4 {
    Mat4::from_angle_y(Rad(angle_in_radians))
}

pub fn z_rotation(angle_in_radians: f32) -> Mat4 {
    Mat4::from_angle_z(Rad(angle_in_radians))
}

pub fn scaling(s: Vec3) -> Mat4 {
    Mat4::from_nonuniform_scale(s.x, s.y, s.z)
}

pub fn translate(m: Mat4, t: Vec3) -> Mat4 {
    multiply(m, translation(t))
}

pub fn x_rotate(m: Mat4, angle_in_radians: f32) -> Mat4 {
    multiply(m, x_rotation(angle_in_radians))
}

pub fn y_rotate(m: Mat4, angle_in_radians: f32) -> Mat4 {
    multiply(m, y_rotation(angle_in_radians))
}

pub fn z_rotate(m: Mat4, angle_in_radians: f32) -> Mat4 {
    multiply(m, z_rotation(angle_in_radians))
}

pub fn scale(m: Mat4, s: Vec3) -> Mat4 {
    multiply(m, scaling(s))
}

/// `T(position) · Rx · Ry · Rz`, the transform used for authored scene nodes.
pub fn from_position_and_euler(position: Vec3, euler: Vec3) -> Mat4 {
    let m = translate(Mat4::identity(), position);
    let m = x_rotate(m, euler.x);
    let m = y_rotate(m, euler.y);
    z_rotate(m, euler.z)
}

/// Translation column of an affine transform
pub fn position_of(m: Mat4) -> Vec3 {
    m.w.truncate()
}

/// Spherical-to-Cartesian conversion around `target`.
///
/// Elevation is measured from the +Y axis and clamped to
/// `[ELEVATION_MARGIN, π/2 - ELEVATION_MARGIN]`.
pub fn orbit_position(azimuth: f32, elevation: f32, target: Vec3, radius: f32) -> Vec3 {
    let elevation = elevation.clamp(
        ELEVATION_MARGIN,
        std::f32::consts::FRAC_PI_2 - ELEVATION_MARGIN,
    );

    Vec3::new(
        target.x + radius * elevation.sin() * azimuth.sin(),
        target.y + radius * elevation.cos(),
        target.z + radius * elevation.sin() * azimuth.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f32::consts::PI;

    fn random_affine(rng: &mut StdRng) -> Mat4 {
        let position = Vec3::new(
            rng.random_range(-20.0..20.0),
            rng.random_range(-20.0..20.0),
            rng.random_range(-20.0..20.0),
        );
        let euler = Vec3::new(
            rng.random_range(-PI..PI),
            rng.random_range(-PI..PI),
            rng.random_range(-PI..PI),
        );
        let s = Vec3::new(
            rng.random_range(0.5..3.0),
            rng.random_range(0.5..3.0),
            rng.random_range(0.5..3.0),
        );
        scale(from_position_and_euler(position, euler), s)
    }

    #[test]
    fn normalize_returns_zero_for_tiny_vectors() {
        assert_eq!(normalize(Vec3::new(1e-6, 0.0, 0.0)), Vec3::new(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(
            normalize(Vec3::new(3.0, 0.0, 4.0)),
            Vec3::new(0.6, 0.0, 0.8),
            epsilon = 1e-5
        );
    }

    #[test]
    fn builders_compose_on_the_right() {
        let m = translate(y_rotation(PI / 2.0), Vec3::new(1.0, 0.0, 0.0));
        // translation happens in the rotated frame: +X becomes -Z
        let p = transform_point(m, Vec3::new(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(p, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);

        let m = y_rotate(translation(Vec3::new(1.0, 0.0, 0.0)), PI / 2.0);
        let p = transform_point(m, Vec3::new(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(p, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn direction_multiply_ignores_translation() {
        let m = translation(Vec3::new(5.0, 6.0, 7.0));
        let d = transform_direction(m, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(d, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn point_round_trips_through_inverse() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let m = random_affine(&mut rng);
            let inv = inverse(m).expect("scaled rigid transform is invertible");
            let p = Vec3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            );
            let back = transform_point(inv, transform_point(m, p));
            assert!((back - p).magnitude() < 1e-3, "{:?} != {:?}", back, p);
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(inverse(scaling(Vec3::new(1.0, 0.0, 1.0))).is_none());
    }

    #[test]
    fn look_at_places_eye_and_faces_target() {
        let eye = Vec3::new(0.0, 0.0, 10.0);
        let m = look_at(eye, Vec3::new(0.0, 0.0, 0.0), Vec3::unit_y());
        assert_abs_diff_eq!(position_of(m), eye, epsilon = 1e-5);
        // camera looks down its local -Z axis
        let forward = transform_direction(m, Vec3::new(0.0, 0.0, -1.0));
        assert_abs_diff_eq!(forward, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn perspective_maps_near_and_far_planes_to_clip_bounds() {
        let p = perspective(1.0, 1.5, 1.0, 100.0);
        let near = transform_point(p, Vec3::new(0.0, 0.0, -1.0));
        let far = transform_point(p, Vec3::new(0.0, 0.0, -100.0));
        assert_abs_diff_eq!(near.z, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(far.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn orthographic_maps_the_box_onto_the_clip_cube() {
        let o = orthographic(-20.0, 20.0, -10.0, 10.0, 1.0, 100.0);
        let corner = transform_point(o, Vec3::new(20.0, -10.0, -100.0));
        assert_abs_diff_eq!(corner, Vec3::new(1.0, -1.0, 1.0), epsilon = 1e-5);
        let centre = transform_point(o, Vec3::new(0.0, 0.0, -1.0));
        assert_abs_diff_eq!(centre, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn orbit_position_clamps_elevation() {
        let target = Vec3::new(-3.0, 2.0, -2.0);
        let high = orbit_position(0.3, -1.0, target, 15.0);
        let clamped = orbit_position(0.3, ELEVATION_MARGIN, target, 15.0);
        assert_abs_diff_eq!(high, clamped, epsilon = 1e-5);

        let low = orbit_position(0.0, 3.0 * PI / 4.0, target, 15.0);
        assert!(low.y >= target.y);
        assert!(((low - target).magnitude() - 15.0).abs() < 1e-3);
    }
}
