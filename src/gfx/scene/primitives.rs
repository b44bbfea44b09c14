//! # Primitive Shape Generation
//!
//! Built-in geometry for the demo scene, so the viewer has something to show
//! without any asset files. Winding is counter-clockwise seen from outside.

use std::f32::consts::PI;

use crate::error::GeometryError;

use super::mesh::Vertices;

/// Two-triangle ground plane at `y = 0`, spanning `±half_extent` on X and Z.
///
/// Triangles are emitted back-left, front-left, back-right then front-left,
/// front-right, back-right, with every normal pointing up.
pub fn floor(half_extent: f32) -> Result<Vertices, GeometryError> {
    let e = half_extent;
    #[rustfmt::skip]
    let positions = vec![
        -e, 0.0, -e, // back left
        -e, 0.0,  e, // front left
         e, 0.0, -e, // back right
        -e, 0.0,  e, // front left
         e, 0.0,  e, // front right
         e, 0.0, -e, // back right
    ];
    let normals = [0.0, 1.0, 0.0].repeat(6);
    Vertices::new(positions, normals)
}

/// Indexed cube centred at the origin with per-face normals and UVs
pub fn cube(size: f32) -> Result<Vertices, GeometryError> {
    let h = size * 0.5;
    #[rustfmt::skip]
    let positions = vec![
        // Front face
        -h, -h,  h,   h, -h,  h,   h,  h,  h,  -h,  h,  h,
        // Back face
        -h, -h, -h,  -h,  h, -h,   h,  h, -h,   h, -h, -h,
        // Left face
        -h, -h, -h,  -h, -h,  h,  -h,  h,  h,  -h,  h, -h,
        // Right face
         h, -h,  h,   h, -h, -h,   h,  h, -h,   h,  h,  h,
        // Top face
        -h,  h,  h,   h,  h,  h,   h,  h, -h,  -h,  h, -h,
        // Bottom face
        -h, -h, -h,   h, -h, -h,   h, -h,  h,  -h, -h,  h,
    ];

    let face_normals: [[f32; 3]; 6] = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];
    let normals: Vec<f32> = face_normals
        .iter()
        .flat_map(|n| n.repeat(4))
        .collect();

    let uvs = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0].repeat(6);

    let indices: Vec<u32> = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    Vertices::indexed(positions, normals, indices)?.with_uvs(uvs)
}

/// Low-poly conifer: a prism trunk under a cone canopy, standing on `y = 0`.
///
/// Emitted as a non-indexed triangle list with flat face normals.
pub fn tree(segments: u32) -> Result<Vertices, GeometryError> {
    let segs = segments.max(3);
    let mut positions: Vec<f32> = Vec::new();

    let ring = |radius: f32, y: f32, i: u32| {
        let angle = i as f32 * 2.0 * PI / segs as f32;
        [radius * angle.cos(), y, radius * angle.sin()]
    };

    let (trunk_radius, trunk_height) = (0.25, 1.0);
    let (canopy_radius, canopy_height) = (1.2, 3.5);
    let apex = [0.0, trunk_height + canopy_height, 0.0];

    for i in 0..segs {
        let b0 = ring(trunk_radius, 0.0, i);
        let b1 = ring(trunk_radius, 0.0, i + 1);
        let t0 = ring(trunk_radius, trunk_height, i);
        let t1 = ring(trunk_radius, trunk_height, i + 1);
        positions.extend(b0.iter().chain(&t0).chain(&b1));
        positions.extend(t0.iter().chain(&t1).chain(&b1));

        let c0 = ring(canopy_radius, trunk_height, i);
        let c1 = ring(canopy_radius, trunk_height, i + 1);
        let centre = [0.0, trunk_height, 0.0];
        positions.extend(c0.iter().chain(&apex).chain(&c1));
        positions.extend(centre.iter().chain(&c0).chain(&c1));
    }

    let normals = Vertices::calculate_face_normals(&positions, &[]);
    Vertices::new(positions, normals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn floor_normals_point_up_and_winding_agrees() {
        let floor = floor(10.0).unwrap();
        assert_eq!(floor.vertex_count(), 6);
        for [a, b, c] in floor.triangles() {
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn cube_is_indexed_with_outward_faces() {
        let cube = cube(2.0).unwrap();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.index_count(), 36);
        for [a, b, c] in cube.triangles() {
            let centre = (a + b + c) / 3.0;
            assert!((b - a).cross(c - a).dot(centre) > 0.0);
        }
    }

    #[test]
    fn tree_faces_outward_from_its_axis() {
        let tree = tree(8).unwrap();
        assert_eq!(tree.triangle_count(), 8 * 4);
        for [a, b, c] in tree.triangles() {
            let normal = (b - a).cross(c - a);
            let centre = (a + b + c) / 3.0;
            let radial = crate::math::Vec3::new(centre.x, 0.0, centre.z);
            // side faces point away from the trunk axis, the canopy base points down
            assert!(normal.dot(radial) > 0.0 || normal.y < 0.0);
        }
    }
}
