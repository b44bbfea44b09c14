use std::sync::Arc;

use crate::error::GeometryError;
use crate::math::Vec3;

use super::material::Material;

/// Validated triangle geometry.
///
/// Positions and normals hold three floats per vertex. Without indices every
/// three consecutive vertices form one triangle; with indices every index
/// triple does. Construction rejects anything that would produce partial or
/// out-of-range triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertices {
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Option<Vec<f32>>,
    indices: Option<Vec<u32>>,
}

impl Vertices {
    /// Non-indexed triangle list.
    pub fn new(positions: Vec<f32>, normals: Vec<f32>) -> Result<Self, GeometryError> {
        let vertex_count = Self::check_positions(&positions)?;
        Self::check_normals(&positions, &normals)?;
        if vertex_count % 3 != 0 {
            return Err(GeometryError::PartialTriangle(vertex_count));
        }

        Ok(Self {
            positions,
            normals,
            uvs: None,
            indices: None,
        })
    }

    /// Indexed triangle list. An empty index buffer falls back to [`Vertices::new`].
    pub fn indexed(
        positions: Vec<f32>,
        normals: Vec<f32>,
        indices: Vec<u32>,
    ) -> Result<Self, GeometryError> {
        if indices.is_empty() {
            return Self::new(positions, normals);
        }

        let vertex_count = Self::check_positions(&positions)?;
        Self::check_normals(&positions, &normals)?;
        if indices.len() % 3 != 0 {
            return Err(GeometryError::RaggedIndices(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        Ok(Self {
            positions,
            normals,
            uvs: None,
            indices: Some(indices),
        })
    }

    /// Attaches two texture coordinates per vertex.
    pub fn with_uvs(mut self, uvs: Vec<f32>) -> Result<Self, GeometryError> {
        let expected = self.vertex_count() * 2;
        if uvs.len() != expected {
            return Err(GeometryError::UvCountMismatch {
                expected,
                actual: uvs.len(),
            });
        }
        self.uvs = Some(uvs);
        Ok(self)
    }

    fn check_positions(positions: &[f32]) -> Result<usize, GeometryError> {
        if positions.len() % 3 != 0 {
            return Err(GeometryError::RaggedPositions(positions.len()));
        }
        let vertex_count = positions.len() / 3;
        if vertex_count < 3 {
            return Err(GeometryError::TooFewVertices(vertex_count));
        }
        Ok(vertex_count)
    }

    fn check_normals(positions: &[f32], normals: &[f32]) -> Result<(), GeometryError> {
        if normals.len() != positions.len() {
            return Err(GeometryError::NormalCountMismatch {
                expected: positions.len(),
                actual: normals.len(),
            });
        }
        Ok(())
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn uvs(&self) -> Option<&[f32]> {
        self.uvs.as_deref()
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of indices, zero for non-indexed geometry
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    fn position(&self, vertex: usize) -> Vec3 {
        let p = &self.positions[vertex * 3..vertex * 3 + 3];
        Vec3::new(p[0], p[1], p[2])
    }

    /// Triangle corners in emission order.
    ///
    /// Non-indexed geometry walks the position buffer nine floats at a time;
    /// indexed geometry dereferences each index triple. The yielded position is
    /// the triangle's ordinal in either case.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        (0..self.triangle_count()).map(move |triangle| {
            let [a, b, c] = match &self.indices {
                Some(indices) => [
                    indices[triangle * 3] as usize,
                    indices[triangle * 3 + 1] as usize,
                    indices[triangle * 3 + 2] as usize,
                ],
                None => [triangle * 3, triangle * 3 + 1, triangle * 3 + 2],
            };
            [self.position(a), self.position(b), self.position(c)]
        })
    }

    /// Per-vertex normals averaged from the faces that share each vertex.
    ///
    /// Used when an asset ships without normals. `indices` may be empty for
    /// a non-indexed triangle list.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; vertex_count * 3];

        let sequential: Vec<u32>;
        let triangles = if indices.is_empty() {
            sequential = (0..(vertex_count - vertex_count % 3) as u32).collect();
            &sequential
        } else {
            indices
        };

        let corner = |i: usize| Vec3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]);

        for triangle in triangles.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0.max(i1).max(i2) >= vertex_count {
                continue;
            }

            let v0 = corner(i0);
            let face_normal = (corner(i1) - v0).cross(corner(i2) - v0);

            for vertex in [i0, i1, i2] {
                normals[vertex * 3] += face_normal.x;
                normals[vertex * 3 + 1] += face_normal.y;
                normals[vertex * 3 + 2] += face_normal.z;
            }
        }

        for normal in normals.chunks_exact_mut(3) {
            let n = crate::math::normalize(Vec3::new(normal[0], normal[1], normal[2]));
            normal.copy_from_slice(&[n.x, n.y, n.z]);
        }

        normals
    }
}

/// Geometry plus the material it is shaded with.
///
/// Geometry is shared: cloning a mesh or passing the same `Arc` to several
/// meshes does not copy vertex data. Replace `vertices` wholesale to change it.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Arc<Vertices>,
    pub material: Material,
}

impl Mesh {
    pub fn new(vertices: impl Into<Arc<Vertices>>, material: Material) -> Self {
        Self {
            vertices: vertices.into(),
            material,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quad_positions() -> Vec<f32> {
        vec![
            -10.0, 0.0, -10.0, // back left
            -10.0, 0.0, 10.0, // front left
            10.0, 0.0, -10.0, // back right
            -10.0, 0.0, 10.0, // front left
            10.0, 0.0, 10.0, // front right
            10.0, 0.0, -10.0, // back right
        ]
    }

    #[test]
    fn rejects_too_few_vertices() {
        let err = Vertices::new(vec![0.0; 6], vec![0.0; 6]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices(2));
    }

    #[test]
    fn rejects_ragged_buffers() {
        assert_eq!(
            Vertices::new(vec![0.0; 10], vec![0.0; 10]).unwrap_err(),
            GeometryError::RaggedPositions(10)
        );
        assert_eq!(
            Vertices::new(vec![0.0; 12], vec![0.0; 12]).unwrap_err(),
            GeometryError::PartialTriangle(4)
        );
        assert_eq!(
            Vertices::new(vec![0.0; 9], vec![0.0; 6]).unwrap_err(),
            GeometryError::NormalCountMismatch {
                expected: 9,
                actual: 6
            }
        );
    }

    #[test]
    fn rejects_bad_indices() {
        assert_eq!(
            Vertices::indexed(vec![0.0; 12], vec![0.0; 12], vec![0, 1, 2, 3]).unwrap_err(),
            GeometryError::RaggedIndices(4)
        );
        assert_eq!(
            Vertices::indexed(vec![0.0; 12], vec![0.0; 12], vec![0, 1, 4]).unwrap_err(),
            GeometryError::IndexOutOfRange {
                index: 4,
                vertex_count: 4
            }
        );
    }

    #[test]
    fn uv_count_must_match_vertices() {
        let vertices = Vertices::new(vec![0.0; 9], vec![0.0; 9]).unwrap();
        assert_eq!(
            vertices.with_uvs(vec![0.0; 4]).unwrap_err(),
            GeometryError::UvCountMismatch {
                expected: 6,
                actual: 4
            }
        );
    }

    #[test]
    fn non_indexed_triangles_follow_emission_order() {
        let positions = quad_positions();
        let vertices = Vertices::new(positions.clone(), vec![0.0; positions.len()]).unwrap();

        let triangles: Vec<_> = vertices.triangles().collect();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1][0], Vec3::new(-10.0, 0.0, 10.0));
        assert_eq!(vertices.index_count(), 0);
    }

    #[test]
    fn indexed_triangles_dereference_indices() {
        let positions = vec![
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            1.0, 1.0, 0.0,
        ];
        let vertices =
            Vertices::indexed(positions, vec![0.0; 12], vec![0, 1, 2, 2, 1, 3]).unwrap();

        let triangles: Vec<_> = vertices.triangles().collect();
        assert_eq!(vertices.triangle_count(), 2);
        assert_eq!(triangles[1], [
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0)
        ]);
    }

    #[test]
    fn face_normals_point_along_winding() {
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = Vertices::calculate_face_normals(&positions, &[]);
        for n in normals.chunks_exact(3) {
            assert_abs_diff_eq!(Vec3::new(n[0], n[1], n[2]), Vec3::unit_z(), epsilon = 1e-5);
        }

        let indexed = Vertices::calculate_face_normals(&positions, &[0, 2, 1]);
        assert_abs_diff_eq!(
            Vec3::new(indexed[0], indexed[1], indexed[2]),
            -Vec3::unit_z(),
            epsilon = 1e-5
        );
    }
}
