//! # Vertex Data Structures
//!
//! GPU vertex format shared by the shadow and lighting pipelines, plus the
//! conversion from a validated [`Vertices`] buffer.

use super::mesh::Vertices;

/// A 3D vertex with position, normal and texture coordinate.
///
/// The `#[repr(C)]` attribute ensures the struct has a C-compatible memory
/// layout, which is required for GPU buffer operations.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
    /// Texture coordinate, zero for untextured geometry
    pub uv: [f32; 2],
}

impl Vertex3D {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Attribute 0: Position (Float32x3)
    /// - Attribute 1: Normal (Float32x3)
    /// - Attribute 2: UV (Float32x2)
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Interleaves a mesh's attribute buffers
    pub fn interleave(vertices: &Vertices) -> Vec<Vertex3D> {
        let positions = vertices.positions().chunks_exact(3);
        let normals = vertices.normals().chunks_exact(3);
        let uvs = vertices.uvs();

        positions
            .zip(normals)
            .enumerate()
            .map(|(i, (p, n))| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
                uv: uvs.map_or([0.0, 0.0], |uv| [uv[i * 2], uv[i * 2 + 1]]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_keeps_vertex_order_and_uvs() {
        let vertices = Vertices::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        )
        .unwrap()
        .with_uvs(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
        .unwrap();

        let interleaved = Vertex3D::interleave(&vertices);
        assert_eq!(interleaved.len(), 3);
        assert_eq!(interleaved[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(interleaved[2].uv, [0.0, 1.0]);
        assert_eq!(std::mem::size_of::<Vertex3D>(), 32);
    }
}
