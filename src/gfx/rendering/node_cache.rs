//! GPU mirrors of the scene graph's meshes, keyed by [`NodeId`].
//!
//! Buffers are created the first time a node with a mesh is seen and rebuilt
//! only when its geometry or texture changes. Transform and material uniforms
//! are re-uploaded every frame; unchanged contents skip the write.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use wgpu::util::DeviceExt;

use crate::gfx::resources::{
    node_bindings::{MaterialUBO, TransformUBO},
    MaterialUniform, NodeBindings, TextureResource, TransformUniform,
};
use crate::gfx::scene::{Mesh, NodeId, SceneGraph, TextureData, Vertex3D, Vertices};

/// GPU resources for one node's mesh
pub struct NodeGpu {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    element_count: u32,
    transform: TransformUBO,
    material: MaterialUBO,
    bind_group: wgpu::BindGroup,
    texture: Option<(Arc<TextureData>, TextureResource)>,
    // held so the allocation cannot be reused while this entry exists
    geometry: Arc<Vertices>,
}

impl NodeGpu {
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Records the draw for this node; bind group 1 must already be set.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(indices) => {
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.element_count, 0, 0..1);
            }
            None => pass.draw(0..self.element_count, 0..1),
        }
    }
}

#[derive(Default)]
pub struct NodeCache {
    entries: HashMap<NodeId, NodeGpu>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached nodes in id order, so draw order is stable between frames
    pub fn iter(&self) -> impl Iterator<Item = &NodeGpu> {
        let mut ids: Vec<&NodeId> = self.entries.keys().collect();
        ids.sort();
        ids.into_iter().filter_map(|id| self.entries.get(id))
    }

    /// Brings the cache in line with `graph`: new meshes are uploaded, changed
    /// ones rebuilt and entries for nodes without a mesh dropped.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bindings: &NodeBindings,
        white: &TextureResource,
        graph: &SceneGraph,
    ) {
        self.entries
            .retain(|id, _| graph.get(*id).is_some_and(|node| node.mesh().is_some()));

        for node in graph.iter() {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let id = node.id();

            let stale = match self.entries.get(&id) {
                Some(entry) => {
                    !same_geometry(&entry.geometry, &mesh.vertices)
                        || !same_texture(entry.texture.as_ref().map(|(data, _)| data), mesh.material.texture())
                }
                None => true,
            };

            if stale {
                debug!("uploading mesh for {}", node.display_name());
                let entry = Self::upload(device, queue, bindings, white, id, mesh);
                self.entries.insert(id, entry);
            }

            if let Some(entry) = self.entries.get_mut(&id) {
                entry
                    .transform
                    .update_content(queue, TransformUniform::new(node.world_transform()));
                entry
                    .material
                    .update_content(queue, MaterialUniform::new(&mesh.material));
            }
        }
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bindings: &NodeBindings,
        white: &TextureResource,
        id: NodeId,
        mesh: &Mesh,
    ) -> NodeGpu {
        let label = format!("Node {id}");
        let vertices = Vertex3D::interleave(&mesh.vertices);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = mesh.vertices.indices().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Indices")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        let element_count = match mesh.vertices.indices() {
            Some(indices) => indices.len(),
            None => mesh.vertices.vertex_count(),
        } as u32;

        let transform = TransformUBO::new(device);
        let material = MaterialUBO::new(device);

        let texture = mesh
            .material
            .texture()
            .map(|data| (data.clone(), TextureResource::from_texture_data(device, queue, data)));
        let bound_texture = texture.as_ref().map_or(white, |(_, resource)| resource);
        let bind_group = bindings.create_bind_group(device, &transform, &material, bound_texture, &label);

        NodeGpu {
            vertex_buffer,
            index_buffer,
            element_count,
            transform,
            material,
            bind_group,
            texture,
            geometry: mesh.vertices.clone(),
        }
    }
}

fn same_geometry(cached: &Arc<Vertices>, current: &Arc<Vertices>) -> bool {
    Arc::ptr_eq(cached, current)
}

fn same_texture(cached: Option<&Arc<TextureData>>, current: Option<&Arc<TextureData>>) -> bool {
    match (cached, current) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{primitives, Material, WrapMode};

    fn texture() -> Arc<TextureData> {
        Arc::new(TextureData {
            name: Some("checker".into()),
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
        })
    }

    #[test]
    fn texture_identity_is_by_allocation() {
        let a = texture();
        let b = texture();
        assert!(same_texture(None, None));
        assert!(same_texture(Some(&a), Some(&a.clone())));
        assert!(!same_texture(Some(&a), Some(&b)));
        assert!(!same_texture(Some(&a), None));
    }

    #[test]
    fn replaced_geometry_never_matches_the_cached_allocation() {
        let mut mesh = Mesh::new(primitives::floor(1.0).unwrap(), Material::default());
        let cached = mesh.vertices.clone();

        mesh.material = Material::default();
        assert!(same_geometry(&cached, &mesh.vertices));

        // identical contents and counts, new allocation
        mesh.vertices = Arc::new(primitives::floor(1.0).unwrap());
        assert_eq!(*cached, *mesh.vertices);
        assert!(!same_geometry(&cached, &mesh.vertices));

        // a second swap cannot land on the cached address while it is held
        mesh.vertices = Arc::new(primitives::floor(1.0).unwrap());
        assert!(!same_geometry(&cached, &mesh.vertices));
    }
}
