//! Per-node GPU data: world transform, Phong material and base texture.

use cgmath::Matrix;

use crate::{
    gfx::{camera::camera_utils::convert_matrix4_to_array, scene::Material},
    math::{self, Mat4},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::texture_resource::TextureResource;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals under non-uniform scale
    pub normal_matrix: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn new(world: Mat4) -> Self {
        let normal = math::inverse(world).map(|m| m.transpose()).unwrap_or(world);
        Self {
            model: convert_matrix4_to_array(world),
            normal_matrix: convert_matrix4_to_array(normal),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    /// Flat colour; white for textured materials so the texel passes through
    pub color: [f32; 4],
    /// Specular colour with the shininess exponent in `w`
    pub specular: [f32; 4],
    /// `x` is 1 when the base texture should be sampled
    pub flags: [f32; 4],
}

impl MaterialUniform {
    pub fn new(material: &Material) -> Self {
        let specular = material.specular_color();
        let (color, textured) = match material {
            Material::Color { color, .. } => ([color.x, color.y, color.z, 1.0], 0.0),
            Material::Texture { .. } => ([1.0; 4], 1.0),
        };
        Self {
            color,
            specular: [specular.x, specular.y, specular.z, material.shininess()],
            flags: [textured, 0.0, 0.0, 0.0],
        }
    }
}

pub type TransformUBO = UniformBuffer<TransformUniform>;
pub type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Layout of bind group 1: transform, material, base texture and its sampler
pub struct NodeBindings {
    layout: BindGroupLayoutWithDesc,
}

impl NodeBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Node Bind Group Layout");

        NodeBindings { layout }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        transform: &TransformUBO,
        material: &MaterialUBO,
        texture: &TextureResource,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.layout)
            .resource(transform.binding_resource())
            .resource(material.binding_resource())
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::TextureData;
    use crate::math::{scaling, Vec3};
    use cgmath::SquareMatrix;
    use std::sync::Arc;

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let uniform = TransformUniform::new(scaling(Vec3::new(2.0, 1.0, 4.0)));
        assert_eq!(uniform.normal_matrix[0][0], 0.5);
        assert_eq!(uniform.normal_matrix[2][2], 0.25);

        let singular = TransformUniform::new(scaling(Vec3::new(1.0, 0.0, 1.0)));
        assert_eq!(singular.normal_matrix, singular.model);
        assert_eq!(TransformUniform::new(Mat4::identity()).model[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn material_uniform_packs_shininess_and_texture_flag() {
        let flat = MaterialUniform::new(&Material::color(
            Vec3::new(0.1, 0.7, 0.1),
            Vec3::new(0.2, 0.2, 0.2),
            0.5,
        ));
        assert_eq!(flat.color, [0.1, 0.7, 0.1, 1.0]);
        assert_eq!(flat.specular[3], 0.5);
        assert_eq!(flat.flags[0], 0.0);

        let textured = MaterialUniform::new(&Material::Texture {
            texture: Arc::new(TextureData {
                name: None,
                width: 1,
                height: 1,
                pixels: vec![255; 4],
                wrap_u: Default::default(),
                wrap_v: Default::default(),
            }),
            shininess: 8.0,
        });
        assert_eq!(textured.color, [1.0; 4]);
        assert_eq!(textured.flags[0], 1.0);
        assert_eq!(textured.specular[3], 8.0);
    }
}
