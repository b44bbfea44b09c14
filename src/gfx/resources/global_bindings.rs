//! Global uniform bindings for camera and scene data
//!
//! Manages the per-frame uniform buffer shared by every draw: camera matrices,
//! the three-light rig and the light-space matrix used for shadow lookups.

use crate::{
    gfx::{
        camera::{camera_utils::convert_matrix4_to_array, CameraUniform, OPENGL_TO_WGPU_MATRIX},
        scene::Scene,
    },
    math::Vec3,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::texture_resource::TextureResource;

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly. Every three-component
/// value is widened to a `vec4` so no implicit padding is needed.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub ambient_color: [f32; 4],
    pub directional_color: [f32; 4],
    /// Direction the light travels, not normalised
    pub directional_direction: [f32; 4],
    pub point_color: [f32; 4],
    pub point_position: [f32; 4],
    /// Constant, linear and quadratic falloff terms
    pub point_attenuation: [f32; 4],
}

fn widen(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

impl GlobalUBOContent {
    pub fn new(camera: CameraUniform, scene: &Scene) -> Self {
        let light_view_proj = OPENGL_TO_WGPU_MATRIX
            * scene.directional_light.shadow_view_projection(scene.shadow_target);
        let point = &scene.point_light;

        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_view_proj: convert_matrix4_to_array(light_view_proj),
            ambient_color: widen(scene.ambient_light.color, 1.0),
            directional_color: widen(scene.directional_light.color, 1.0),
            directional_direction: widen(scene.directional_light.direction, 0.0),
            point_color: widen(point.color, 1.0),
            point_position: widen(point.position, 1.0),
            point_attenuation: [point.constant, point.linear, point.quadratic, 0.0],
        }
    }

    pub fn from_scene(scene: &Scene) -> Self {
        Self::new(scene.camera.uniform(), scene)
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Uploads this frame's camera and light state. Unchanged frames skip the write.
pub fn update_global_ubo(ubo: &mut GlobalUBO, queue: &wgpu::Queue, scene: &Scene) -> bool {
    ubo.update_content(queue, GlobalUBOContent::from_scene(scene))
}

/// Bind group layouts and bind groups for the global uniforms
///
/// The lighting group carries the shadow map alongside the uniforms and is
/// bound at slot 0 of the main pass. The shadow pass renders into that same
/// map, so it binds a uniforms-only group instead.
pub struct GlobalBindings {
    lighting_layout: BindGroupLayoutWithDesc,
    shadow_layout: BindGroupLayoutWithDesc,
    lighting_bind_group: wgpu::BindGroup,
    shadow_bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO, shadow_map: &TextureResource) -> Self {
        let lighting_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(device, "Globals Bind Group Layout");

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Shadow Globals Bind Group Layout");

        let lighting_bind_group = BindGroupBuilder::new(&lighting_layout)
            .resource(ubo.binding_resource())
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .create(device, "Globals Bind Group");

        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .resource(ubo.binding_resource())
            .create(device, "Shadow Globals Bind Group");

        GlobalBindings {
            lighting_layout,
            shadow_layout,
            lighting_bind_group,
            shadow_bind_group,
        }
    }

    pub fn lighting_layout(&self) -> &wgpu::BindGroupLayout {
        &self.lighting_layout.layout
    }

    pub fn shadow_layout(&self) -> &wgpu::BindGroupLayout {
        &self.shadow_layout.layout
    }

    pub fn lighting_bind_group(&self) -> &wgpu::BindGroup {
        &self.lighting_bind_group
    }

    pub fn shadow_bind_group(&self) -> &wgpu::BindGroup {
        &self.shadow_bind_group
    }
}
