//! WGPU-based rendering engine for the arbor viewer
//!
//! Owns the surface, device and every GPU resource the viewer needs: the depth
//! buffer, the directional light's shadow map, the global uniforms and a cache
//! of per-node buffers. Each frame renders a depth-only shadow pass followed by
//! the Phong lighting pass and an optional UI overlay.

use std::sync::Arc;

use log::{info, warn};
use wgpu::TextureFormat;

use crate::{
    config::ViewerConfig,
    error::RenderError,
    gfx::{
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
            NodeBindings, TextureResource,
        },
        scene::Scene,
    },
};

use super::node_cache::NodeCache;
use super::pipeline_manager::{PipelineConfig, PipelineManager};

const SHADOW_PIPELINE: &str = "Shadow";
const PHONG_PIPELINE: &str = "Phong";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    clear_color: wgpu::Color,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    node_bindings: NodeBindings,
    shadow_map: TextureResource,
    white_texture: TextureResource,
    nodes: NodeCache,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Picks the first non-sRGB surface format, creates the depth buffer and a
    /// square shadow map of `config.shadow_map_size`, and builds both pipelines
    /// up front so shader errors surface at startup.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        viewer: &ViewerConfig,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(viewer.vsync),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, viewer.shadow_map_size);
        let white_texture = TextureResource::white(&device, &queue);

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo, &shadow_map);
        let node_bindings = NodeBindings::new(&device);

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("shadow", include_str!("shaders/shadow.wgsl"));
        pipeline_manager.load_shader("phong", include_str!("shaders/phong.wgsl"));

        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("Shadow Pipeline")
                .with_shader("shadow")
                .with_bind_group_layouts(vec![
                    global_bindings.shadow_layout().clone(),
                    node_bindings.layout().clone(),
                ])
                .with_cull_mode(None)
                .with_vertex_only()
                .with_color_targets(vec![])
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_depth_bias(wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                }),
        );

        // Imported meshes have no reliable winding, so back faces are lit by
        // flipping the normal in the fragment shader instead of being culled.
        pipeline_manager.register_pipeline(
            PHONG_PIPELINE,
            PipelineConfig::default()
                .with_label("Phong Pipeline")
                .with_shader("phong")
                .with_bind_group_layouts(vec![
                    global_bindings.lighting_layout().clone(),
                    node_bindings.layout().clone(),
                ])
                .with_cull_mode(None)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_surface_format(format),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in &errors {
                warn!("{error}");
            }
        }

        let [r, g, b, a] = viewer.clear_color;

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            clear_color: wgpu::Color { r, g, b, a },
            pipeline_manager,
            global_ubo,
            global_bindings,
            node_bindings,
            shadow_map,
            white_texture,
            nodes: NodeCache::new(),
        })
    }

    /// Uploads this frame's camera, lights and node data
    pub fn update(&mut self, scene: &Scene) {
        update_global_ubo(&mut self.global_ubo, &self.queue, scene);
        self.nodes.sync(
            &self.device,
            &self.queue,
            &self.node_bindings,
            &self.white_texture,
            &scene.graph,
        );
    }

    /// Renders a frame with an optional UI overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped; only
    /// unrecoverable acquisition failures are returned.
    pub fn render_frame<F>(&mut self, ui_callback: Option<F>) -> Result<(), RenderError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("timed out waiting for the next frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: depth from the directional light
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(SHADOW_PIPELINE) {
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.shadow_bind_group(), &[]);
                for node in self.nodes.iter() {
                    shadow_pass.set_bind_group(1, node.bind_group(), &[]);
                    node.draw(&mut shadow_pass);
                }
            }
        }

        // PASS 2: Phong lighting with shadow lookups
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(PHONG_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.global_bindings.lighting_bind_group(), &[]);
                for node in self.nodes.iter() {
                    render_pass.set_bind_group(1, node.bind_group(), &[]);
                    node.draw(&mut render_pass);
                }
            }
        }

        // PASS 3: UI overlay (if provided)
        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the surface and depth buffer. Zero sizes (minimised windows) are
    /// ignored; the shadow map keeps its fixed resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Switches between Fifo (vsync) and Immediate presentation
    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = present_mode(enable);
        self.surface.configure(&self.device, &self.config);
    }

    /// Number of nodes with GPU buffers
    pub fn cached_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::Immediate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_selects_fifo() {
        assert_eq!(present_mode(true), wgpu::PresentMode::Fifo);
        assert_eq!(present_mode(false), wgpu::PresentMode::Immediate);
    }
}
