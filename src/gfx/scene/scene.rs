use log::info;

use crate::config::ViewerConfig;
use crate::error::SceneError;
use crate::gfx::camera::Camera;
use crate::math::{Mat4, Vec3};

use super::graph::SceneGraph;
use super::light::{AmbientLight, DirectionalLight, PointLight};
use super::mesh::Mesh;
use super::node::NodeId;

/// Main scene containing the node hierarchy, camera and lights
#[derive(Debug, Clone)]
pub struct Scene {
    pub graph: SceneGraph,
    pub camera: Camera,
    pub ambient_light: AmbientLight,
    pub directional_light: DirectionalLight,
    pub point_light: PointLight,
    /// Radians per second the point light travels around the Y axis
    pub point_orbit_speed: f32,
    /// Centre of the directional light's shadow volume
    pub shadow_target: Vec3,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        let lights = crate::config::LightConfig::default();
        Self {
            graph: SceneGraph::new(),
            camera,
            ambient_light: lights.ambient,
            directional_light: lights.directional,
            point_light: lights.point,
            point_orbit_speed: lights.point_orbit_speed,
            shadow_target: lights.shadow_target,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        let aspect = config.width as f32 / config.height.max(1) as f32;
        let lights = &config.lights;
        Self {
            graph: SceneGraph::new(),
            camera: Camera::new(&config.camera, aspect),
            ambient_light: lights.ambient,
            directional_light: lights.directional,
            point_light: lights.point,
            point_orbit_speed: lights.point_orbit_speed,
            shadow_target: lights.shadow_target,
        }
    }

    /// Advances per-frame animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.point_light.orbit(self.point_orbit_speed * dt);
    }

    /// Convenience over [`SceneGraph::create_node`]
    pub fn add_node(&mut self, transform: Mat4, mesh: Option<Mesh>, name: Option<&str>) -> NodeId {
        self.graph.create_node(transform, mesh, name)
    }

    pub fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError> {
        self.graph.set_parent(node, parent)
    }

    /// Top-level nodes, each the root of an independent tree
    pub fn top_level_nodes(&self) -> Vec<NodeId> {
        self.graph.roots().collect()
    }

    pub fn log_summary(&self) {
        let meshes = self.graph.iter().filter(|n| n.mesh().is_some()).count();
        info!(
            "scene: {} nodes ({} with geometry), {} top-level",
            self.graph.node_count(),
            meshes,
            self.top_level_nodes().len()
        );
    }
}
