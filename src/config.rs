//! Viewer configuration.
//!
//! Defaults reproduce the stock demo scene: a 1 radian field of view, an orbit
//! of radius 15 around `(-3, 2, -2)` and the three-light rig. Every field can
//! be overridden through the `with_*` builders before the viewer starts.

use std::path::PathBuf;

use crate::gfx::scene::{AmbientLight, DirectionalLight, PointLight};
use crate::math::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub field_of_view: f32,
    pub near: f32,
    pub far: f32,
    pub up: Vec3,
    pub target: Vec3,
    pub azimuth: f32,
    pub elevation: f32,
    pub radius: f32,
    /// Radians of orbit per pixel of pointer drag
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            field_of_view: 1.0,
            near: 1.0,
            far: 2000.0,
            up: Vec3::unit_y(),
            target: Vec3::new(-3.0, 2.0, -2.0),
            azimuth: -std::f32::consts::PI * 0.2,
            elevation: 3.0 * std::f32::consts::PI / 4.0,
            radius: 15.0,
            sensitivity: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightConfig {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub point: PointLight,
    /// Angular speed of the point light around the Y axis, radians per second
    pub point_orbit_speed: f32,
    /// Point the shadow camera looks at
    pub shadow_target: Vec3,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight::default(),
            directional: DirectionalLight::default(),
            point: PointLight::default(),
            point_orbit_speed: std::f32::consts::PI / 3.0,
            shadow_target: Vec3::new(0.0, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f64; 4],
    pub vsync: bool,
    pub shadow_map_size: u32,
    pub show_ui: bool,
    pub camera: CameraConfig,
    pub lights: LightConfig,
    /// Comma-separated float files used for the bootstrap trees
    pub positions_path: Option<PathBuf>,
    pub normals_path: Option<PathBuf>,
    /// GLB/GLTF asset placed next to the bootstrap trees
    pub model_path: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "arbor".to_string(),
            width: 1200,
            height: 800,
            clear_color: [0.1, 0.2, 0.3, 1.0],
            vsync: true,
            shadow_map_size: 2048,
            show_ui: true,
            camera: CameraConfig::default(),
            lights: LightConfig::default(),
            positions_path: None,
            normals_path: None,
            model_path: None,
        }
    }
}

impl ViewerConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_clear_color(mut self, color: [f64; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Shadow map resolution, clamped to a power of two between 256 and 4096
    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size.clamp(256, 4096).next_power_of_two().min(4096);
        self
    }

    pub fn with_ui(mut self, show_ui: bool) -> Self {
        self.show_ui = show_ui;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_lights(mut self, lights: LightConfig) -> Self {
        self.lights = lights;
        self
    }

    pub fn with_vertex_files(mut self, positions: impl Into<PathBuf>, normals: impl Into<PathBuf>) -> Self {
        self.positions_path = Some(positions.into());
        self.normals_path = Some(normals.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<PathBuf>) -> Self {
        self.model_path = Some(model.into());
        self
    }

    /// Applies positional command line arguments.
    ///
    /// Accepted shapes are `[positions normals]`, `[model]` and
    /// `[positions normals model]`; a single `.glb`/`.gltf` argument is a model.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathBuf>,
    {
        let args: Vec<PathBuf> = args.into_iter().map(Into::into).collect();
        let is_model = |path: &PathBuf| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("glb") || ext.eq_ignore_ascii_case("gltf"))
        };

        let (files, model): (Vec<PathBuf>, Vec<PathBuf>) = args.into_iter().partition(|p| !is_model(p));
        if let [positions, normals, ..] = files.as_slice() {
            self = self.with_vertex_files(positions.clone(), normals.clone());
        }
        if let Some(model) = model.into_iter().next() {
            self = self.with_model(model);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_scene() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera.field_of_view, 1.0);
        assert_eq!(config.camera.radius, 15.0);
        assert_eq!(config.camera.target, Vec3::new(-3.0, 2.0, -2.0));
        assert_eq!(config.lights.point.position, Vec3::new(0.0, 5.0, 5.0));
        assert_eq!(config.lights.directional.direction, Vec3::new(0.0, -1.0, -1.0));
        assert!(config.model_path.is_none());
    }

    #[test]
    fn args_split_into_vertex_files_and_model() {
        let config = ViewerConfig::default().with_args(["pos.txt", "norm.txt", "gorilla.glb"]);
        assert_eq!(config.positions_path, Some(PathBuf::from("pos.txt")));
        assert_eq!(config.normals_path, Some(PathBuf::from("norm.txt")));
        assert_eq!(config.model_path, Some(PathBuf::from("gorilla.glb")));

        let model_only = ViewerConfig::default().with_args(["scene.GLTF"]);
        assert!(model_only.positions_path.is_none());
        assert_eq!(model_only.model_path, Some(PathBuf::from("scene.GLTF")));
    }

    #[test]
    fn shadow_map_size_is_clamped() {
        assert_eq!(ViewerConfig::default().with_shadow_map_size(10).shadow_map_size, 256);
        assert_eq!(ViewerConfig::default().with_shadow_map_size(3000).shadow_map_size, 4096);
        assert_eq!(ViewerConfig::default().with_shadow_map_size(1024).shadow_map_size, 1024);
    }
}
