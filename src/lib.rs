//! arbor: an interactive 3D scene viewer
//!
//! A transform hierarchy of meshes rendered with Phong lighting and a shadowed
//! directional light, an orbit camera and exact ray-cast picking, built on wgpu
//! and winit.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod math;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ArborApp;
pub use config::ViewerConfig;

/// Creates a viewer with the default configuration
pub fn default() -> anyhow::Result<ArborApp> {
    ArborApp::new(ViewerConfig::default())
}
