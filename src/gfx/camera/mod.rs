pub mod camera;
pub mod camera_controller;
pub mod camera_utils;

// Re-export main types
pub use camera::{Camera, Orbit};
pub use camera_controller::CameraController;
pub use camera_utils::{CameraUniform, OPENGL_TO_WGPU_MATRIX};
