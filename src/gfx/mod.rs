//! # Graphics Module
//!
//! Everything between the scene description and pixels on screen:
//!
//! - **Scene** ([`scene`]) - node hierarchy, meshes, materials and lights
//! - **Camera** ([`camera`]) - orbit camera and its pointer controller
//! - **Ray casting** ([`raycast`]) - exact ray/triangle tests over the hierarchy
//! - **Picking** ([`picking`]) - window pixels to the frontmost hit
//! - **Loaders** ([`loaders`]) - vertex text files and glTF assets
//! - **Rendering** ([`rendering`]) - shadow and Phong passes on wgpu
//! - **Resources** ([`resources`]) - uniforms, bind groups and textures
//! - **UI** ([`ui`]) - Dear ImGui overlay

pub mod camera;
pub mod loaders;
pub mod picking;
pub mod raycast;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod ui;

// Re-export commonly used types
pub use camera::Camera;
pub use rendering::render_engine::RenderEngine;
