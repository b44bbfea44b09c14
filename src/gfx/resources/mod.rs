// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, uniform buffers, and bind groups for rendering.

pub mod global_bindings;
pub mod node_bindings;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, GlobalUBOContent};
pub use node_bindings::{MaterialUniform, NodeBindings, TransformUniform};
pub use texture_resource::TextureResource;
