//! Core rendering functionality
//!
//! Handles render pipelines, per-node GPU resources and frame rendering.

pub mod node_cache;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use node_cache::NodeCache;
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
