//! Error types shared by the scene graph, geometry and loaders.
//!
//! Numerical degeneracy (parallel rays, singular matrices, zero-length vectors)
//! is never an error here: those paths return `Option` and callers treat `None`
//! as a normal outcome.

use std::path::PathBuf;

use thiserror::Error;

use crate::gfx::scene::NodeId;

/// Structural misuse of the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("node {0} does not exist in this scene")]
    UnknownNode(NodeId),

    #[error("node {0} cannot be its own parent")]
    SelfParent(NodeId),

    #[error("parenting node {node} under {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },
}

/// Invalid geometry rejected at mesh construction time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("position buffer length {0} is not a multiple of 3")]
    RaggedPositions(usize),

    #[error("a mesh needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("expected {expected} normal floats, got {actual}")]
    NormalCountMismatch { expected: usize, actual: usize },

    #[error("expected {expected} uv floats, got {actual}")]
    UvCountMismatch { expected: usize, actual: usize },

    #[error("index count {0} is not a multiple of 3")]
    RaggedIndices(usize),

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("non-indexed vertex count {0} is not a multiple of 3")]
    PartialTriangle(usize),
}

/// Failure to read bootstrap geometry or import an asset
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid float {token:?} at byte {offset}", .path.display())]
    Parse {
        path: PathBuf,
        token: String,
        offset: usize,
    },

    #[error("failed to import {}: {source}", .path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("{}: mesh {mesh:?} has no position attribute", .path.display())]
    MissingPositions { path: PathBuf, mesh: String },

    #[error("{}: {source}", .path.display())]
    Geometry {
        path: PathBuf,
        #[source]
        source: GeometryError,
    },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Failure to bring up or drive the GPU renderer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create a surface for the window: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open the graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("shader {0:?} has not been loaded")]
    MissingShader(String),

    #[error("pipeline {0:?} is not registered")]
    UnknownPipeline(String),

    #[error("failed to acquire the next frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
}
