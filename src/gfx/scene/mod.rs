//! # Scene Management Module
//!
//! The transform hierarchy and everything hanging off it.
//!
//! ## Key Components
//!
//! - [`SceneGraph`] - Arena of [`SceneNode`]s linked by [`NodeId`]
//! - [`Mesh`] / [`Vertices`] - Validated triangle geometry and its [`Material`]
//! - [`Scene`] - The graph together with the camera and the three-light rig
//! - [`Vertex3D`] - GPU vertex layout
//!
//! ## Usage
//!
//! ```no_run
//! use arbor::gfx::scene::SceneGraph;
//! use arbor::math::{translation, Vec3};
//!
//! let mut graph = SceneGraph::new();
//! let parent = graph.create_node(translation(Vec3::new(-2.0, 0.0, 0.0)), None, Some("parent"));
//! let child = graph.create_node(translation(Vec3::new(-2.0, 0.0, 0.0)), None, Some("child"));
//! graph.set_parent(child, parent).unwrap();
//! ```

pub mod graph;
pub mod light;
pub mod material;
pub mod mesh;
pub mod node;
pub mod primitives;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use graph::SceneGraph;
pub use light::{AmbientLight, DirectionalLight, PointLight};
pub use material::{Material, TextureData, WrapMode};
pub use mesh::{Mesh, Vertices};
pub use node::{NodeId, SceneNode};
pub use scene::Scene;
pub use vertex::Vertex3D;
