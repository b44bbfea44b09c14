//! # Geometry Loaders
//!
//! Everything that turns files on disk into scene content:
//!
//! - [`vertex_file`] - comma-separated float runs used for bootstrap geometry
//! - [`gltf_loader`] - GLB/GLTF assets imported as a linked node subtree

pub mod gltf_loader;
pub mod vertex_file;

pub use gltf_loader::load_gltf;
pub use vertex_file::{load_vertex_files, read_floats};
