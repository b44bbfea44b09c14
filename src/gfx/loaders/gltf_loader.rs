//! GLB/GLTF import into the scene graph.
//!
//! Every glTF node becomes a [`SceneNode`](crate::gfx::scene::SceneNode) with
//! its name and local matrix, linked the same way as in the asset. A mesh's
//! first triangle primitive lands on the node itself; further primitives hang
//! off it as children with an identity transform.

use std::path::Path;
use std::sync::Arc;

use cgmath::SquareMatrix;
use gltf::image::Format;
use gltf::mesh::Mode;
use gltf::texture::WrappingMode;
use log::{debug, info, warn};

use crate::error::LoadError;
use crate::gfx::scene::{Material, Mesh, NodeId, SceneGraph, TextureData, Vertices, WrapMode};
use crate::math::{Mat4, Vec3};

/// Shininess given to imported surfaces, which carry no Phong exponent
pub const IMPORTED_SHININESS: f32 = 0.5;

/// Imports the asset at `path` and returns the root of the new subtree.
///
/// A scene with several top-level nodes is grouped under one node named after
/// the file stem. World transforms are propagated once, after linking.
pub fn load_gltf(path: impl AsRef<Path>, graph: &mut SceneGraph) -> Result<NodeId, LoadError> {
    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path).map_err(|source| LoadError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let importer = Importer {
        path,
        buffers: &buffers,
        images: &images,
    };

    let scene = document.default_scene().or_else(|| document.scenes().next());
    let top_level: Vec<gltf::Node> = match scene {
        Some(scene) => scene.nodes().collect(),
        None => Vec::new(),
    };

    let root = match top_level.as_slice() {
        [single] => importer.import_tree(single.clone(), None, graph)?,
        nodes => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".to_string());
            let group = graph.create_node(Mat4::identity(), None, Some(&stem));
            for node in nodes {
                importer.import_tree(node.clone(), Some(group), graph)?;
            }
            group
        }
    };

    graph.update_world_transform(root)?;
    info!(
        "imported {} ({} nodes below {})",
        path.display(),
        graph.descendants(root).len() + 1,
        root
    );
    Ok(root)
}

struct Importer<'a> {
    path: &'a Path,
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
}

impl Importer<'_> {
    fn import_tree(
        &self,
        top: gltf::Node<'_>,
        parent: Option<NodeId>,
        graph: &mut SceneGraph,
    ) -> Result<NodeId, LoadError> {
        let root = self.import_node(&top, graph)?;
        if let Some(parent) = parent {
            graph.set_parent(root, parent)?;
        }

        let mut stack: Vec<(gltf::Node, NodeId)> = top.children().map(|c| (c, root)).collect();
        stack.reverse();

        while let Some((node, parent)) = stack.pop() {
            let id = self.import_node(&node, graph)?;
            graph.set_parent(id, parent)?;

            let children: Vec<gltf::Node> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, id)));
        }

        Ok(root)
    }

    fn import_node(&self, node: &gltf::Node<'_>, graph: &mut SceneGraph) -> Result<NodeId, LoadError> {
        let local = Mat4::from(node.transform().matrix());
        let name = node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("node{}", node.index()));

        let meshes = match node.mesh() {
            Some(mesh) => self.convert_mesh(&mesh)?,
            None => Vec::new(),
        };
        let mut meshes = meshes.into_iter();

        let id = graph.create_node(local, meshes.next(), Some(&name));
        for (i, extra) in meshes.enumerate() {
            let child_name = format!("{name}#{}", i + 1);
            let child = graph.create_node(Mat4::identity(), Some(extra), Some(&child_name));
            graph.set_parent(child, id)?;
        }
        Ok(id)
    }

    fn convert_mesh(&self, mesh: &gltf::Mesh<'_>) -> Result<Vec<Mesh>, LoadError> {
        let mesh_name = mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));
        let mut converted = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                debug!("{mesh_name}: skipping {:?} primitive", primitive.mode());
                continue;
            }

            let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(|d| &d.0[..]));
            let positions: Vec<f32> = reader
                .read_positions()
                .ok_or_else(|| LoadError::MissingPositions {
                    path: self.path.to_path_buf(),
                    mesh: mesh_name.clone(),
                })?
                .flatten()
                .collect();

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|read| read.into_u32().collect())
                .unwrap_or_default();

            let normals: Vec<f32> = match reader.read_normals() {
                Some(normals) => normals.flatten().collect(),
                None => Vertices::calculate_face_normals(&positions, &indices),
            };

            let geometry = |source| LoadError::Geometry {
                path: self.path.to_path_buf(),
                source,
            };
            let mut vertices = Vertices::indexed(positions, normals, indices).map_err(geometry)?;

            if let Some(uvs) = reader.read_tex_coords(0) {
                let uvs: Vec<f32> = uvs.into_f32().flatten().collect();
                vertices = vertices.with_uvs(uvs).map_err(geometry)?;
            }

            let material = self.convert_material(&primitive.material(), vertices.uvs().is_some());
            converted.push(Mesh::new(vertices, material));
        }

        Ok(converted)
    }

    fn convert_material(&self, material: &gltf::Material<'_>, has_uvs: bool) -> Material {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();
        let fallback = Material::color(Vec3::new(r, g, b), Vec3::new(0.2, 0.2, 0.2), IMPORTED_SHININESS);

        let Some(info) = pbr.base_color_texture() else {
            return fallback;
        };
        if !has_uvs {
            warn!("{}: textured material without UVs, using its base colour", self.path.display());
            return fallback;
        }

        let texture = info.texture();
        let Some(image) = self.images.get(texture.source().index()) else {
            return fallback;
        };
        let Some(pixels) = to_rgba8(image) else {
            warn!(
                "{}: unsupported texture format {:?}, using the base colour",
                self.path.display(),
                image.format
            );
            return fallback;
        };

        let sampler = texture.sampler();
        Material::Texture {
            texture: Arc::new(TextureData {
                name: texture.name().or_else(|| material.name()).map(str::to_owned),
                width: image.width,
                height: image.height,
                pixels,
                wrap_u: wrap_mode(sampler.wrap_s()),
                wrap_v: wrap_mode(sampler.wrap_t()),
            }),
            shininess: IMPORTED_SHININESS,
        }
    }
}

pub(crate) fn wrap_mode(mode: WrappingMode) -> WrapMode {
    match mode {
        WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
        WrappingMode::MirroredRepeat => WrapMode::MirroredRepeat,
        WrappingMode::Repeat => WrapMode::Repeat,
    }
}

/// Expands decoded image data to tightly packed RGBA8. 16-bit channels keep
/// their high byte; float formats are not supported.
pub(crate) fn to_rgba8(image: &gltf::image::Data) -> Option<Vec<u8>> {
    let pixels = &image.pixels;
    let rgba = match image.format {
        Format::R8 => pixels.iter().flat_map(|&r| [r, r, r, 255]).collect(),
        Format::R8G8 => pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8G8B8 => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8B8A8 => pixels.clone(),
        Format::R16 => pixels
            .chunks_exact(2)
            .flat_map(|p| [p[1], p[1], p[1], 255])
            .collect(),
        Format::R16G16B16 => pixels
            .chunks_exact(6)
            .flat_map(|p| [p[1], p[3], p[5], 255])
            .collect(),
        Format::R16G16B16A16 => pixels
            .chunks_exact(8)
            .flat_map(|p| [p[1], p[3], p[5], p[7]])
            .collect(),
        _ => return None,
    };
    Some(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn image(format: Format, pixels: Vec<u8>) -> gltf::image::Data {
        gltf::image::Data {
            pixels,
            format,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn grey_and_rgb_images_expand_to_rgba() {
        assert_eq!(to_rgba8(&image(Format::R8, vec![7])), Some(vec![7, 7, 7, 255]));
        assert_eq!(
            to_rgba8(&image(Format::R8G8B8, vec![1, 2, 3])),
            Some(vec![1, 2, 3, 255])
        );
        assert_eq!(
            to_rgba8(&image(Format::R8G8B8A8, vec![1, 2, 3, 4])),
            Some(vec![1, 2, 3, 4])
        );
    }

    #[test]
    fn sixteen_bit_images_keep_the_high_byte() {
        // little-endian: high byte second
        let pixels = vec![0x00, 0x10, 0x00, 0x20, 0x00, 0x30];
        assert_eq!(
            to_rgba8(&image(Format::R16G16B16, pixels)),
            Some(vec![0x10, 0x20, 0x30, 255])
        );
    }

    #[test]
    fn float_images_are_unsupported() {
        assert_eq!(to_rgba8(&image(Format::R32G32B32FLOAT, vec![0; 12])), None);
    }

    #[test]
    fn wrap_modes_map_one_to_one() {
        assert_eq!(wrap_mode(WrappingMode::ClampToEdge), WrapMode::ClampToEdge);
        assert_eq!(wrap_mode(WrappingMode::MirroredRepeat), WrapMode::MirroredRepeat);
        assert_eq!(wrap_mode(WrappingMode::Repeat), WrapMode::Repeat);
    }

    #[test]
    fn missing_asset_is_reported_with_its_path() {
        let mut graph = SceneGraph::new();
        let err = load_gltf("/no/such/model.glb", &mut graph).unwrap_err();
        assert!(matches!(err, LoadError::Gltf { .. }));
        assert!(err.to_string().contains("model.glb"));
        assert!(graph.is_empty());
    }

    #[test]
    fn embedded_gltf_builds_a_linked_subtree() {
        // one triangle, a parent node with a translated child
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let bytes: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(&bytes)
        );
        let json = format!(
            r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0]}}],
  "nodes": [
    {{"name": "body", "children": [1]}},
    {{"name": "arm", "mesh": 0, "translation": [2.0, 0.0, 0.0]}}
  ],
  "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
  "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}}],
  "bufferViews": [{{"buffer": 0, "byteLength": 36}}],
  "buffers": [{{"byteLength": 36, "uri": "{uri}"}}]
}}"#
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linked.gltf");
        std::fs::write(&path, json).unwrap();

        let mut graph = SceneGraph::new();
        let root = load_gltf(&path, &mut graph).unwrap();

        let body = graph.get(root).unwrap();
        assert_eq!(body.name(), Some("body"));
        assert_eq!(body.children().len(), 1);

        let arm = graph.get(body.children()[0]).unwrap();
        assert_eq!(arm.name(), Some("arm"));
        assert_eq!(arm.parent(), Some(root));
        let mesh = arm.mesh().unwrap();
        assert_eq!(mesh.vertices.triangle_count(), 1);
        // face normals are generated when the asset has none
        assert_eq!(&mesh.vertices.normals()[..3], &[0.0, 0.0, 1.0]);
        assert_eq!(crate::math::position_of(arm.world_transform()), Vec3::new(2.0, 0.0, 0.0));
    }
}
