//! Demo viewer: three parented trees on a sand floor, plus an optional model.
//!
//! ```text
//! arbor [positions.txt normals.txt] [model.glb]
//! ```
//!
//! Clicking a tree copies its colour onto the floor.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use anyhow::Context;
use cgmath::SquareMatrix;
use log::info;

use arbor::{
    config::ViewerConfig,
    gfx::{
        loaders,
        picking::PickEvent,
        scene::{primitives, Material, Mesh, Scene, Vertices},
    },
    math::{self, Mat4, Vec3},
    ArborApp,
};

const FLOOR_NAME: &str = "floor";

fn tree_geometry(config: &ViewerConfig) -> anyhow::Result<Vertices> {
    match (&config.positions_path, &config.normals_path) {
        (Some(positions), Some(normals)) => loaders::load_vertex_files(positions, normals)
            .with_context(|| format!("loading tree geometry from {}", positions.display())),
        _ => Ok(primitives::tree(8)?),
    }
}

/// Green tree at the origin, blue tree five units along it and a grey tree
/// five more along the blue one. All three share one vertex allocation.
fn add_trees(scene: &mut Scene, tree: Vertices) -> anyhow::Result<()> {
    let tree = Arc::new(tree);
    let green = scene.add_node(
        math::from_position_and_euler(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, FRAC_PI_2, 0.0)),
        Some(Mesh::new(
            tree.clone(),
            Material::color(Vec3::new(0.1, 0.7, 0.1), Vec3::new(0.2, 0.2, 0.2), 0.5),
        )),
        Some("green_tree"),
    );
    let grey = scene.add_node(
        math::translation(Vec3::new(5.0, 0.0, 0.0)),
        Some(Mesh::new(
            tree.clone(),
            Material::color(Vec3::new(0.8, 0.8, 0.8), Vec3::new(0.2, 0.2, 0.2), 0.9),
        )),
        Some("grey_tree"),
    );
    let blue = scene.add_node(
        math::translation(Vec3::new(5.0, 0.0, 0.0)),
        Some(Mesh::new(
            tree,
            Material::color(Vec3::new(0.1, 0.5, 0.8), Vec3::new(0.2, 0.2, 0.2), 0.9),
        )),
        Some("blue_tree"),
    );

    scene.set_parent(grey, blue)?;
    scene.set_parent(blue, green)?;
    Ok(())
}

fn add_floor(scene: &mut Scene) -> anyhow::Result<()> {
    scene.add_node(
        Mat4::identity(),
        Some(Mesh::new(
            primitives::floor(1000.0)?,
            Material::color(Vec3::new(0.9, 0.7, 0.1), Vec3::new(0.9, 0.9, 0.9), 1000.0),
        )),
        Some(FLOOR_NAME),
    );
    Ok(())
}

fn build_scene(scene: &mut Scene, config: &ViewerConfig) -> anyhow::Result<()> {
    add_trees(scene, tree_geometry(config)?)?;
    add_floor(scene)?;

    if let Some(model) = &config.model_path {
        let root = loaders::load_gltf(model, &mut scene.graph)?;
        let local = scene
            .graph
            .get(root)
            .map(|node| node.local_transform())
            .unwrap_or_else(Mat4::identity);
        scene
            .graph
            .update_transform(root, math::translation(Vec3::new(-5.0, 0.0, 0.0)) * local)?;
    }
    Ok(())
}

/// Copies the picked node's flat colour onto the floor
fn recolor_floor(event: &PickEvent, scene: &mut Scene) {
    let Some(color) = event.hit.material.flat_color() else {
        return;
    };
    let Some(floor) = scene.graph.find_by_name(FLOOR_NAME) else {
        return;
    };
    if let Some(Material::Color { color: floor_color, .. }) = scene
        .graph
        .get_mut(floor)
        .and_then(|node| node.mesh_mut())
        .map(|mesh| &mut mesh.material)
    {
        *floor_color = color;
        info!("floor recoloured to ({:.2}, {:.2}, {:.2})", color.x, color.y, color.z);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::default().with_args(std::env::args().skip(1));
    let mut app = ArborApp::new(config.clone())?;
    build_scene(app.scene_mut(), &config)?;
    app.on_pick(recolor_floor);
    app.run()
}
