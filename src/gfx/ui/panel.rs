use imgui::Ui;

use crate::gfx::{
    picking::PickEvent,
    scene::{NodeId, Scene},
};
use crate::math::{ELEVATION_MARGIN, Vec3};

fn vec3_text(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

/// Viewer panel: camera orbit, light rig, the last pick and the node tree.
///
/// Returns `true` when a widget changed the camera.
pub fn viewer(ui: &Ui, scene: &mut Scene, last_pick: Option<&PickEvent>) -> bool {
    let mut camera_changed = false;

    ui.window("Scene")
        .size([340.0, 480.0], imgui::Condition::FirstUseEver)
        .position([10.0, 10.0], imgui::Condition::FirstUseEver)
        .build(|| {
            ui.text(format!("{:.1} fps", ui.io().framerate));
            ui.separator();

            if ui.collapsing_header("Camera", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                let orbit = &mut scene.camera.orbit;
                camera_changed |= ui.slider(
                    "Azimuth",
                    -std::f32::consts::PI,
                    std::f32::consts::PI,
                    &mut orbit.azimuth,
                );
                camera_changed |= ui.slider(
                    "Elevation",
                    ELEVATION_MARGIN,
                    std::f32::consts::FRAC_PI_2 - ELEVATION_MARGIN,
                    &mut orbit.elevation,
                );
                camera_changed |= ui.slider("Radius", 1.0, 200.0, &mut orbit.radius);
                if camera_changed {
                    scene.camera.update_transform();
                }
                ui.text(format!("Eye {}", vec3_text(scene.camera.position())));
            }

            if ui.collapsing_header("Lights", imgui::TreeNodeFlags::empty()) {
                ui.text(format!("Point {}", vec3_text(scene.point_light.position)));
                ui.slider("Orbit speed", 0.0, 5.0, &mut scene.point_orbit_speed);
                ui.text(format!("Sun dir {}", vec3_text(scene.directional_light.direction)));
            }

            if ui.collapsing_header("Last pick", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                match last_pick {
                    Some(event) => {
                        let name = event.hit.name.as_deref().unwrap_or("<unnamed>");
                        ui.text(format!("{name} {}", event.hit.node));
                        ui.text(format!("Point {}", vec3_text(event.hit.point)));
                        ui.text(format!("Triangle {}", event.hit.triangle_index));
                        if let Some(color) = event.hit.material.flat_color() {
                            ui.text(format!("Colour {}", vec3_text(color)));
                        }
                        ui.text(format!("{} hits along the ray", event.hit_count));
                    }
                    None => ui.text("Click a mesh to pick it"),
                }
            }

            if ui.collapsing_header("Nodes", imgui::TreeNodeFlags::empty()) {
                for root in scene.top_level_nodes() {
                    node_tree(ui, scene, root);
                }
            }
        });

    camera_changed
}

fn node_tree(ui: &Ui, scene: &Scene, id: NodeId) {
    let Some(node) = scene.graph.get(id) else {
        return;
    };

    if node.children().is_empty() {
        ui.bullet_text(node.display_name());
        return;
    }

    let label = format!("{}##{}", node.display_name(), id.raw());
    if let Some(_token) = ui.tree_node(&label) {
        for &child in node.children() {
            node_tree(ui, scene, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_print_with_two_decimals() {
        assert_eq!(vec3_text(Vec3::new(1.0, -0.5, 2.25)), "(1.00, -0.50, 2.25)");
    }
}
