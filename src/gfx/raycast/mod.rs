//! # Ray Casting
//!
//! Exact ray–triangle picking against scene geometry.
//!
//! 1. **Triangle test**: two-sided Möller–Trumbore with epsilon-inclusive edges
//! 2. **Mesh test**: every triangle of a [`Vertices`] buffer, in emission order
//! 3. **Node traversal**: the ray is moved into each node's local space through
//!    the inverse world transform, hits are moved back out
//! 4. **Depth sort**: hits ordered front to back through the camera's
//!    view-projection
//!
//! Rays are not required to be normalised. `t` scales with the direction and
//! only its sign matters, so local-space rays keep whatever length the inverse
//! transform gives them.

use log::{debug, warn};

use crate::gfx::camera::Camera;
use crate::gfx::scene::{Material, NodeId, SceneGraph, Vertices};
use crate::math::{self, Mat4, Vec3};

use cgmath::InnerSpace;

/// Tolerance for parallel rays, edge acceptance and the minimum hit distance
pub const EPSILON: f32 = f32::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Moves the ray through `m`: origin as a point, direction without translation.
    pub fn transformed(&self, m: Mat4) -> Self {
        Self {
            origin: math::transform_point(m, self.origin),
            direction: math::transform_direction(m, self.direction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }
}

impl From<[Vec3; 3]> for Triangle {
    fn from([a, b, c]: [Vec3; 3]) -> Self {
        Self { a, b, c }
    }
}

/// Two-sided Möller–Trumbore.
///
/// Barycentrics are accepted up to `EPSILON` outside `[0, 1]` so hits on a
/// shared edge or vertex are never lost to rounding. Near-parallel rays and
/// hits at or behind the origin (`t <= EPSILON`) return `None`.
pub fn intersect_triangle(ray: &Ray, triangle: &Triangle) -> Option<Vec3> {
    let edge1 = triangle.b - triangle.a;
    let edge2 = triangle.c - triangle.a;
    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(pvec);

    if det > -EPSILON && det < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let svec = ray.origin - triangle.a;
    let u = inv_det * svec.dot(pvec);
    if (u < 0.0 && u.abs() > EPSILON) || (u > 1.0 && (u - 1.0).abs() > EPSILON) {
        return None;
    }

    let qvec = svec.cross(edge1);
    let v = inv_det * ray.direction.dot(qvec);
    if (v < 0.0 && v.abs() > EPSILON) || (u + v > 1.0 && (u + v - 1.0).abs() > EPSILON) {
        return None;
    }

    let t = inv_det * edge2.dot(qvec);
    if t > EPSILON {
        Some(ray.point_at(t))
    } else {
        None
    }
}

/// A hit in the space the ray was expressed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub point: Vec3,
    /// Ordinal of the triangle within its mesh
    pub triangle_index: usize,
}

/// Every triangle of `vertices` the ray passes through, in triangle order.
pub fn intersect_vertices(ray: &Ray, vertices: &Vertices) -> Vec<Intersection> {
    vertices
        .triangles()
        .enumerate()
        .filter_map(|(triangle_index, corners)| {
            intersect_triangle(ray, &Triangle::from(corners)).map(|point| Intersection {
                point,
                triangle_index,
            })
        })
        .collect()
}

/// A world-space hit tagged with the node it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct NodeIntersection {
    pub point: Vec3,
    pub triangle_index: usize,
    pub node: NodeId,
    pub name: Option<String>,
    pub material: Material,
}

/// Casts a world-space ray against `root` and every node below it.
///
/// Traversal is depth-first with an explicit stack, visiting children in
/// attachment order. Nodes whose world transform cannot be inverted are
/// skipped, their children are still visited.
pub fn intersect_node(ray: &Ray, graph: &SceneGraph, root: NodeId) -> Vec<NodeIntersection> {
    let mut hits = Vec::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let Some(node) = graph.get(id) else {
            continue;
        };

        if let Some(mesh) = node.mesh() {
            let world = node.world_transform();
            match math::inverse(world) {
                Some(to_local) => {
                    let local_ray = ray.transformed(to_local);
                    hits.extend(intersect_vertices(&local_ray, &mesh.vertices).into_iter().map(
                        |hit| NodeIntersection {
                            point: math::transform_point(world, hit.point),
                            triangle_index: hit.triangle_index,
                            node: id,
                            name: node.name().map(str::to_owned),
                            material: mesh.material.clone(),
                        },
                    ));
                }
                None => warn!("skipping {} in ray cast: singular world transform", node.display_name()),
            }
        }

        stack.extend(node.children().iter().rev().copied());
    }

    hits
}

/// Union of [`intersect_node`] over every top-level node of the graph.
pub fn intersect_scene(ray: &Ray, graph: &SceneGraph) -> Vec<NodeIntersection> {
    let hits: Vec<NodeIntersection> = graph
        .roots()
        .flat_map(|root| intersect_node(ray, graph, root))
        .collect();
    debug!("ray {:?} produced {} hits", ray, hits.len());
    hits
}

/// Clip-space depth of a world point as seen by `camera`. Smaller is nearer.
pub fn camera_depth(camera: &Camera, point: Vec3) -> f32 {
    math::transform_point(camera.view_projection(), point).z
}

/// Orders hits front to back. Equal depths keep their traversal order.
pub fn sort_by_depth(intersections: &mut [NodeIntersection], camera: &Camera) {
    let view_projection = camera.view_projection();
    intersections.sort_by(|a, b| {
        let za = math::transform_point(view_projection, a.point).z;
        let zb = math::transform_point(view_projection, b.point).z;
        za.total_cmp(&zb)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::gfx::scene::{Mesh, Vertices};
    use crate::math::{scaling, translation, z_rotation};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use cgmath::SquareMatrix;

    fn scenario_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(1.0, 0.0, 0.1),
            Vec3::new(0.0, 1.0, 0.1),
            Vec3::new(-1.0, 0.0, 0.1),
        )
    }

    fn quad_mesh() -> Mesh {
        #[rustfmt::skip]
        let positions = vec![
            -10.0, 0.0, -10.0, // back left
            -10.0, 0.0,  10.0, // front left
             10.0, 0.0, -10.0, // back right
            -10.0, 0.0,  10.0, // front left
             10.0, 0.0,  10.0, // front right
             10.0, 0.0, -10.0, // back right
        ];
        let normals = [0.0, 1.0, 0.0].repeat(6);
        Mesh::new(
            Vertices::new(positions, normals).unwrap(),
            Material::color(Vec3::new(0.9, 0.7, 0.1), Vec3::new(0.9, 0.9, 0.9), 1000.0),
        )
    }

    fn down(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 0.5, z), Vec3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn ray_hits_triangle_in_front() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = intersect_triangle(&ray, &scenario_triangle()).unwrap();
        assert_abs_diff_eq!(hit, Vec3::new(0.5, 0.5, 0.1), epsilon = 1e-5);
    }

    #[test]
    fn ray_starting_past_triangle_misses() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.2), Vec3::new(0.0, 0.0, 1.0));
        assert!(intersect_triangle(&ray, &scenario_triangle()).is_none());
    }

    #[test]
    fn ray_pointing_away_misses() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersect_triangle(&ray, &scenario_triangle()).is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.1), Vec3::new(1.0, 0.0, 0.0));
        assert!(intersect_triangle(&ray, &scenario_triangle()).is_none());
    }

    #[test]
    fn edge_and_vertex_hits_are_accepted() {
        let triangle = scenario_triangle();

        let edge = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = intersect_triangle(&edge, &triangle).unwrap();
        assert_abs_diff_eq!(hit, Vec3::new(0.0, 0.0, 0.1), epsilon = 1e-5);

        let vertex = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = intersect_triangle(&vertex, &triangle).unwrap();
        assert_abs_diff_eq!(hit, Vec3::new(0.0, 1.0, 0.1), epsilon = 1e-5);

        let outside = Ray::new(Vec3::new(0.0, 1.01, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(intersect_triangle(&outside, &triangle).is_none());
    }

    #[test]
    fn non_unit_direction_finds_the_same_point() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.0, 0.0, 7.5));
        let hit = intersect_triangle(&ray, &scenario_triangle()).unwrap();
        assert_abs_diff_eq!(hit, Vec3::new(0.5, 0.5, 0.1), epsilon = 1e-5);
    }

    #[test]
    fn quad_hits_report_triangle_ordinal() {
        let mesh = quad_mesh();

        let left = intersect_vertices(&down(-1.0, 0.0), &mesh.vertices);
        assert_eq!(left.len(), 1);
        assert_abs_diff_eq!(left[0].point, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(left[0].triangle_index, 0);

        let right = intersect_vertices(&down(1.0, 0.0), &mesh.vertices);
        assert_eq!(right.len(), 1);
        assert_abs_diff_eq!(right[0].point, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(right[0].triangle_index, 1);
    }

    #[test]
    fn shared_diagonal_reports_both_triangles() {
        let mesh = quad_mesh();
        let hits = intersect_vertices(&down(2.0, -2.0), &mesh.vertices);
        let indices: Vec<usize> = hits.iter().map(|h| h.triangle_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn indexed_mesh_uses_dereferenced_triangles() {
        let positions = vec![
            -10.0, 0.0, -10.0, //
            -10.0, 0.0, 10.0, //
            10.0, 0.0, -10.0, //
            10.0, 0.0, 10.0,
        ];
        let vertices =
            Vertices::indexed(positions, [0.0, 1.0, 0.0].repeat(4), vec![0, 1, 2, 1, 3, 2]).unwrap();

        let hits = intersect_vertices(&down(1.0, 0.0), &vertices);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].triangle_index, 1);
    }

    #[test]
    fn translated_node_hit_is_reported_in_world_space() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node(
            translation(Vec3::new(-2.0, 0.0, 0.0)),
            Some(quad_mesh()),
            Some("quad"),
        );

        let hits = intersect_node(&down(-11.0, 0.0), &graph, node);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(
            hits[0].point,
            Vec3::new(-11.0, 0.0, 0.0),
            epsilon = 1e-5,
            max_relative = 1e-5
        );
        assert_eq!(hits[0].triangle_index, 0);
        assert_eq!(hits[0].node, node);
        assert_eq!(hits[0].name.as_deref(), Some("quad"));
    }

    #[test]
    fn parent_translation_compounds_during_traversal() {
        let mut graph = SceneGraph::new();
        let offset = translation(Vec3::new(-2.0, 0.0, 0.0));
        let parent = graph.create_node(offset, None, Some("parent"));
        let child = graph.create_node(offset, Some(quad_mesh()), Some("child"));
        graph.set_parent(child, parent).unwrap();

        // the quad now spans x in [-14, 6]
        let hits = intersect_node(&down(-11.0, 0.0), &graph, parent);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(
            hits[0].point,
            Vec3::new(-11.0, 0.0, 0.0),
            epsilon = 1e-5,
            max_relative = 1e-5
        );
        assert_eq!(hits[0].triangle_index, 0);
        assert_eq!(hits[0].node, child);

        assert!(intersect_node(&down(-13.0, 0.0), &graph, parent).len() == 1);
        assert!(intersect_node(&down(7.0, 0.0), &graph, parent).is_empty());
    }

    #[test]
    fn rotated_quad_is_hit_on_its_tilted_plane() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node(
            z_rotation(std::f32::consts::FRAC_PI_4),
            Some(quad_mesh()),
            None,
        );

        let ray = Ray::new(Vec3::new(-1.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let hits = intersect_node(&ray, &graph, node);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].point - Vec3::new(-1.0, -1.0, 0.0)).magnitude() < 1e-4);
        assert_eq!(hits[0].triangle_index, 0);
    }

    #[test]
    fn singular_nodes_are_skipped_and_siblings_still_visited() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node(Mat4::identity(), Some(quad_mesh()), Some("root"));
        let flat = graph.create_node(scaling(Vec3::new(1.0, 0.0, 1.0)), Some(quad_mesh()), None);
        let sibling = graph.create_node(
            translation(Vec3::new(0.0, -0.25, 0.0)),
            Some(quad_mesh()),
            None,
        );
        graph.set_parent(flat, root).unwrap();
        graph.set_parent(sibling, root).unwrap();

        let hits = intersect_node(&down(1.0, 1.0), &graph, root);
        let nodes: Vec<NodeId> = hits.iter().map(|h| h.node).collect();
        assert_eq!(nodes, vec![root, sibling]);
    }

    #[test]
    fn scene_intersection_unions_top_level_trees() {
        let mut graph = SceneGraph::new();
        let low = graph.create_node(Mat4::identity(), Some(quad_mesh()), Some("low"));
        let high = graph.create_node(
            translation(Vec3::new(0.0, -0.25, 0.0)),
            Some(quad_mesh()),
            Some("high"),
        );

        let hits = intersect_scene(&down(1.0, 1.0), &graph);
        let nodes: Vec<NodeId> = hits.iter().map(|h| h.node).collect();
        assert_eq!(nodes, vec![low, high]);
    }

    #[test]
    fn depth_sort_puts_nearest_hit_first() {
        let camera = Camera::new(
            &CameraConfig {
                target: Vec3::new(0.0, 0.0, 0.0),
                azimuth: 0.0,
                elevation: 0.001,
                radius: 20.0,
                ..CameraConfig::default()
            },
            1.0,
        );

        let hit = |y: f32, name: &str| NodeIntersection {
            point: Vec3::new(0.0, y, 0.0),
            triangle_index: 0,
            node: NodeId(0),
            name: Some(name.to_string()),
            material: Material::default(),
        };

        // camera looks straight down from y = 20
        let mut hits = vec![hit(-5.0, "far"), hit(3.0, "near"), hit(0.0, "middle")];
        sort_by_depth(&mut hits, &camera);

        let order: Vec<&str> = hits.iter().filter_map(|h| h.name.as_deref()).collect();
        assert_eq!(order, vec!["near", "middle", "far"]);
        assert!(camera_depth(&camera, hits[0].point) < camera_depth(&camera, hits[2].point));
    }
}
