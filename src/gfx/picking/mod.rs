//! # Object Picking System
//!
//! Turns a click in window pixels into the frontmost [`NodeIntersection`]
//! under the cursor and hands it to an application callback.
//!
//! ## How it works
//!
//! 1. **Mouse to Ray**: pixels to clip space, then unproject the near and far
//!    planes through the inverse view-projection
//! 2. **Ray Casting**: exact triangle hits through [`crate::gfx::raycast`]
//! 3. **Selection**: hits are depth sorted and the first one is reported
//!
//! ## Usage
//!
//! ```no_run
//! use arbor::gfx::picking::ObjectPicker;
//! # fn demo(scene: &mut arbor::gfx::scene::Scene) {
//! let mut picker = ObjectPicker::new();
//! picker.on_pick(|event, _scene| {
//!     log::info!("picked {}", event.hit.node);
//! });
//! picker.pick_and_dispatch(scene, 320.0, 240.0, 640, 480);
//! # }
//! ```

use log::{debug, info};

use crate::gfx::camera::Camera;
use crate::gfx::raycast::{self, NodeIntersection, Ray};
use crate::gfx::scene::Scene;
use crate::math::{self, Vec3};

/// Window pixel to clip space. Y is flipped: the window origin is top-left.
pub fn screen_to_clip(x: f64, y: f64, width: u32, height: u32) -> (f32, f32) {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    ((x / w * 2.0 - 1.0) as f32, (y / h * -2.0 + 1.0) as f32)
}

/// Ray from the near plane through the far plane at clip-space `(x, y)`.
///
/// `None` only when the camera's view-projection is singular.
pub fn clip_to_ray(camera: &Camera, x: f32, y: f32) -> Option<Ray> {
    let inverse = math::inverse(camera.view_projection())?;
    let near = math::transform_point(inverse, Vec3::new(x, y, -1.0));
    let far = math::transform_point(inverse, Vec3::new(x, y, 1.0));
    Some(Ray::new(near, math::normalize(far - near)))
}

/// World-space ray under a window pixel
pub fn screen_to_ray(camera: &Camera, x: f64, y: f64, width: u32, height: u32) -> Option<Ray> {
    let (cx, cy) = screen_to_clip(x, y, width, height);
    clip_to_ray(camera, cx, cy)
}

/// The frontmost hit of a successful pick
#[derive(Debug, Clone, PartialEq)]
pub struct PickEvent {
    pub hit: NodeIntersection,
    pub ray: Ray,
    /// Hits behind the reported one included
    pub hit_count: usize,
}

/// Casts a ray through the pixel and returns the nearest hit, if any.
pub fn pick(scene: &Scene, x: f64, y: f64, width: u32, height: u32) -> Option<PickEvent> {
    let ray = screen_to_ray(&scene.camera, x, y, width, height)?;
    let mut hits = raycast::intersect_scene(&ray, &scene.graph);
    if hits.is_empty() {
        debug!("pick at ({x:.0}, {y:.0}) hit nothing");
        return None;
    }

    raycast::sort_by_depth(&mut hits, &scene.camera);
    let hit_count = hits.len();
    let hit = hits.swap_remove(0);
    Some(PickEvent {
        hit,
        ray,
        hit_count,
    })
}

pub type PickCallback = Box<dyn FnMut(&PickEvent, &mut Scene)>;

/// Owns the application's pick callback and remembers the last pick
#[derive(Default)]
pub struct ObjectPicker {
    callback: Option<PickCallback>,
    last_pick: Option<PickEvent>,
}

impl ObjectPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the callback run on every successful pick
    pub fn on_pick<F>(&mut self, callback: F)
    where
        F: FnMut(&PickEvent, &mut Scene) + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn last_pick(&self) -> Option<&PickEvent> {
        self.last_pick.as_ref()
    }

    /// Picks at the pixel and runs the callback on a hit.
    ///
    /// A miss leaves the scene and the last pick untouched.
    pub fn pick_and_dispatch(
        &mut self,
        scene: &mut Scene,
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    ) -> Option<&PickEvent> {
        let event = pick(scene, x, y, width, height)?;
        info!(
            "picked {} triangle {} at ({:.2}, {:.2}, {:.2})",
            event.hit.name.as_deref().unwrap_or("<unnamed>"),
            event.hit.triangle_index,
            event.hit.point.x,
            event.hit.point.y,
            event.hit.point.z
        );

        if let Some(callback) = self.callback.as_mut() {
            callback(&event, scene);
        }
        self.last_pick = Some(event);
        self.last_pick.as_ref()
    }
}

impl std::fmt::Debug for ObjectPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPicker")
            .field("has_callback", &self.callback.is_some())
            .field("last_pick", &self.last_pick)
            .finish()
    }
}
