use winit::event::{ElementState, MouseButton};

use super::camera::Camera;

/// Tracks the primary button and cursor so drags can orbit the camera.
///
/// The controller only keeps pointer state; the camera it steers is passed in
/// per event. `cursor` is the last position the window reported and survives
/// the pointer leaving; `drag_anchor` is where the next drag delta is measured
/// from and does not.
#[derive(Debug, Default, Clone)]
pub struct CameraController {
    is_mouse_pressed: bool,
    cursor: Option<(f64, f64)>,
    drag_anchor: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates button state. Returns `true` when the primary button went down,
    /// which is when a pick should happen.
    pub fn process_button(&mut self, button: MouseButton, state: ElementState) -> bool {
        if button != MouseButton::Left {
            return false;
        }

        match state {
            ElementState::Pressed => {
                self.is_mouse_pressed = true;
                true
            }
            ElementState::Released => {
                self.is_mouse_pressed = false;
                false
            }
        }
    }

    /// Records the cursor and orbits while dragging. Returns `true` if the camera moved.
    pub fn process_cursor(&mut self, x: f64, y: f64, camera: &mut Camera) -> bool {
        self.cursor = Some((x, y));
        let previous = self.drag_anchor.replace((x, y));

        match previous {
            Some((last_x, last_y)) if self.is_mouse_pressed => {
                let (dx, dy) = ((x - last_x) as f32, (y - last_y) as f32);
                if dx == 0.0 && dy == 0.0 {
                    return false;
                }
                camera.orbit_by(dx, dy);
                true
            }
            _ => false,
        }
    }

    /// Records a cursor position without orbiting, for motion another layer consumed
    pub fn track_cursor(&mut self, x: f64, y: f64) {
        self.cursor = Some((x, y));
        self.drag_anchor = None;
    }

    /// Ends delta tracking when the pointer leaves the window. The last known
    /// position is kept so a click on re-entry can still be placed.
    pub fn cursor_left(&mut self) {
        self.drag_anchor = None;
    }

    /// Last cursor position reported to the window, if any
    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    pub fn is_dragging(&self) -> bool {
        self.is_mouse_pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    #[test]
    fn only_primary_press_requests_a_pick() {
        let mut controller = CameraController::new();
        assert!(!controller.process_button(MouseButton::Right, ElementState::Pressed));
        assert!(controller.process_button(MouseButton::Left, ElementState::Pressed));
        assert!(controller.is_dragging());
        assert!(!controller.process_button(MouseButton::Left, ElementState::Released));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn drag_orbits_only_while_pressed() {
        let mut camera = Camera::new(&CameraConfig::default(), 1.0);
        let mut controller = CameraController::new();
        let start = camera.orbit.azimuth;

        assert!(!controller.process_cursor(100.0, 100.0, &mut camera));
        assert!(!controller.process_cursor(110.0, 100.0, &mut camera));
        assert_eq!(camera.orbit.azimuth, start);

        controller.process_button(MouseButton::Left, ElementState::Pressed);
        assert!(controller.process_cursor(120.0, 100.0, &mut camera));
        assert!((camera.orbit.azimuth - (start - 0.1)).abs() < 1e-5);

        controller.process_button(MouseButton::Left, ElementState::Released);
        assert!(!controller.process_cursor(200.0, 100.0, &mut camera));
    }

    #[test]
    fn cursor_position_survives_leaving_the_window() {
        let mut camera = Camera::new(&CameraConfig::default(), 1.0);
        let mut controller = CameraController::new();
        assert_eq!(controller.cursor(), None);

        controller.process_cursor(40.0, 30.0, &mut camera);
        controller.cursor_left();
        assert_eq!(controller.cursor(), Some((40.0, 30.0)));

        // re-entering far away must not turn into one large drag step
        controller.process_button(MouseButton::Left, ElementState::Pressed);
        let start = camera.orbit.azimuth;
        assert!(!controller.process_cursor(400.0, 30.0, &mut camera));
        assert_eq!(camera.orbit.azimuth, start);
        assert_eq!(controller.cursor(), Some((400.0, 30.0)));
    }

    #[test]
    fn tracked_motion_moves_the_cursor_but_not_the_camera() {
        let mut camera = Camera::new(&CameraConfig::default(), 1.0);
        let mut controller = CameraController::new();
        controller.process_button(MouseButton::Left, ElementState::Pressed);
        controller.process_cursor(10.0, 10.0, &mut camera);
        let start = camera.orbit.azimuth;

        controller.track_cursor(90.0, 10.0);
        assert_eq!(controller.cursor(), Some((90.0, 10.0)));
        assert!(!controller.process_cursor(95.0, 10.0, &mut camera));
        assert_eq!(camera.orbit.azimuth, start);
    }
}
