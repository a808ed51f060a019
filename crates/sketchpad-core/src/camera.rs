//! Camera module for viewport pan/zoom.

use kurbo::{Affine, Point, Vec2};
use log::warn;
use serde::{Deserialize, Serialize};

/// Zoom factor per wheel delta unit: `zoom *= WHEEL_ZOOM_BASE.powf(delta_y)`.
pub const WHEEL_ZOOM_BASE: f64 = 0.999;

pub const DEFAULT_MIN_ZOOM: f64 = 0.01;
pub const DEFAULT_MAX_ZOOM: f64 = 20.0;

/// Camera manages the viewport transform over the surface.
///
/// Shapes keep their vertices in surface (world) coordinates; the camera maps
/// them to the screen. Pointer input arrives in screen coordinates and is
/// converted back with [`Camera::screen_to_world`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    /// Current translation offset (pan)
    pub offset: Vec2,
    /// Current zoom level (1.0 = surface pixels)
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with custom zoom limits.
    pub fn with_limits(min_zoom: f64, max_zoom: f64) -> Self {
        let mut camera = Self::default();
        camera.set_limits(min_zoom, max_zoom);
        camera
    }

    /// World to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen to world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    ///
    /// Returns `false` when clamping leaves the zoom unchanged.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) -> bool {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;

        // Adjust offset so world_point stays at screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
        true
    }

    /// Apply a mouse wheel step around the cursor.
    pub fn wheel_zoom(&mut self, screen_point: Point, delta_y: f64) -> bool {
        self.zoom_at(screen_point, WHEEL_ZOOM_BASE.powf(delta_y))
    }

    /// Update the zoom limits, pulling the current zoom back inside them.
    pub fn set_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        // A zero or negative zoom makes the transform singular.
        let min_zoom = if min_zoom.is_finite() && min_zoom > 0.0 {
            min_zoom
        } else {
            warn!("Ignoring invalid min zoom {min_zoom}");
            DEFAULT_MIN_ZOOM
        };
        let max_zoom = if max_zoom.is_finite() {
            max_zoom
        } else {
            warn!("Ignoring invalid max zoom {max_zoom}");
            DEFAULT_MAX_ZOOM
        };
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Reset camera to identity.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_is_identity() {
        let camera = Camera::new();
        let p = Point::new(100.0, 200.0);
        assert_eq!(camera.screen_to_world(p), p);
        assert_eq!(camera.world_to_screen(p), p);
    }

    #[test]
    fn test_screen_to_world_with_offset_and_zoom() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(50.0, 100.0);
        camera.zoom = 2.0;
        let world = camera.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);
        camera.zoom = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));

        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_keeps_cursor_fixed() {
        let mut camera = Camera::new();
        let cursor = Point::new(200.0, 120.0);
        let world_before = camera.screen_to_world(cursor);
        assert!(camera.wheel_zoom(cursor, -500.0));
        assert!(camera.zoom > 1.0);
        let world_after = camera.screen_to_world(cursor);
        assert!((world_before - world_after).hypot() < 1e-9);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        assert!(camera.zoom_at(Point::ZERO, 0.0001));
        assert!((camera.zoom - camera.min_zoom).abs() < f64::EPSILON);
        assert!(!camera.zoom_at(Point::ZERO, 0.5));

        camera.zoom = 1.0;
        camera.zoom_at(Point::ZERO, 1000.0);
        assert!((camera.zoom - camera.max_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_limits_clamps_zoom() {
        let mut camera = Camera::new();
        camera.zoom = 15.0;
        camera.set_limits(0.5, 4.0);
        assert!((camera.zoom - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_positive_min_zoom_falls_back() {
        let mut camera = Camera::with_limits(0.0, 4.0);
        assert!((camera.min_zoom - DEFAULT_MIN_ZOOM).abs() < f64::EPSILON);

        camera.set_limits(-2.0, f64::NAN);
        assert!((camera.min_zoom - DEFAULT_MIN_ZOOM).abs() < f64::EPSILON);
        assert!((camera.max_zoom - DEFAULT_MAX_ZOOM).abs() < f64::EPSILON);

        camera.zoom_at(Point::ZERO, 0.0);
        assert!(camera.zoom > 0.0);
        let world = camera.screen_to_world(Point::new(10.0, 10.0));
        assert!(world.x.is_finite() && world.y.is_finite());
    }

    #[test]
    fn test_pan_and_reset() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        assert_eq!(camera.offset, Vec2::new(10.0, 20.0));
        camera.reset();
        assert_eq!(camera.offset, Vec2::ZERO);
    }
}
