//! Third-person follow camera.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Default offset from the character to the camera's resting spot.
pub const DEFAULT_CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 120.0, -200.0);

/// Default per-tick smoothing factor.
pub const DEFAULT_CAMERA_SMOOTHING: f32 = 0.1;

/// Camera that trails the character at a fixed world-space offset.
///
/// Smoothing is a fixed lerp factor per tick, so the catch-up speed depends
/// on frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FollowCamera {
    /// Current camera position
    position: Vec3,
    /// Point the camera looks at
    look_at: Vec3,
    /// World-space offset from the followed target
    offset: Vec3,
    /// Fraction of the remaining distance covered each tick
    smoothing: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self::new(DEFAULT_CAMERA_OFFSET, DEFAULT_CAMERA_SMOOTHING)
    }
}

impl FollowCamera {
    /// Creates a camera resting at `offset` from the origin.
    #[must_use]
    pub fn new(offset: Vec3, smoothing: f32) -> Self {
        Self {
            position: offset,
            look_at: Vec3::ZERO,
            offset,
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    /// Places the camera exactly at its resting spot for `target`.
    pub fn snap_to(&mut self, target: Vec3) {
        self.position = target + self.offset;
        self.look_at = target;
    }

    /// Moves one smoothing step toward `target + offset` and looks at `target`.
    pub fn follow(&mut self, target: Vec3) {
        let desired = target + self.offset;
        self.position = self.position.lerp(desired, self.smoothing);
        self.look_at = target;
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Current look-at point.
    #[must_use]
    pub const fn look_at(&self) -> Vec3 {
        self.look_at
    }

    /// View matrix for the renderer.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_covers_smoothing_fraction() {
        let mut camera = FollowCamera::new(Vec3::new(0.0, 10.0, -10.0), 0.1);
        let target = Vec3::new(100.0, 0.0, 0.0);

        camera.follow(target);

        assert!((camera.position() - Vec3::new(10.0, 10.0, -10.0)).length() < 1e-4);
        assert_eq!(camera.look_at(), target);
    }

    #[test]
    fn test_follow_converges_on_resting_spot() {
        let mut camera = FollowCamera::new(Vec3::new(0.0, 10.0, -10.0), 0.1);
        let target = Vec3::new(50.0, 0.0, 25.0);
        for _ in 0..300 {
            camera.follow(target);
        }
        assert!((camera.position() - Vec3::new(50.0, 10.0, 15.0)).length() < 1e-2);
    }

    #[test]
    fn test_snap_places_camera_at_offset() {
        let mut camera = FollowCamera::default();
        camera.snap_to(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0) + DEFAULT_CAMERA_OFFSET);
    }

    #[test]
    fn test_view_matrix_looks_at_target() {
        let mut camera = FollowCamera::default();
        camera.snap_to(Vec3::new(0.0, 0.0, 50.0));

        // The target sits straight ahead, down the view-space -Z axis.
        let in_view = camera.view_matrix().transform_point3(camera.look_at());
        assert!(in_view.x.abs() < 1e-3);
        assert!(in_view.y.abs() < 1e-3);
        assert!((in_view.z + DEFAULT_CAMERA_OFFSET.length()).abs() < 1e-2);
    }
}
