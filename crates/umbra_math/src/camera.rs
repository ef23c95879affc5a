use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Largest pitch reachable by `orbit`, just short of the poles so the
/// look-at basis never degenerates.
const MAX_PITCH: f32 = 89.0_f32 * (std::f32::consts::PI / 180.0);

/// Look-at camera owned by the host.
///
/// The tracer only reads it: position plus an orthonormal basis derived from
/// `target` and `up`. Field of view is part of the march configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Camera {
    /// Create a new camera with +Y as the up vector
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
        }
    }

    /// Set the up vector
    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// Unit view direction (position → target)
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Orthonormal camera basis as `(right, up, forward)`.
    ///
    /// Falls back to +Z as the reference up when `up` is parallel to the view
    /// direction.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.forward();
        let mut right = forward.cross(self.up).normalize_or_zero();
        if right == Vec3::ZERO {
            right = forward.cross(Vec3::Z).normalize_or_zero();
        }
        let up = right.cross(forward);
        (right, up, forward)
    }

    /// Distance from the camera to its target
    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// Orbit around the target by yaw/pitch deltas in radians (Y-up).
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let yaw = offset.x.atan2(offset.z) + delta_yaw;
        let pitch = ((offset.y / radius).clamp(-1.0, 1.0).asin() + delta_pitch)
            .clamp(-MAX_PITCH, MAX_PITCH);

        self.position = self.target
            + radius * Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos());
    }

    /// Move towards (positive) or away from (negative) the target.
    ///
    /// Never crosses the target: the distance stays at least `min_distance`.
    pub fn dolly(&mut self, amount: f32, min_distance: f32) {
        let offset = self.position - self.target;
        let distance = (offset.length() - amount).max(min_distance);
        self.position = self.target + offset.normalize_or_zero() * distance;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
    }
}
