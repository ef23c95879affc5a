//! Raymarch configuration.

use serde::{Deserialize, Serialize};
use umbra_math::Interval;

use crate::ConfigError;

/// Size of the offscreen image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels (width * height).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl From<(u32, u32)> for Resolution {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// Parameters of the sphere tracer and its offscreen image.
///
/// Fixed for the lifetime of a raymarch object; a different resolution goes
/// through `Raymarcher::request_resolution` so the buffer is reallocated
/// between frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaymarchConfig {
    /// Lens angle in degrees. The image plane sits `height / tan(fov / 2)`
    /// pixels in front of the eye, so the image spans `tan(fov / 2)`
    /// vertically at unit distance.
    pub field_of_view: f32,
    /// Upper bound on distance evaluations per pixel
    pub max_steps: u32,
    /// Surface-hit tolerance
    pub epsilon: f32,
    /// A sample this close to a surface counts as a hit
    pub min_distance: f32,
    /// Rays that travel further than this escape the scene
    pub max_distance: f32,
    /// Offscreen image size
    pub resolution: Resolution,
}

impl Default for RaymarchConfig {
    fn default() -> Self {
        Self {
            field_of_view: 90.0,
            max_steps: 1000,
            epsilon: 0.001,
            min_distance: 0.001,
            max_distance: 100.0,
            resolution: Resolution::new(1280, 720),
        }
    }
}

impl RaymarchConfig {
    /// Set the offscreen resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Resolution::new(width, height);
        self
    }

    /// Set the field of view in degrees.
    pub fn with_field_of_view(mut self, degrees: f32) -> Self {
        self.field_of_view = degrees;
        self
    }

    /// Set step limit and hit tolerance.
    pub fn with_quality(mut self, max_steps: u32, epsilon: f32) -> Self {
        self.max_steps = max_steps;
        self.epsilon = epsilon;
        self
    }

    /// Set the march distance bounds.
    pub fn with_distance_range(mut self, min_distance: f32, max_distance: f32) -> Self {
        self.min_distance = min_distance;
        self.max_distance = max_distance;
        self
    }

    /// Distance bounds as an interval.
    pub fn distance_range(&self) -> Interval {
        Interval::new(self.min_distance, self.max_distance)
    }

    /// Distance below which a sample is treated as on the surface.
    #[inline]
    pub fn hit_threshold(&self) -> f32 {
        self.epsilon.max(self.min_distance)
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("field_of_view", self.field_of_view),
            ("epsilon", self.epsilon),
            ("min_distance", self.min_distance),
            ("max_distance", self.max_distance),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }

        if self.max_steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        if self.epsilon <= 0.0 {
            return Err(ConfigError::NonPositiveEpsilon(self.epsilon));
        }
        if self.min_distance < 0.0 || self.distance_range().is_empty() {
            return Err(ConfigError::InvalidDistanceRange {
                min: self.min_distance,
                max: self.max_distance,
            });
        }
        if self.field_of_view <= 0.0 || self.field_of_view >= 180.0 {
            return Err(ConfigError::InvalidFieldOfView(self.field_of_view));
        }
        validate_resolution(self.resolution)
    }
}

/// Reject zero-area images.
pub(crate) fn validate_resolution(resolution: Resolution) -> Result<(), ConfigError> {
    if resolution.is_empty() {
        return Err(ConfigError::EmptyResolution {
            width: resolution.width,
            height: resolution.height,
        });
    }
    Ok(())
}
