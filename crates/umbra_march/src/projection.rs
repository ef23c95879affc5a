//! Perspective ray generation.

use umbra_math::{Camera, Ray, Vec3};

use crate::{RaymarchConfig, Resolution};

/// Per-frame pinhole projection: one ray through the center of each pixel.
///
/// A pixel at offset `(dx, dy)` from the image center looks along
/// `dx * right + dy * up + focal * forward`, with the focal length
/// `height / tan(fov / 2)` measured in pixels. Row 0 is the top of the image
/// and world +Y (camera up) maps to image up.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    origin: Vec3,
    forward: Vec3,
    half_width: Vec3,
    half_height: Vec3,
    pixel00_dir: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    resolution: Resolution,
}

impl Projection {
    /// Build the projection for `camera` using the field of view and
    /// resolution in `config`.
    pub fn new(camera: &Camera, config: &RaymarchConfig) -> Self {
        let resolution = config.resolution;
        let (right, up, forward) = camera.basis();

        // Image plane one unit in front of the eye: height pixels over a
        // focal length of height / tan(fov / 2)
        let theta = config.field_of_view.to_radians();
        let viewport_height = (theta / 2.0).tan();
        let viewport_width = viewport_height * resolution.aspect();

        let viewport_u = viewport_width * right;
        let viewport_v = -viewport_height * up;

        let pixel_delta_u = viewport_u / resolution.width as f32;
        let pixel_delta_v = viewport_v / resolution.height as f32;

        let viewport_upper_left = forward - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_dir = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        Self {
            origin: camera.position,
            forward,
            half_width: viewport_u / 2.0,
            half_height: -viewport_v / 2.0,
            pixel00_dir,
            pixel_delta_u,
            pixel_delta_v,
            resolution,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Ray through the center of pixel (x, y).
    #[inline]
    pub fn ray(&self, x: u32, y: u32) -> Ray {
        let direction =
            self.pixel00_dir + (x as f32) * self.pixel_delta_u + (y as f32) * self.pixel_delta_v;
        Ray::new(self.origin, direction)
    }

    /// Ray through normalized device coordinates, both in [-1, 1], +y up.
    pub fn ray_through_ndc(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let direction = self.forward + ndc_x * self.half_width + ndc_y * self.half_height;
        Ray::new(self.origin, direction)
    }
}
