//! Mapping march results to color and alpha.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::{estimate_normal, DistanceField, MarchResult, RaymarchConfig};

/// Straight (non-premultiplied) linear RGBA.
pub type Color = Vec4;

/// How hit pixels are colored. Misses are always fully transparent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shading {
    /// Diffuse lighting from a directional light, normal from the field gradient
    Lambert {
        /// Direction from the surface towards the light
        light_dir: Vec3,
        albedo: Vec3,
        ambient: f32,
    },
    /// World-space normal mapped to RGB
    Normals,
    /// Step count heat map: bright is cheap, dark is expensive
    Steps,
    /// Accumulated distance, near is bright
    Depth,
}

impl Default for Shading {
    fn default() -> Self {
        Shading::Lambert {
            light_dir: Vec3::new(1.0, 1.0, 1.5).normalize(),
            albedo: Vec3::new(0.8, 0.75, 0.7),
            ambient: 0.1,
        }
    }
}

impl Shading {
    /// Color for one pixel.
    pub fn shade(
        &self,
        result: &MarchResult,
        config: &RaymarchConfig,
        field: &dyn DistanceField,
    ) -> Color {
        if !result.is_hit() {
            return Color::ZERO;
        }

        let rgb = match *self {
            Shading::Lambert {
                light_dir,
                albedo,
                ambient,
            } => {
                let normal = estimate_normal(field, result.point, config.hit_threshold());
                let diffuse = normal.dot(light_dir.normalize_or_zero()).max(0.0);
                albedo * (ambient + (1.0 - ambient) * diffuse)
            }
            Shading::Normals => {
                let normal = estimate_normal(field, result.point, config.hit_threshold());
                normal * 0.5 + Vec3::splat(0.5)
            }
            Shading::Steps => {
                let cost = result.steps as f32 / config.max_steps as f32;
                Vec3::splat(1.0 - cost.clamp(0.0, 1.0))
            }
            Shading::Depth => {
                Vec3::splat(1.0 - config.distance_range().normalize(result.distance))
            }
        };

        rgb.clamp(Vec3::ZERO, Vec3::ONE).extend(1.0)
    }
}
