//! Sphere tracing along a single ray.

use umbra_math::{Ray, Vec3};

use crate::{DistanceField, RaymarchConfig};

/// How a march terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarchOutcome {
    /// A sample came within the hit threshold of a surface.
    Hit,
    /// The next step would carry the ray past `max_distance`.
    Escaped,
    /// `max_steps` ran out before the ray hit or escaped.
    Exhausted,
}

/// Result of marching one ray. Steps are reported for every outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchResult {
    pub outcome: MarchOutcome,
    /// Last sampled point (the surface point on a hit)
    pub point: Vec3,
    /// Accumulated distance along the ray
    pub distance: f32,
    /// Number of distance evaluations
    pub steps: u32,
}

impl MarchResult {
    /// True if the ray found a surface.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.outcome == MarchOutcome::Hit
    }
}

/// March `ray` through `field`.
///
/// Each step advances by the local distance estimate, which cannot skip past
/// the nearest surface, so `distance` never decreases from one step to the
/// next. The configuration is expected to be validated by the caller.
pub fn march(ray: &Ray, config: &RaymarchConfig, field: &dyn DistanceField) -> MarchResult {
    let threshold = config.hit_threshold();
    let mut t = 0.0_f32;
    let mut steps = 0;

    while steps < config.max_steps {
        let point = ray.at(t);
        let d = field.distance(point);
        steps += 1;

        if d < threshold {
            return MarchResult {
                outcome: MarchOutcome::Hit,
                point,
                distance: t,
                steps,
            };
        }

        // NaN compares false above; treat it as leaving the scene.
        if d.is_nan() || t + d > config.max_distance {
            return MarchResult {
                outcome: MarchOutcome::Escaped,
                point,
                distance: t,
                steps,
            };
        }

        t += d;
    }

    MarchResult {
        outcome: MarchOutcome::Exhausted,
        point: ray.at(t),
        distance: t,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sphere, Union};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Mutex;

    fn config() -> RaymarchConfig {
        RaymarchConfig::default()
    }

    #[test]
    fn test_hit_sphere_head_on() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0);
        let ray = Ray::towards(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);

        let result = march(&ray, &config(), &sphere);

        assert_eq!(result.outcome, MarchOutcome::Hit);
        assert!((result.distance - 8.0).abs() <= config().epsilon);
        assert!((result.point - Vec3::new(0.0, 0.0, 2.0)).length() <= config().epsilon);
        assert!(result.steps > 0);
    }

    #[test]
    fn test_hit_distance_matches_analytic_surface() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = config();

        for _ in 0..64 {
            let radius = rng.gen_range(0.5..4.0);
            let distance = rng.gen_range(radius + 0.5..60.0);
            let direction = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .try_normalize()
            .unwrap_or(Vec3::Z);

            let center = Vec3::new(1.0, -2.0, 3.0);
            let sphere = Sphere::new(center, radius);
            let origin = center + direction * distance;
            let ray = Ray::towards(origin, center);

            let result = march(&ray, &config, &sphere);

            assert!(result.is_hit(), "missed sphere r={radius} at d={distance}");
            assert!(
                (result.distance - (distance - radius)).abs() <= config.epsilon,
                "distance {} vs expected {}",
                result.distance,
                distance - radius
            );
        }
    }

    #[test]
    fn test_ray_pointing_away_escapes() {
        let mut rng = StdRng::seed_from_u64(42);
        let sphere = Sphere::new(Vec3::ZERO, 2.0);
        let config = config();

        for _ in 0..64 {
            let origin = Vec3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            );
            if sphere.distance(origin) <= 0.1 {
                continue;
            }
            // Any direction in the hemisphere facing away from the center
            let mut direction = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if direction.dot(origin) < 0.0 {
                direction = -direction;
            }

            let result = march(&Ray::new(origin, direction), &config, &sphere);

            assert!(!result.is_hit());
            assert!(result.steps <= config.max_steps);
        }
    }

    #[test]
    fn test_escape_reports_steps() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);

        let result = march(&ray, &config(), &sphere);

        assert_eq!(result.outcome, MarchOutcome::Escaped);
        assert!(result.steps >= 1);
    }

    #[test]
    fn test_exhausted_is_distinct_from_escaped() {
        // Grazing ray: creeps along the sphere without converging quickly
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(-5.0, 1.0 + 1e-3, 0.0), Vec3::X);
        let config = RaymarchConfig::default().with_quality(3, 1e-6);

        let result = march(&ray, &config, &sphere);

        assert_eq!(result.outcome, MarchOutcome::Exhausted);
        assert_eq!(result.steps, 3);
    }

    #[test]
    fn test_empty_scene_escapes_in_one_step() {
        let result = march(&Ray::new(Vec3::ZERO, Vec3::X), &config(), &Union::new());

        assert_eq!(result.outcome, MarchOutcome::Escaped);
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn test_nan_field_escapes() {
        let broken = |_: Vec3| f32::NAN;
        let result = march(&Ray::new(Vec3::ZERO, Vec3::X), &config(), &broken);

        assert_eq!(result.outcome, MarchOutcome::Escaped);
    }

    #[test]
    fn test_origin_inside_surface_hits_immediately() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0);
        let result = march(&Ray::new(Vec3::ZERO, Vec3::X), &config(), &sphere);

        assert!(result.is_hit());
        assert_eq!(result.distance, 0.0);
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn test_distance_is_monotonic() {
        let origin = Vec3::new(0.3, -0.2, 10.0);
        let samples = Mutex::new(Vec::new());
        let scene = Union::new()
            .with(Sphere::new(Vec3::ZERO, 2.0))
            .with(Sphere::new(Vec3::new(1.5, 1.5, 0.0), 1.0));
        let recording = |p: Vec3| {
            samples.lock().unwrap().push((p - origin).length());
            scene.distance(p)
        };

        let ray = Ray::towards(origin, Vec3::new(0.5, 0.5, 0.0));
        let result = march(&ray, &config(), &recording);
        assert!(result.is_hit());

        let samples = samples.into_inner().unwrap();
        assert_eq!(samples.len(), result.steps as usize);
        for pair in samples.windows(2) {
            assert!(pair[1] >= pair[0], "t regressed: {} -> {}", pair[0], pair[1]);
        }
    }
}
