use crate::Vec3;

/// A ray in 3D space with an origin and a unit-length direction.
///
/// Sphere tracing advances along the ray by distances measured in world
/// units, so the direction is normalized on construction: `at(t)` is then
/// exactly `t` units away from the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray. `direction` is normalized; a zero vector yields
    /// a zero direction (the ray never moves).
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Create a ray that starts at `origin` and passes through `target`.
    pub fn towards(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(ray.direction, Vec3::new(0.0, 0.6, 0.8));
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X * 5.0);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_towards() {
        let ray = Ray::towards(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        assert_eq!(ray.direction, Vec3::NEG_Z);
        assert_eq!(ray.at(10.0), Vec3::ZERO);
    }

    #[test]
    fn test_zero_direction() {
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(ray.direction, Vec3::ZERO);
        assert_eq!(ray.at(5.0), Vec3::ONE);
    }
}
