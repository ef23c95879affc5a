//! Signed-distance fields.
//!
//! The tracer only sees the [`DistanceField`] trait, so any scene can be
//! swapped in. Implementations must not overestimate the distance to the
//! nearest surface (Lipschitz-1), otherwise a step may tunnel through it.
//! Sign convention: negative inside, zero on the surface, positive outside.

use umbra_math::Vec3;

/// A scene described by its signed distance at every point.
pub trait DistanceField: Send + Sync {
    /// Signed distance from `p` to the nearest surface.
    fn distance(&self, p: Vec3) -> f32;
}

impl<F> DistanceField for F
where
    F: Fn(Vec3) -> f32 + Send + Sync,
{
    fn distance(&self, p: Vec3) -> f32 {
        self(p)
    }
}

/// Sphere with a center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl DistanceField for Sphere {
    fn distance(&self, p: Vec3) -> f32 {
        (p - self.center).length() - self.radius
    }
}

/// Infinite plane through `point`; the half-space `normal` points into is outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }
}

impl DistanceField for Plane {
    fn distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }
}

/// Torus around `axis`, with the tube centered `major_radius` from `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torus {
    pub center: Vec3,
    pub axis: Vec3,
    pub major_radius: f32,
    pub minor_radius: f32,
}

impl Torus {
    pub fn new(center: Vec3, axis: Vec3, major_radius: f32, minor_radius: f32) -> Self {
        Self {
            center,
            axis: axis.normalize(),
            major_radius,
            minor_radius,
        }
    }
}

impl DistanceField for Torus {
    fn distance(&self, p: Vec3) -> f32 {
        let rel = p - self.center;
        let along_axis = rel.dot(self.axis);
        let radial = (rel - along_axis * self.axis).length();
        Vec3::new(radial - self.major_radius, along_axis, 0.0).length() - self.minor_radius
    }
}

/// Field shifted by `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translate<T> {
    pub offset: Vec3,
    pub inner: T,
}

impl<T: DistanceField> Translate<T> {
    pub fn new(offset: Vec3, inner: T) -> Self {
        Self { offset, inner }
    }
}

impl<T: DistanceField> DistanceField for Translate<T> {
    fn distance(&self, p: Vec3) -> f32 {
        self.inner.distance(p - self.offset)
    }
}

/// Union of fields: the minimum distance over all children.
///
/// An empty union has no surface and reports `f32::INFINITY`.
#[derive(Default)]
pub struct Union {
    children: Vec<Box<dyn DistanceField>>,
}

impl Union {
    /// Create a new empty union.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to the union.
    pub fn add(&mut self, field: impl DistanceField + 'static) {
        self.children.push(Box::new(field));
    }

    /// Builder form of [`Union::add`].
    pub fn with(mut self, field: impl DistanceField + 'static) -> Self {
        self.add(field);
        self
    }

    /// Get the number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Check if the union is empty.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl DistanceField for Union {
    fn distance(&self, p: Vec3) -> f32 {
        self.children
            .iter()
            .map(|child| child.distance(p))
            .fold(f32::INFINITY, f32::min)
    }
}

/// Surface normal at `p` from the central-difference gradient of the field.
///
/// `h` is the finite-difference step; returns zero where the gradient vanishes.
pub fn estimate_normal(field: &dyn DistanceField, p: Vec3, h: f32) -> Vec3 {
    let dx = Vec3::new(h, 0.0, 0.0);
    let dy = Vec3::new(0.0, h, 0.0);
    let dz = Vec3::new(0.0, 0.0, h);

    Vec3::new(
        field.distance(p + dx) - field.distance(p - dx),
        field.distance(p + dy) - field.distance(p - dy),
        field.distance(p + dz) - field.distance(p - dz),
    )
    .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_sign_convention() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0);

        assert_eq!(sphere.distance(Vec3::ZERO), -2.0);
        assert_eq!(sphere.distance(Vec3::new(2.0, 0.0, 0.0)), 0.0);
        assert_eq!(sphere.distance(Vec3::new(0.0, 0.0, 10.0)), 8.0);
    }

    #[test]
    fn test_plane() {
        let ground = Plane::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y * 3.0);

        assert_eq!(ground.distance(Vec3::ZERO), 1.0);
        assert_eq!(ground.distance(Vec3::new(5.0, -3.0, 2.0)), -2.0);
    }

    #[test]
    fn test_torus() {
        let torus = Torus::new(Vec3::ZERO, Vec3::Y, 2.0, 0.5);

        // Center of the hole is major_radius - minor_radius from the tube
        assert!((torus.distance(Vec3::ZERO) - 1.5).abs() < 1e-6);
        // Inside the tube
        assert!((torus.distance(Vec3::new(2.0, 0.0, 0.0)) + 0.5).abs() < 1e-6);
        // Above the tube
        assert!((torus.distance(Vec3::new(0.0, 1.0, 2.0)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_translate() {
        let moved = Translate::new(Vec3::new(0.0, 3.0, 0.0), Sphere::new(Vec3::ZERO, 1.0));
        assert_eq!(moved.distance(Vec3::new(0.0, 3.0, 0.0)), -1.0);
    }

    #[test]
    fn test_union_takes_minimum() {
        let scene = Union::new()
            .with(Sphere::new(Vec3::new(-3.0, 0.0, 0.0), 1.0))
            .with(Sphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0));

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.distance(Vec3::ZERO), 2.0);
        assert_eq!(scene.distance(Vec3::new(3.0, 0.0, 0.0)), -1.0);
    }

    #[test]
    fn test_empty_union_is_infinitely_far() {
        let scene = Union::new();
        assert!(scene.is_empty());
        assert_eq!(scene.distance(Vec3::ZERO), f32::INFINITY);
    }

    #[test]
    fn test_closure_field() {
        let slab = |p: Vec3| p.y.abs() - 0.5;
        let field: &dyn DistanceField = &slab;
        assert_eq!(field.distance(Vec3::new(0.0, 2.0, 0.0)), 1.5);
    }

    #[test]
    fn test_estimate_normal_on_sphere() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let p = Vec3::new(0.0, 0.0, 1.0);

        let normal = estimate_normal(&sphere, p, 1e-3);
        assert!((normal - Vec3::Z).length() < 1e-3);
    }
}
