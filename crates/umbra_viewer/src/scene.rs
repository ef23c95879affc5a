//! Demo scene used by both binaries.

use umbra_march::{Plane, Sphere, Torus, Union};
use umbra_math::{Camera, Vec3};

/// A sphere inside a tilted torus, standing on a ground plane.
pub fn demo_scene() -> Union {
    Union::new()
        .with(Sphere::new(Vec3::new(0.0, 0.0, 0.0), 1.0))
        .with(Torus::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.3), 2.0, 0.35))
        .with(Plane::new(Vec3::new(0.0, -2.5, 0.0), Vec3::Y))
}

/// Camera framing the demo scene.
pub fn demo_camera() -> Camera {
    Camera::new(Vec3::new(0.0, 1.5, 8.0), Vec3::ZERO)
}
