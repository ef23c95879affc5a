//! Umbra march - CPU sphere tracing of signed-distance fields.
//!
//! Evaluates a pluggable [`DistanceField`] per pixel and writes straight
//! RGBA into an [`OffscreenBuffer`] that a compositor can upload as a texture.
//! Pixels that miss every surface are fully transparent.

mod buffer;
mod config;
mod error;
mod field;
mod pass;
mod projection;
mod raymarcher;
mod shading;
mod tracer;

pub use buffer::{color_to_premultiplied_rgba8, color_to_rgba8, OffscreenBuffer};
pub use config::{RaymarchConfig, Resolution};
pub use error::{ConfigError, MarchError, PassResult};
pub use field::{estimate_normal, DistanceField, Plane, Sphere, Torus, Translate, Union};
pub use pass::{OffscreenPass, PassStats};
pub use projection::Projection;
pub use raymarcher::Raymarcher;
pub use shading::{Color, Shading};
pub use tracer::{march, MarchOutcome, MarchResult};

/// Re-export common math types from umbra_math
pub use umbra_math::{Camera, Interval, Ray, Vec3};
