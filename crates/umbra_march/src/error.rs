//! Error types for configuration and offscreen passes.

use thiserror::Error;

/// Invalid raymarch configuration. Never clamped; the pass refuses to run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_steps must be at least 1")]
    ZeroSteps,

    #[error("epsilon must be positive, got {0}")]
    NonPositiveEpsilon(f32),

    #[error("distance range is empty: min_distance {min} must be >= 0 and < max_distance {max}")]
    InvalidDistanceRange { min: f32, max: f32 },

    #[error("resolution {width}x{height} has zero area")]
    EmptyResolution { width: u32, height: u32 },

    #[error("field of view must be in (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("{0} must be finite")]
    NonFinite(&'static str),
}

/// Errors raised by the offscreen raymarch pass.
#[derive(Error, Debug)]
pub enum MarchError {
    #[error("invalid raymarch configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no distance field attached")]
    MissingField,

    #[error("distance field returned {value} at the camera position")]
    InvalidField { value: f32 },

    #[error("failed to allocate a {width}x{height} offscreen buffer")]
    Resource { width: u32, height: u32 },
}

pub type PassResult<T> = Result<T, MarchError>;
