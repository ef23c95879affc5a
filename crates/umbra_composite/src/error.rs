use thiserror::Error;
use umbra_march::{ConfigError, MarchError};

/// Errors raised while building or updating a raymarch object.
#[derive(Error, Debug)]
pub enum CompositeError {
    #[error(transparent)]
    March(#[from] MarchError),

    #[error("offscreen texture {width}x{height} exceeds the device limit of {limit}")]
    TextureTooLarge { width: u32, height: u32, limit: u32 },

    #[error("composite shader or pipeline rejected: {0}")]
    Shader(String),
}

impl From<ConfigError> for CompositeError {
    fn from(err: ConfigError) -> Self {
        CompositeError::March(MarchError::Config(err))
    }
}

pub type CompositeResult<T> = Result<T, CompositeError>;
