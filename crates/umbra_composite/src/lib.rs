//! Umbra composite - displays a raymarched offscreen image inside a wgpu
//! render pass, alpha blended over the host's other content.

mod error;
mod object;
mod quad;

pub use error::{CompositeError, CompositeResult};
pub use object::{PreparedFrame, RaymarchObject};
pub use quad::{
    CompositeQuad, CompositeTarget, QuadVertex, COMPOSITE_BLEND, COMPOSITE_TEXTURE_FORMAT,
};
