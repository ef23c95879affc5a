//! Shared pieces of the Umbra binaries: command line options, the demo scene
//! and the viewer overlay.

pub mod cli;
pub mod gnomon;
pub mod scene;

pub use cli::{MarchArgs, ShadingArg};
pub use scene::{demo_camera, demo_scene};
