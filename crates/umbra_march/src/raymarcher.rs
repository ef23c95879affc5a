//! CPU half of a raymarch object: configuration, scene and offscreen pass.

use std::sync::Arc;

use umbra_math::Camera;

use crate::config::validate_resolution;
use crate::{
    ConfigError, DistanceField, OffscreenBuffer, OffscreenPass, PassResult, RaymarchConfig,
    Resolution, Shading,
};

/// Frame-to-frame state for one raymarched layer.
///
/// The configuration is validated once at construction and never changes
/// afterwards, except for the resolution: a new size is validated when
/// requested and applied at the start of the next [`Raymarcher::update`],
/// so a frame always completes at the size it started with.
pub struct Raymarcher {
    config: RaymarchConfig,
    field: Option<Arc<dyn DistanceField>>,
    pass: OffscreenPass,
    pending_resolution: Option<Resolution>,
    frame: u64,
}

impl Raymarcher {
    /// Create a raymarcher with no scene attached.
    pub fn new(config: RaymarchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            field: None,
            pass: OffscreenPass::new(),
            pending_resolution: None,
            frame: 0,
        })
    }

    /// Attach the scene.
    pub fn with_field(mut self, field: impl DistanceField + 'static) -> Self {
        self.field = Some(Arc::new(field));
        self
    }

    /// Set the shading model.
    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.pass.set_shading(shading);
        self
    }

    /// Replace the scene; takes effect on the next update.
    pub fn set_field(&mut self, field: Arc<dyn DistanceField>) {
        self.field = Some(field);
    }

    /// Detach the scene. Updates fail until a new one is set.
    pub fn clear_field(&mut self) {
        self.field = None;
    }

    pub fn set_shading(&mut self, shading: Shading) {
        self.pass.set_shading(shading);
    }

    pub fn config(&self) -> &RaymarchConfig {
        &self.config
    }

    pub fn shading(&self) -> Shading {
        self.pass.shading()
    }

    pub fn pass(&self) -> &OffscreenPass {
        &self.pass
    }

    /// Number of completed frames.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Resolution waiting to be applied by the next update, if any.
    pub fn pending_resolution(&self) -> Option<Resolution> {
        self.pending_resolution
    }

    /// Ask for a new offscreen size.
    ///
    /// Rejected immediately when the size has zero area; otherwise deferred
    /// to the start of the next frame. Requesting the current size cancels
    /// any pending change.
    pub fn request_resolution(&mut self, resolution: Resolution) -> Result<(), ConfigError> {
        validate_resolution(resolution)?;
        self.pending_resolution = if resolution == self.config.resolution {
            None
        } else {
            Some(resolution)
        };
        Ok(())
    }

    /// Apply a pending resize. Returns true if the resolution changed.
    ///
    /// Called by `update`; exposed so a compositor can resize its own GPU
    /// resources in the same step.
    pub fn apply_pending_resolution(&mut self) -> bool {
        match self.pending_resolution.take() {
            Some(resolution) => {
                log::info!(
                    "Raymarch resolution {}x{} -> {}x{}",
                    self.config.resolution.width,
                    self.config.resolution.height,
                    resolution.width,
                    resolution.height
                );
                self.config.resolution = resolution;
                true
            }
            None => false,
        }
    }

    /// Run the offscreen pass for this frame and return the finished image.
    pub fn update(&mut self, camera: &Camera) -> PassResult<&OffscreenBuffer> {
        self.apply_pending_resolution();
        let field = self.field.as_deref();
        let buffer = self.pass.render(camera, &self.config, field)?;
        self.frame += 1;
        Ok(buffer)
    }

    /// The last completed image.
    pub fn buffer(&self) -> Option<&OffscreenBuffer> {
        self.pass.buffer()
    }
}
