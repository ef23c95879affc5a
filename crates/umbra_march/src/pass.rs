//! Full-frame offscreen raymarch pass.
//!
//! Every pixel is marched independently: workers share the camera, config
//! and field by reference and each row of the buffer is handed to exactly one
//! worker through `par_chunks_mut`, so no locking is needed. The rayon join
//! at the end of the iterator is the completion barrier; `render` returns
//! only once every pixel of the frame is written.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use umbra_math::Camera;

use crate::{
    march, DistanceField, MarchError, OffscreenBuffer, PassResult, Projection, RaymarchConfig,
    Resolution, Shading,
};

/// Counters from the last completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassStats {
    pub resolution: Option<Resolution>,
    pub hits: u64,
    pub total_steps: u64,
    pub elapsed: Duration,
}

impl PassStats {
    /// Average distance evaluations per pixel.
    pub fn mean_steps(&self) -> f32 {
        match self.resolution {
            Some(resolution) if !resolution.is_empty() => {
                self.total_steps as f32 / resolution.pixel_count() as f32
            }
            _ => 0.0,
        }
    }
}

/// Owns the offscreen buffer and fills it once per frame.
#[derive(Debug, Default)]
pub struct OffscreenPass {
    buffer: Option<OffscreenBuffer>,
    shading: Shading,
    stats: PassStats,
}

impl OffscreenPass {
    /// Create a pass with the default shading. The buffer is allocated on
    /// the first render.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shading model.
    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    pub fn set_shading(&mut self, shading: Shading) {
        self.shading = shading;
    }

    pub fn shading(&self) -> Shading {
        self.shading
    }

    /// The most recently completed image, if any.
    pub fn buffer(&self) -> Option<&OffscreenBuffer> {
        self.buffer.as_ref()
    }

    /// Stats from the most recent render.
    pub fn stats(&self) -> PassStats {
        self.stats
    }

    /// Make sure a buffer of `resolution` exists, reallocating on change.
    pub fn ensure_buffer(&mut self, resolution: Resolution) -> PassResult<&mut OffscreenBuffer> {
        let stale = self
            .buffer
            .as_ref()
            .map_or(true, |buffer| buffer.resolution() != resolution);

        if stale {
            // Free the old image before allocating the new one
            self.buffer = None;
            log::debug!(
                "Allocating offscreen buffer {}x{}",
                resolution.width,
                resolution.height
            );
            self.buffer = Some(OffscreenBuffer::allocate(resolution)?);
        }

        self.buffer
            .as_mut()
            .ok_or(MarchError::Resource {
                width: resolution.width,
                height: resolution.height,
            })
    }

    /// March every pixel of `config.resolution` and return the finished image.
    ///
    /// Fails before evaluating any pixel if the configuration is invalid,
    /// the field is missing, or the field returns NaN at the camera.
    pub fn render(
        &mut self,
        camera: &Camera,
        config: &RaymarchConfig,
        field: Option<&dyn DistanceField>,
    ) -> PassResult<&OffscreenBuffer> {
        config.validate()?;
        let field = field.ok_or(MarchError::MissingField)?;

        let probe = field.distance(camera.position);
        if probe.is_nan() {
            return Err(MarchError::InvalidField { value: probe });
        }

        let start = Instant::now();
        let shading = self.shading;
        let projection = Projection::new(camera, config);
        let width = config.resolution.width as usize;

        let buffer = self.ensure_buffer(config.resolution)?;
        let (hits, total_steps) = buffer
            .pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .map(|(y, row)| {
                let mut hits = 0u64;
                let mut steps = 0u64;
                for (x, pixel) in row.iter_mut().enumerate() {
                    let ray = projection.ray(x as u32, y as u32);
                    let result = march(&ray, config, field);
                    hits += result.is_hit() as u64;
                    steps += result.steps as u64;
                    *pixel = shading.shade(&result, config, field);
                }
                (hits, steps)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        self.stats = PassStats {
            resolution: Some(config.resolution),
            hits,
            total_steps,
            elapsed: start.elapsed(),
        };
        log::debug!(
            "Raymarch pass {}x{}: {} hits, {:.1} steps/pixel in {:?}",
            config.resolution.width,
            config.resolution.height,
            hits,
            self.stats.mean_steps(),
            self.stats.elapsed
        );

        self.buffer
            .as_ref()
            .ok_or(MarchError::Resource {
                width: config.resolution.width,
                height: config.resolution.height,
            })
    }
}
