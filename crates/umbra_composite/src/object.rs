//! A raymarched layer that draws itself inside a host render pass.
//!
//! Each frame runs in two phases. [`RaymarchObject::prepare`] marches the
//! offscreen image on the CPU and uploads it into the composite texture;
//! [`PreparedFrame::draw`] records the textured quad into the host's pass.
//! The host's own render target is never rebound: the offscreen image has
//! its own texture, and the host opens its pass only after `prepare` has
//! returned. Drawing needs the `PreparedFrame` borrowed from `prepare`, so
//! the quad can't be drawn from a stale or half-written image.

use std::sync::Arc;

use wgpu::Device;

use umbra_march::{
    DistanceField, MarchError, OffscreenBuffer, PassStats, RaymarchConfig, Raymarcher, Resolution,
    Shading,
};
use umbra_math::Camera;

use crate::quad::check_texture_size;
use crate::{CompositeQuad, CompositeResult, CompositeTarget};

/// Offscreen sphere tracer plus the quad that composites its output.
pub struct RaymarchObject {
    raymarcher: Raymarcher,
    quad: CompositeQuad,
    texture_limit: u32,
}

impl RaymarchObject {
    /// Validate `config`, then build GPU resources sized to its resolution.
    ///
    /// Every failure is returned here rather than on the first frame.
    pub fn new(
        device: &Device,
        target: CompositeTarget,
        config: RaymarchConfig,
        field: impl DistanceField + 'static,
    ) -> CompositeResult<Self> {
        let raymarcher = Raymarcher::new(config)?.with_field(field);
        let quad = CompositeQuad::new(device, target, config.resolution)?;

        log::info!(
            "Raymarch object created: {}x{}, fov {:.1}, {} max steps, epsilon {}",
            config.resolution.width,
            config.resolution.height,
            config.field_of_view,
            config.max_steps,
            config.epsilon
        );

        Ok(Self {
            raymarcher,
            quad,
            texture_limit: device.limits().max_texture_dimension_2d,
        })
    }

    /// Set the shading model.
    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.raymarcher.set_shading(shading);
        self
    }

    pub fn config(&self) -> &RaymarchConfig {
        self.raymarcher.config()
    }

    pub fn shading(&self) -> Shading {
        self.raymarcher.shading()
    }

    pub fn set_shading(&mut self, shading: Shading) {
        self.raymarcher.set_shading(shading);
    }

    /// Swap the scene; used from the next frame on.
    pub fn set_field(&mut self, field: Arc<dyn DistanceField>) {
        self.raymarcher.set_field(field);
    }

    /// Stats of the last offscreen pass.
    pub fn stats(&self) -> PassStats {
        self.raymarcher.pass().stats()
    }

    /// Request a new offscreen resolution, applied by the next `prepare`.
    ///
    /// Zero-area sizes and sizes beyond the device's texture limit are
    /// rejected immediately.
    pub fn request_resolution(&mut self, resolution: Resolution) -> CompositeResult<()> {
        check_texture_size(resolution, self.texture_limit)?;
        self.raymarcher.request_resolution(resolution)?;
        Ok(())
    }

    /// Phase one: march this frame's image and upload it.
    ///
    /// Call before opening the render pass the quad is drawn into.
    pub fn prepare(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        camera: &Camera,
    ) -> CompositeResult<PreparedFrame<'_>> {
        let quad = &mut self.quad;
        let buffer = march_frame(&mut self.raymarcher, camera, |resolution| {
            quad.resize(device, resolution)
        })?;
        self.quad.upload(queue, buffer);

        Ok(PreparedFrame {
            quad: &self.quad,
            stats: self.raymarcher.pass().stats(),
        })
    }
}

/// Run one CPU frame, resizing the GPU side first when a resolution is pending.
///
/// If `resize` fails the request stays pending, the previous resolution stays
/// in use and nothing is marched.
fn march_frame<'a, E>(
    raymarcher: &'a mut Raymarcher,
    camera: &Camera,
    resize: impl FnOnce(Resolution) -> Result<(), E>,
) -> Result<&'a OffscreenBuffer, E>
where
    E: From<MarchError>,
{
    if let Some(resolution) = raymarcher.pending_resolution() {
        resize(resolution)?;
        raymarcher.apply_pending_resolution();
    }
    Ok(raymarcher.update(camera)?)
}

/// Proof that this frame's offscreen image is complete and uploaded.
pub struct PreparedFrame<'a> {
    quad: &'a CompositeQuad,
    stats: PassStats,
}

impl PreparedFrame<'_> {
    /// Phase two: draw the composite quad into the host's pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.quad.draw(pass);
    }

    pub fn stats(&self) -> PassStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompositeError;
    use umbra_march::{ConfigError, Sphere};
    use umbra_math::Vec3;

    const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Headless device, or None when the machine has no usable adapter.
    fn headless_device() -> Option<(Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
    }

    fn sphere() -> Sphere {
        Sphere::new(Vec3::ZERO, 2.0)
    }

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
    }

    fn cpu_raymarcher() -> Raymarcher {
        let config = RaymarchConfig::default().with_resolution(8, 8);
        Raymarcher::new(config).unwrap().with_field(sphere())
    }

    #[test]
    fn test_failed_resize_keeps_previous_resolution() {
        let mut raymarcher = cpu_raymarcher();
        raymarcher.request_resolution(Resolution::new(16, 4)).unwrap();

        let result = march_frame(&mut raymarcher, &camera(), |resolution| {
            Err(CompositeError::TextureTooLarge {
                width: resolution.width,
                height: resolution.height,
                limit: 8,
            })
        });

        assert!(matches!(result, Err(CompositeError::TextureTooLarge { width: 16, .. })));
        assert_eq!(raymarcher.frame(), 0);
        assert_eq!(raymarcher.pending_resolution(), Some(Resolution::new(16, 4)));
        assert_eq!(raymarcher.config().resolution, Resolution::new(8, 8));

        // The old size keeps rendering until a resize succeeds
        let buffer = raymarcher.update(&camera()).unwrap();
        assert_eq!(buffer.resolution(), Resolution::new(8, 8));
    }

    #[test]
    fn test_resize_runs_before_pending_resolution_applies() {
        let mut raymarcher = cpu_raymarcher();
        raymarcher.request_resolution(Resolution::new(16, 4)).unwrap();

        let mut resized = Vec::new();
        let buffer = march_frame(&mut raymarcher, &camera(), |resolution| {
            resized.push(resolution);
            Ok::<_, CompositeError>(())
        })
        .unwrap();

        assert_eq!(buffer.resolution(), Resolution::new(16, 4));
        assert_eq!(resized, vec![Resolution::new(16, 4)]);
        assert_eq!(raymarcher.pending_resolution(), None);
        assert_eq!(raymarcher.frame(), 1);
    }

    #[test]
    fn test_no_resize_without_pending_resolution() {
        let mut raymarcher = cpu_raymarcher();

        let buffer = march_frame(&mut raymarcher, &camera(), |_| -> CompositeResult<()> {
            panic!("nothing pending")
        })
        .unwrap();

        assert_eq!(buffer.resolution(), Resolution::new(8, 8));
        assert!(buffer.pixels().iter().any(|p| p.w == 1.0));
    }

    #[test]
    fn test_march_errors_surface_after_resize() {
        let mut raymarcher = cpu_raymarcher();
        raymarcher.clear_field();

        let result = march_frame(&mut raymarcher, &camera(), |_| Ok::<_, CompositeError>(()));

        assert!(matches!(result, Err(CompositeError::March(MarchError::MissingField))));
    }

    #[test]
    fn test_prepare_and_draw_into_host_pass() {
        let _ = env_logger::builder().is_test(true).try_init();
        let Some((device, queue)) = headless_device() else {
            log::warn!("No GPU adapter available, skipping");
            return;
        };

        let config = RaymarchConfig::default().with_resolution(16, 16);
        let target = CompositeTarget::new(TARGET_FORMAT);
        let mut object = RaymarchObject::new(&device, target, config, sphere()).unwrap();

        let host_target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Host Target"),
            size: wgpu::Extent3d {
                width: 32,
                height: 32,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = host_target.create_view(&wgpu::TextureViewDescriptor::default());

        let camera = camera();
        let frame = object.prepare(&device, &queue, &camera).unwrap();
        assert!(frame.stats().hits > 0);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Test Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Host Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            frame.draw(&mut pass);
        }
        queue.submit(std::iter::once(encoder.finish()));

        // Deferred resize applies on the next prepare
        object.request_resolution(Resolution::new(8, 4)).unwrap();
        assert_eq!(object.config().resolution, Resolution::new(16, 16));
        object.prepare(&device, &queue, &camera).unwrap();
        assert_eq!(object.config().resolution, Resolution::new(8, 4));
    }

    #[test]
    fn test_construction_rejects_bad_config() {
        let Some((device, _queue)) = headless_device() else {
            return;
        };

        let config = RaymarchConfig::default().with_quality(100, 0.0);
        let target = CompositeTarget::new(TARGET_FORMAT);
        let result = RaymarchObject::new(&device, target, config, sphere());

        assert!(matches!(
            result,
            Err(CompositeError::March(MarchError::Config(ConfigError::NonPositiveEpsilon(_))))
        ));
    }

    #[test]
    fn test_oversized_resolution_rejected() {
        let Some((device, _queue)) = headless_device() else {
            return;
        };

        let limit = device.limits().max_texture_dimension_2d;
        let config = RaymarchConfig::default().with_resolution(limit + 1, 4);
        let target = CompositeTarget::new(TARGET_FORMAT);
        let result = RaymarchObject::new(&device, target, config, sphere());

        assert!(matches!(result, Err(CompositeError::TextureTooLarge { .. })));
    }
}
